use std::collections::BTreeMap;
use std::sync::Arc;

use super::stream::distinct;
use crate::goal::Goal;
use crate::stream::Observable;
use crate::term::{canon, unify, walk, Subst, Term};

/// Folds the answers of one subgoal run into a single term.
pub type Aggregate = Arc<dyn Fn(Vec<Term>, &Subst) -> Term + Send + Sync>;

/// Run a subgoal to completion for each incoming substitution and bind an
/// aggregate of its answers.
///
/// For every input `s`: the subgoal runs over `s` alone; `extract` is walked
/// under each answer; the aggregate of those terms is unified with `bind`
/// against the original `s`. Nothing from the subgoal's answers leaks out
/// except through the aggregate.
///
/// If the downstream cancels mid-run, the inner subscription is dropped and its
/// partial buffer discarded.
pub fn subquery(
	goal: Goal,
	extract: impl Into<Term>,
	bind: impl Into<Term>,
	aggregate: Aggregate,
) -> Goal {
	let extract = extract.into();
	let bind = bind.into();
	let children = vec![goal.clone()];
	Goal::with_children("subquery", children, move |input| {
		let goal = goal.clone();
		let extract = extract.clone();
		let bind = bind.clone();
		let aggregate = aggregate.clone();
		input.flat_map(move |s: Subst| {
			let goal = goal.clone();
			let extract = extract.clone();
			let bind = bind.clone();
			let aggregate = aggregate.clone();
			Observable::new(move |emit| async move {
				let answers = goal.over(s.clone()).subscribe().collect().await?;
				let collected = answers.iter().map(|ans| walk(&extract, ans)).collect();
				let value = aggregate(collected, &s);
				if let Some(next) = unify(&bind, &value, &s) {
					emit.send(next).await?;
				}
				Ok(())
			})
		})
	})
}

/// Bind `out` to the logic list of every `v` the subgoal produced.
pub fn collecto(v: impl Into<Term>, goal: Goal, out: impl Into<Term>) -> Goal {
	subquery(goal, v, out, Arc::new(|items, _| Term::list(items)))
}

/// Like [`collecto`], deduplicated by canonical form.
pub fn collect_distincto(v: impl Into<Term>, goal: Goal, out: impl Into<Term>) -> Goal {
	subquery(goal, v, out, Arc::new(|items, _| Term::list(distinct(&items))))
}

/// Bind `n` to the number of answers the subgoal produced.
pub fn counto(v: impl Into<Term>, goal: Goal, n: impl Into<Term>) -> Goal {
	subquery(goal, v, n, Arc::new(|items, _| Term::from(items.len() as i64)))
}

/// Bind `n` to the number of distinct answers the subgoal produced.
pub fn count_distincto(v: impl Into<Term>, goal: Goal, n: impl Into<Term>) -> Goal {
	subquery(
		goal,
		v,
		n,
		Arc::new(|items, _| Term::from(distinct(&items).len() as i64)),
	)
}

/// Bind `n` to how many answers equal `target` (walked under the outer
/// substitution at aggregation time).
pub fn count_valueo(
	v: impl Into<Term>,
	goal: Goal,
	target: impl Into<Term>,
	n: impl Into<Term>,
) -> Goal {
	let target = target.into();
	subquery(
		goal,
		v,
		n,
		Arc::new(move |items, s| {
			let wanted = canon(&walk(&target, s));
			let count = items.iter().filter(|item| canon(item) == wanted).count();
			Term::from(count as i64)
		}),
	)
}

fn group_answers(
	answers: &[Subst],
	key: &Term,
	value: &Term,
) -> BTreeMap<String, (Term, Vec<Term>)> {
	let mut groups: BTreeMap<String, (Term, Vec<Term>)> = BTreeMap::new();
	for ans in answers {
		let key_val = walk(key, ans);
		let entry = groups
			.entry(canon(&key_val))
			.or_insert_with(|| (key_val, Vec::new()));
		entry.1.push(walk(value, ans));
	}
	groups
}

fn group_by_subgoal(
	label: &str,
	key: Term,
	value: Term,
	goal: Goal,
	out: Term,
	count: bool,
) -> Goal {
	let children = vec![goal.clone()];
	Goal::with_children(label, children, move |input| {
		let key = key.clone();
		let value = value.clone();
		let goal = goal.clone();
		let out = out.clone();
		input.flat_map(move |s: Subst| {
			let key = key.clone();
			let value = value.clone();
			let goal = goal.clone();
			let out = out.clone();
			Observable::new(move |emit| async move {
				let answers = goal.over(s.clone()).subscribe().collect().await?;

				// One emission per group, all against the original substitution.
				for (key_val, values) in group_answers(&answers, &key, &value).values() {
					let aggregate = if count {
						Term::from(values.len() as i64)
					} else {
						Term::list(values.clone())
					};
					let Some(next) = unify(&key, key_val, &s) else { continue };
					let Some(next) = unify(&out, &aggregate, &next) else { continue };
					emit.send(next).await?;
				}
				Ok(())
			})
		})
	})
}

/// Run the subgoal, group its answers by `key`, and emit one substitution per
/// group binding `key` and the list of that group's `value`s.
pub fn group_by_collecto(
	key: impl Into<Term>,
	value: impl Into<Term>,
	goal: Goal,
	out: impl Into<Term>,
) -> Goal {
	group_by_subgoal(
		"group_by_collecto",
		key.into(),
		value.into(),
		goal,
		out.into(),
		false,
	)
}

/// Run the subgoal, group its answers by `key`, and emit one substitution per
/// group binding `key` and the group size.
pub fn group_by_counto(
	key: impl Into<Term>,
	value: impl Into<Term>,
	goal: Goal,
	out: impl Into<Term>,
) -> Goal {
	group_by_subgoal(
		"group_by_counto",
		key.into(),
		value.into(),
		goal,
		out.into(),
		true,
	)
}
