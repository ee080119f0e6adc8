use std::sync::Arc;

use futures::stream::SelectAll;
use futures::StreamExt;

use super::{next_goal_id, Goal};
use crate::group::{GoalRef, GroupKind};
use crate::stream::Observable;
use crate::term::{unify, Subst, Term, Var};

/// Unify two terms against every incoming substitution.
pub fn eq(u: impl Into<Term>, v: impl Into<Term>) -> Goal {
	let u = u.into();
	let v = v.into();
	Goal::filter_map("eq", move |s| unify(&u, &v, s))
}

/// Always succeeds, passing the substitution through.
pub fn succeed() -> Goal {
	Goal::filter_map("succeed", |s| Some(s.clone()))
}

/// Always fails, pruning every branch.
pub fn fail() -> Goal {
	Goal::filter_map("fail", |_| None)
}

/// Tuples of fresh vars, for [`fresh`].
pub trait FreshVars {
	fn fresh_vars() -> Self;
}

impl FreshVars for Var {
	fn fresh_vars() -> Self {
		Var::fresh()
	}
}

impl FreshVars for (Var, Var) {
	fn fresh_vars() -> Self {
		(Var::fresh(), Var::fresh())
	}
}

impl FreshVars for (Var, Var, Var) {
	fn fresh_vars() -> Self {
		(Var::fresh(), Var::fresh(), Var::fresh())
	}
}

impl FreshVars for (Var, Var, Var, Var) {
	fn fresh_vars() -> Self {
		(Var::fresh(), Var::fresh(), Var::fresh(), Var::fresh())
	}
}

impl FreshVars for (Var, Var, Var, Var, Var) {
	fn fresh_vars() -> Self {
		(Var::fresh(), Var::fresh(), Var::fresh(), Var::fresh(), Var::fresh())
	}
}

/// Introduce fresh vars and delegate to the goal built from them.
///
/// Vars are allocated once, when the goal is built, not per incoming
/// substitution. Ids are process-unique, so a goal reused across runs shares
/// them; only debug output can tell the difference.
pub fn fresh<A, F>(f: F) -> Goal
where
	A: FreshVars,
	F: FnOnce(A) -> Goal,
{
	f(A::fresh_vars())
}

/// Conjunction: each goal consumes the output of the previous one.
///
/// `all([])` is the identity goal and `all([g])` behaves as `g`. Emission order
/// of the upstream substitutions is preserved through the chain.
pub fn all(goals: impl IntoIterator<Item = Goal>) -> Goal {
	let goals: Vec<Goal> = goals.into_iter().collect();
	let id = next_goal_id();
	let conj: Arc<Vec<GoalRef>> = Arc::new(goals.iter().map(Goal::descriptor).collect());
	let reach: Arc<Vec<GoalRef>> = Arc::new(goals.iter().flat_map(Goal::flatten).collect());

	let inner = goals.clone();
	let apply = move |input: Observable<Subst>| {
		let conj = conj.clone();
		let reach = reach.clone();
		let entered = input.map(move |s: Subst| {
			let group = s.group().descend(id, GroupKind::Conj, conj.clone(), reach.clone());
			s.with_group(group)
		});
		inner.iter().fold(entered, |acc, g| g.apply(acc))
	};
	Goal::assemble(id, "all".into(), goals, apply)
}

/// Disjunction: the input is multicast to every branch and their outputs merge.
///
/// Each branch sees every input substitution. Relative order between branches is
/// scheduler-determined; the set of emissions is order-independent. Completes
/// when all branches complete.
pub fn any(goals: impl IntoIterator<Item = Goal>) -> Goal {
	let goals: Vec<Goal> = goals.into_iter().collect();
	let id = next_goal_id();
	let conj: Arc<Vec<GoalRef>> = Arc::new(goals.iter().map(Goal::descriptor).collect());
	let reach: Arc<Vec<GoalRef>> = Arc::new(goals.iter().flat_map(Goal::flatten).collect());

	let inner = goals.clone();
	let apply = move |input: Observable<Subst>| {
		let goals = inner.clone();
		let conj = conj.clone();
		let reach = reach.clone();
		Observable::new(move |emit| async move {
			let entered = input.map(move |s: Subst| {
				let group = s.group().descend(id, GroupKind::Disj, conj.clone(), reach.clone());
				s.with_group(group)
			});

			// One upstream subscription, every branch tapped in before production
			// starts so none of them can miss an input.
			let shared = entered.share(1);
			let mut merged = SelectAll::new();
			for goal in &goals {
				merged.push(goal.apply(shared.observe()).subscribe());
			}
			drop(shared);

			while let Some(res) = merged.next().await {
				emit.send(res?).await?;
			}
			Ok(())
		})
	};
	Goal::assemble(id, "any".into(), goals, apply)
}

/// A disjunction of conjunctions.
pub fn conde<I>(clauses: I) -> Goal
where
	I: IntoIterator,
	I::Item: IntoIterator<Item = Goal>,
{
	any(clauses.into_iter().map(all))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::term::walk;

	async fn solutions(goal: Goal) -> Vec<Subst> {
		goal.over(Subst::new()).subscribe().collect().await.unwrap()
	}

	#[tokio::test]
	async fn eq_binds_and_walks() {
		let x = Var::fresh();
		let results = solutions(eq(&x, 42i64)).await;
		assert_eq!(results.len(), 1);
		assert_eq!(walk(&Term::from(&x), &results[0]), Term::from(42i64));
	}

	#[tokio::test]
	async fn eq_failure_prunes_silently() {
		let results = solutions(eq(1i64, 2i64)).await;
		assert!(results.is_empty());
	}

	#[tokio::test]
	async fn all_chains_left_to_right() {
		let x = Var::fresh();
		let y = Var::fresh();
		let results = solutions(all([eq(&x, 1i64), eq(&y, &x)])).await;
		assert_eq!(results.len(), 1);
		assert_eq!(walk(&Term::from(&y), &results[0]), Term::from(1i64));
	}

	#[tokio::test]
	async fn all_empty_is_identity() {
		let results = solutions(all([])).await;
		assert_eq!(results.len(), 1);
		assert!(results[0].is_empty());
	}

	#[tokio::test]
	async fn all_of_one_behaves_as_the_goal() {
		let x = Var::fresh();
		let direct = solutions(eq(&x, 5i64)).await;
		let wrapped = solutions(all([eq(&x, 5i64)])).await;
		assert_eq!(direct.len(), wrapped.len());
		assert!(direct[0].same_bindings(&wrapped[0]));
	}

	#[tokio::test]
	async fn any_emits_every_branch() {
		let x = Var::fresh();
		let results = solutions(any([eq(&x, 1i64), eq(&x, 2i64)])).await;

		let mut values: Vec<Term> = results.iter().map(|s| walk(&Term::from(&x), s)).collect();
		values.sort_by_key(|t| format!("{}", t));
		assert_eq!(values, vec![Term::from(1i64), Term::from(2i64)]);
	}

	#[tokio::test]
	async fn any_is_commutative_up_to_order() {
		let x = Var::fresh();
		let canon = |results: Vec<Subst>| {
			let mut v: Vec<String> = results
				.iter()
				.map(|s| format!("{}", walk(&Term::from(&x), s)))
				.collect();
			v.sort();
			v
		};

		let ab = canon(solutions(any([eq(&x, 1i64), eq(&x, 2i64)])).await);
		let ba = canon(solutions(any([eq(&x, 2i64), eq(&x, 1i64)])).await);
		assert_eq!(ab, ba);
	}

	#[tokio::test]
	async fn any_then_take_one() {
		let x = Var::fresh();
		let goal = any([eq(&x, 1i64), eq(&x, 2i64)]);
		let results = goal.over(Subst::new()).take(1).subscribe().collect().await.unwrap();
		assert_eq!(results.len(), 1);
	}

	#[tokio::test]
	async fn conde_is_or_of_ands() {
		let x = Var::fresh();
		let y = Var::fresh();
		let results = solutions(conde([
			vec![eq(&x, 1i64), eq(&y, 10i64)],
			vec![eq(&x, 2i64), eq(&y, 20i64)],
		]))
		.await;
		assert_eq!(results.len(), 2);
		for s in &results {
			let x10 = walk(&Term::from(&x), s);
			let y10 = walk(&Term::from(&y), s);
			match x10 {
				t if t == Term::from(1i64) => assert_eq!(y10, Term::from(10i64)),
				t if t == Term::from(2i64) => assert_eq!(y10, Term::from(20i64)),
				other => panic!("unexpected binding {}", other),
			}
		}
	}

	#[tokio::test]
	async fn fresh_allocates_once() {
		let goal = fresh(|x: Var| eq(&x, 7i64));
		let a = solutions(goal.clone()).await;
		let b = solutions(goal).await;
		// Same var id in both runs: one binding each, same key.
		assert_eq!(a[0].bound_ids().collect::<Vec<_>>(), b[0].bound_ids().collect::<Vec<_>>());
	}

	#[tokio::test]
	async fn group_metadata_is_stamped() {
		let x = Var::fresh();
		let results = solutions(all([eq(&x, 1i64)])).await;
		let group = results[0].group().clone();

		// Path: the conjunction, then the relation inside it.
		assert_eq!(group.path.len(), 2);
		assert_eq!(group.path[0].kind, crate::group::GroupKind::Conj);
		assert_eq!(group.path[1].kind, crate::group::GroupKind::Relation);
		assert_eq!(group.conj.len(), 1);
		assert_eq!(group.conj[0].label.as_ref(), "eq");
	}

	#[tokio::test]
	async fn succeed_and_fail() {
		assert_eq!(solutions(succeed()).await.len(), 1);
		assert!(solutions(fail()).await.is_empty());
	}
}
