use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::goal::Goal;
use crate::stream::Observable;
use crate::term::{canon, unify, walk, Subst, Term};

// Whole-stream aggregators: these consume every upstream substitution before
// emitting anything. They are goals like everything else, just not pointwise.

/// Collect `walk(v)` over the whole stream into one sequence bound to `out`.
///
/// With `drop` false, the single emission extends the last upstream substitution
/// (or an empty one if the stream was empty); with `drop` true it extends a
/// fresh, empty substitution.
pub fn collect_stream(v: impl Into<Term>, out: impl Into<Term>, drop: bool) -> Goal {
	let v = v.into();
	let out = out.into();
	Goal::new("collect_stream", move |input| {
		let v = v.clone();
		let out = out.clone();
		Observable::new(move |emit| async move {
			let mut sub = input.subscribe();
			let mut items = Vec::new();
			let mut last = None;
			while let Some(s) = sub.next().await? {
				items.push(walk(&v, &s));
				last = Some(s);
			}

			let base = if drop { Subst::new() } else { last.unwrap_or_default() };
			if let Some(next) = unify(&out, &Term::seq(items), &base) {
				emit.send(next).await?;
			}
			Ok(())
		})
	})
}

/// How a group aggregates its members.
enum GroupAgg {
	Collect,
	CollectDistinct,
	Count,
}

fn group_by(label: &str, key: Term, value: Term, out: Term, drop: bool, agg: GroupAgg) -> Goal {
	let agg = Arc::new(agg);
	Goal::new(label, move |input| {
		let key = key.clone();
		let value = value.clone();
		let out = out.clone();
		let agg = agg.clone();
		Observable::new(move |emit| async move {
			let mut sub = input.subscribe();

			// Key by canonical form so the partition is arrival-order independent.
			let mut groups: BTreeMap<String, (Term, Vec<Term>)> = BTreeMap::new();
			let mut inputs = Vec::new();
			while let Some(s) = sub.next().await? {
				let key_val = walk(&key, &s);
				let entry = groups
					.entry(canon(&key_val))
					.or_insert_with(|| (key_val, Vec::new()));
				entry.1.push(walk(&value, &s));
				inputs.push(s);
			}

			let aggregate = |values: &Vec<Term>| match &*agg {
				GroupAgg::Collect => Term::seq(values.clone()),
				GroupAgg::CollectDistinct => Term::seq(distinct(values)),
				GroupAgg::Count => Term::from(values.len() as i64),
			};

			if drop {
				// One fresh substitution per group, carrying only key and aggregate.
				for (key_val, values) in groups.values() {
					let s = Subst::new();
					let Some(s) = unify(&key, key_val, &s) else { continue };
					let Some(s) = unify(&out, &aggregate(values), &s) else { continue };
					emit.send(s).await?;
				}
			} else {
				// Re-emit every member, extended with its group's aggregate.
				for s in inputs {
					let key_val = walk(&key, &s);
					let (_, values) = &groups[&canon(&key_val)];
					let Some(next) = unify(&out, &aggregate(values), &s) else { continue };
					emit.send(next).await?;
				}
			}
			Ok(())
		})
	})
}

/// Group by `key`, binding `out` to the sequence of each group's `value`s.
pub fn group_by_collect_stream(
	key: impl Into<Term>,
	value: impl Into<Term>,
	out: impl Into<Term>,
	drop: bool,
) -> Goal {
	group_by(
		"group_by_collect_stream",
		key.into(),
		value.into(),
		out.into(),
		drop,
		GroupAgg::Collect,
	)
}

/// Group by `key`, binding `out` to the distinct `value`s of each group.
pub fn group_by_distinct_stream(
	key: impl Into<Term>,
	value: impl Into<Term>,
	out: impl Into<Term>,
	drop: bool,
) -> Goal {
	group_by(
		"group_by_distinct_stream",
		key.into(),
		value.into(),
		out.into(),
		drop,
		GroupAgg::CollectDistinct,
	)
}

/// Group by `key`, binding `out` to each group's size.
pub fn group_by_count_stream(key: impl Into<Term>, out: impl Into<Term>, drop: bool) -> Goal {
	let key = key.into();
	group_by(
		"group_by_count_stream",
		key.clone(),
		key,
		out.into(),
		drop,
		GroupAgg::Count,
	)
}

/// Sort order for [`sort_by_stream`].
#[derive(Clone)]
pub enum SortOrder {
	Asc,
	Desc,
	By(Arc<dyn Fn(&Term, &Term) -> Ordering + Send + Sync>),
}

/// Buffer the whole stream, then emit it sorted by `walk(v)`.
///
/// The sort is stable, so equal keys keep their arrival order.
pub fn sort_by_stream(v: impl Into<Term>, order: SortOrder) -> Goal {
	let v = v.into();
	Goal::new("sort_by_stream", move |input| {
		let v = v.clone();
		let order = order.clone();
		Observable::new(move |emit| async move {
			let mut sub = input.subscribe();
			let mut buffered: Vec<(Term, Subst)> = Vec::new();
			while let Some(s) = sub.next().await? {
				buffered.push((walk(&v, &s), s));
			}

			buffered.sort_by(|(a, _), (b, _)| match &order {
				SortOrder::Asc => compare_terms(a, b),
				SortOrder::Desc => compare_terms(b, a),
				SortOrder::By(cmp) => cmp(a, b),
			});

			for (_, s) in buffered {
				emit.send(s).await?;
			}
			Ok(())
		})
	})
}

/// Forward the first `n` substitutions, then cancel upstream and complete.
pub fn take_stream(n: usize) -> Goal {
	Goal::new("take_stream", move |input| input.take(n))
}

/// Emit every substitution tied for the numeric maximum of `walk(v)`.
pub fn max_stream(v: impl Into<Term>) -> Goal {
	extremum_stream("max_stream", v.into(), Ordering::Greater)
}

/// Emit every substitution tied for the numeric minimum of `walk(v)`.
pub fn min_stream(v: impl Into<Term>) -> Goal {
	extremum_stream("min_stream", v.into(), Ordering::Less)
}

fn extremum_stream(label: &str, v: Term, keep: Ordering) -> Goal {
	Goal::new(label, move |input| {
		let v = v.clone();
		Observable::new(move |emit| async move {
			let mut sub = input.subscribe();

			// Substitutions whose value is not numeric are dropped.
			let mut buffered: Vec<(f64, Subst)> = Vec::new();
			while let Some(s) = sub.next().await? {
				if let Some(value) = walk(&v, &s).as_atom().and_then(|a| a.as_f64()) {
					buffered.push((value, s));
				}
			}

			let best = buffered
				.iter()
				.map(|(value, _)| *value)
				.reduce(|best, value| if value.total_cmp(&best) == keep { value } else { best });

			if let Some(best) = best {
				// Ties emit in arrival order.
				for (value, s) in buffered {
					if value.total_cmp(&best) == Ordering::Equal {
						emit.send(s).await?;
					}
				}
			}
			Ok(())
		})
	})
}

/// Total order over terms: by kind first, then structurally; numbers compare by
/// value across int/float.
fn compare_terms(a: &Term, b: &Term) -> Ordering {
	use crate::term::Atom;

	fn rank(t: &Term) -> u8 {
		match t {
			Term::Atom(Atom::Null) => 0,
			Term::Atom(Atom::Bool(_)) => 1,
			Term::Atom(Atom::Int(_) | Atom::Float(_)) => 2,
			Term::Atom(Atom::Str(_)) => 3,
			Term::Atom(Atom::Bytes(_)) => 4,
			Term::Nil | Term::Cons(_, _) | Term::Seq(_) => 5,
			Term::Record(_) => 6,
			Term::Var(_) => 7,
		}
	}

	match (a, b) {
		(Term::Atom(Atom::Bool(x)), Term::Atom(Atom::Bool(y))) => x.cmp(y),
		(Term::Atom(Atom::Str(x)), Term::Atom(Atom::Str(y))) => x.cmp(y),
		(Term::Atom(Atom::Bytes(x)), Term::Atom(Atom::Bytes(y))) => x.cmp(y),
		(Term::Var(x), Term::Var(y)) => x.id().cmp(&y.id()),
		(Term::Atom(x), Term::Atom(y)) if x.as_f64().is_some() && y.as_f64().is_some() => {
			x.as_f64().unwrap().total_cmp(&y.as_f64().unwrap())
		}
		_ => {
			let by_rank = rank(a).cmp(&rank(b));
			if by_rank != Ordering::Equal {
				return by_rank;
			}
			match (a.as_list(), b.as_list()) {
				(Some(xs), Some(ys)) => {
					for (x, y) in xs.iter().zip(ys.iter()) {
						let ord = compare_terms(x, y);
						if ord != Ordering::Equal {
							return ord;
						}
					}
					xs.len().cmp(&ys.len())
				}
				// Same rank, no cheaper structure: canonical form breaks the tie.
				_ => canon(a).cmp(&canon(b)),
			}
		}
	}
}

/// Keep the first occurrence of each canonical form.
pub(crate) fn distinct(items: &[Term]) -> Vec<Term> {
	let mut seen = std::collections::BTreeSet::new();
	items
		.iter()
		.filter(|t| seen.insert(canon(t)))
		.cloned()
		.collect()
}
