use std::sync::Arc;

use super::{Subst, Term};

/// Chase the top-level var chain only.
///
/// Iterative on purpose: var chains can be long (one hop per unified var pair)
/// and must not recurse. Composite children are left as-is.
pub fn walk_shallow(term: &Term, s: &Subst) -> Term {
	let mut cur = term;
	loop {
		match cur {
			Term::Var(v) => match s.get(v.id()) {
				Some(next) => cur = next,
				None => return cur.clone(),
			},
			_ => return cur.clone(),
		}
	}
}

/// Resolve a term fully through the substitution.
///
/// The var chain at every level is chased iteratively; composites recurse
/// structurally, which is safe because the occurs check keeps bindings acyclic.
pub fn walk(term: &Term, s: &Subst) -> Term {
	match walk_shallow(term, s) {
		Term::Cons(head, tail) => Term::Cons(Arc::new(walk(&head, s)), Arc::new(walk(&tail, s))),
		Term::Seq(items) => Term::Seq(Arc::new(items.iter().map(|t| walk(t, s)).collect())),
		Term::Record(fields) => Term::Record(Arc::new(
			fields.iter().map(|(k, v)| (k.clone(), walk(v, s))).collect(),
		)),
		leaf => leaf,
	}
}

/// Whether the term is fully ground under the substitution.
pub fn is_ground(term: &Term, s: &Subst) -> bool {
	walk(term, s).is_ground()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::term::Var;

	#[test]
	fn chases_chains_iteratively() {
		let a = Var::fresh();
		let b = Var::fresh();
		let c = Var::fresh();

		// a -> b -> c -> 42, deliberately long.
		let mut s = Subst::new()
			.with(a.id(), Term::from(&b))
			.with(b.id(), Term::from(&c))
			.with(c.id(), Term::from(42i64));

		// Extend the chain far enough that naive recursion would be suspect.
		let mut head = Term::from(&a);
		for _ in 0..1_000 {
			let v = Var::fresh();
			s = s.with(v.id(), head.clone());
			head = Term::from(Var::fresh());
			s = s.with(head.as_var().unwrap().id(), v.into());
		}

		assert_eq!(walk(&head, &s), Term::from(42i64));
	}

	#[test]
	fn descends_into_composites() {
		let x = Var::fresh();
		let s = Subst::new().with(x.id(), Term::from(7i64));

		let t = Term::record([("xs", Term::list([Term::from(&x), Term::from(1i64)]))]);
		let walked = walk(&t, &s);
		assert_eq!(
			walked,
			Term::record([("xs", Term::list([Term::from(7i64), Term::from(1i64)]))])
		);
	}

	#[test]
	fn walk_is_idempotent() {
		let x = Var::fresh();
		let y = Var::fresh();
		let s = Subst::new()
			.with(x.id(), Term::seq([Term::from(&y), Term::from(1i64)]))
			.with(y.id(), Term::from("hi"));

		let once = walk(&Term::from(&x), &s);
		let twice = walk(&once, &s);
		assert_eq!(once, twice);
	}

	#[test]
	fn unbound_var_walks_to_itself() {
		let x = Var::fresh();
		let s = Subst::new();
		assert_eq!(walk(&Term::from(&x), &s), Term::from(&x));
		assert!(!is_ground(&Term::from(&x), &s));
	}
}
