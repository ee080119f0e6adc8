use std::cmp::Ordering;
use std::sync::Arc;

use crate::goal::Goal;
use crate::term::{suspendable, Atom, Check, Resumed, Subst, Term};

/// Compare two ground terms if they are comparable: numbers against numbers
/// (ints widening), strings against strings, bools against bools.
fn comparable(a: &Term, b: &Term) -> Option<Ordering> {
	let (a, b) = (a.as_atom()?, b.as_atom()?);
	match (a, b) {
		(Atom::Str(x), Atom::Str(y)) => Some(x.cmp(y)),
		(Atom::Bool(x), Atom::Bool(y)) => Some(x.cmp(y)),
		_ => Some(a.as_f64()?.total_cmp(&b.as_f64()?)),
	}
}

/// A binary ordering relation that suspends until both operands are ground.
fn order(label: &str, u: Term, v: Term, accept: fn(Ordering) -> bool) -> Goal {
	let check: Check = Arc::new(move |walked: &[Term], s: &Subst| {
		match comparable(&walked[0], &walked[1]) {
			Some(ordering) if accept(ordering) => Resumed::Unified(s.clone()),
			// Incomparable kinds fail outright, same as a failed comparison.
			_ => Resumed::Fail,
		}
	});
	suspendable(label, vec![u, v], 2, check)
}

/// `u > v`.
pub fn gto(u: impl Into<Term>, v: impl Into<Term>) -> Goal {
	order("gto", u.into(), v.into(), |o| o == Ordering::Greater)
}

/// `u >= v`.
pub fn gteo(u: impl Into<Term>, v: impl Into<Term>) -> Goal {
	order("gteo", u.into(), v.into(), |o| o != Ordering::Less)
}

/// `u < v`.
pub fn lto(u: impl Into<Term>, v: impl Into<Term>) -> Goal {
	order("lto", u.into(), v.into(), |o| o == Ordering::Less)
}

/// `u <= v`.
pub fn lteo(u: impl Into<Term>, v: impl Into<Term>) -> Goal {
	order("lteo", u.into(), v.into(), |o| o != Ordering::Greater)
}

/// `u` and `v` are different terms.
///
/// The same var on both sides fails immediately. Otherwise the check suspends
/// until both sides are ground and fails exactly when they are equal.
pub fn neqo(u: impl Into<Term>, v: impl Into<Term>) -> Goal {
	let check: Check = Arc::new(|walked: &[Term], s: &Subst| {
		let (a, b) = (&walked[0], &walked[1]);
		if a == b {
			// Equal ground terms, or the very same var: can never differ.
			return Resumed::Fail;
		}
		if a.is_ground() && b.is_ground() {
			Resumed::Unified(s.clone())
		} else {
			Resumed::Later
		}
	});
	suspendable("neqo", vec![u.into(), v.into()], 0, check)
}
