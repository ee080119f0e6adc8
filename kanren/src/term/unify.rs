use std::collections::BTreeSet;
use std::sync::Arc;

use super::{wake_suspends, walk, walk_shallow, Subst, Term, Var};

/// Unify two terms, waking any suspended constraints watching newly bound vars.
///
/// Returns the extended substitution on success. Failure (including a definite
/// failure from a woken constraint) returns None and the branch is pruned; this
/// is never an error.
pub fn unify(u: &Term, v: &Term, s: &Subst) -> Option<Subst> {
	let next = base_unify(u, v, s)?;
	let newly = next.newly_bound(s);
	if newly.is_empty() {
		return Some(next);
	}
	wake_suspends(next, &newly)
}

/// Structural unification with the occurs check, no constraint wake-up.
pub fn base_unify(u: &Term, v: &Term, s: &Subst) -> Option<Subst> {
	let u = walk_shallow(u, s);
	let v = walk_shallow(v, s);

	// Covers identical atoms, Nil/Nil, and the same unbound var on both sides.
	if u == v {
		return Some(s.clone());
	}

	match (&u, &v) {
		(Term::Var(x), _) => extend(x, &v, s),
		(_, Term::Var(y)) => extend(y, &u, s),

		// The two list encodings unify against each other.
		(Term::Nil, Term::Seq(items)) | (Term::Seq(items), Term::Nil) => {
			items.is_empty().then(|| s.clone())
		}
		(Term::Cons(uh, ut), Term::Cons(vh, vt)) => {
			let s = base_unify(uh, vh, s)?;
			base_unify(ut, vt, &s)
		}
		(Term::Cons(head, tail), Term::Seq(items)) | (Term::Seq(items), Term::Cons(head, tail)) => {
			let (first, rest) = items.split_first()?;
			let s = base_unify(head, first, s)?;
			base_unify(tail, &Term::Seq(Arc::new(rest.to_vec())), &s)
		}
		(Term::Seq(us), Term::Seq(vs)) => {
			if us.len() != vs.len() {
				return None;
			}
			let mut s = s.clone();
			for (a, b) in us.iter().zip(vs.iter()) {
				s = base_unify(a, b, &s)?;
			}
			Some(s)
		}
		(Term::Record(uf), Term::Record(vf)) => {
			if uf.len() != vf.len() || !uf.keys().eq(vf.keys()) {
				return None;
			}
			let mut s = s.clone();
			for (key, a) in uf.iter() {
				s = base_unify(a, &vf[key], &s)?;
			}
			Some(s)
		}
		_ => None,
	}
}

/// Bind `var` to `val` after the occurs check.
///
/// The check resolves `val` fully through the substitution first; a binding that
/// would make the var reachable from its own value is rejected, which is what
/// keeps every binding chain acyclic.
fn extend(var: &Var, val: &Term, s: &Subst) -> Option<Subst> {
	let resolved = walk(val, s);
	let mut ids = BTreeSet::new();
	resolved.var_ids(&mut ids);
	if ids.contains(&var.id()) {
		return None;
	}
	Some(s.with(var.id(), val.clone()))
}
