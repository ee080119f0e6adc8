//! Lift pure host functions into relations.
//!
//! A lifted function of arity N becomes a goal of arity N+1: the extra argument
//! receives the computed output. If any input is not ground under the incoming
//! substitution the goal silently skips it (no emission, no suspension); use the
//! arithmetic relations when bidirectional modes are needed.

use std::sync::Arc;

use crate::goal::Goal;
use crate::term::{unify, walk, Term};

/// Lift a unary host function.
pub fn lift1<F>(f: F) -> impl Fn(Term, Term) -> Goal
where
	F: Fn(&Term) -> Term + Send + Sync + 'static,
{
	let f = Arc::new(f);
	move |a, out| {
		let f = f.clone();
		Goal::filter_map("lift1", move |s| {
			let a = walk(&a, s);
			if !a.is_ground() {
				return None;
			}
			unify(&out, &f(&a), s)
		})
	}
}

/// Lift a binary host function.
pub fn lift2<F>(f: F) -> impl Fn(Term, Term, Term) -> Goal
where
	F: Fn(&Term, &Term) -> Term + Send + Sync + 'static,
{
	let f = Arc::new(f);
	move |a, b, out| {
		let f = f.clone();
		Goal::filter_map("lift2", move |s| {
			let a = walk(&a, s);
			let b = walk(&b, s);
			if !a.is_ground() || !b.is_ground() {
				return None;
			}
			unify(&out, &f(&a, &b), s)
		})
	}
}

/// Lift a ternary host function.
pub fn lift3<F>(f: F) -> impl Fn(Term, Term, Term, Term) -> Goal
where
	F: Fn(&Term, &Term, &Term) -> Term + Send + Sync + 'static,
{
	let f = Arc::new(f);
	move |a, b, c, out| {
		let f = f.clone();
		Goal::filter_map("lift3", move |s| {
			let a = walk(&a, s);
			let b = walk(&b, s);
			let c = walk(&c, s);
			if !a.is_ground() || !b.is_ground() || !c.is_ground() {
				return None;
			}
			unify(&out, &f(&a, &b, &c), s)
		})
	}
}
