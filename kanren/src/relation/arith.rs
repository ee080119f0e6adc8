use std::sync::Arc;

use crate::goal::Goal;
use crate::term::{suspendable, unify, Atom, Check, Resumed, Subst, Term};

// Numeric tower: ints stay ints while they can, anything mixed widens to float.
#[derive(Clone, Copy)]
enum Num {
	Int(i64),
	Float(f64),
}

impl Num {
	fn of(term: &Term) -> Option<Num> {
		match term.as_atom()? {
			Atom::Int(i) => Some(Num::Int(*i)),
			Atom::Float(f) => Some(Num::Float(*f)),
			_ => None,
		}
	}

	fn term(self) -> Term {
		match self {
			Num::Int(i) => Term::from(i),
			Num::Float(f) => Term::from(f),
		}
	}

	fn as_f64(self) -> f64 {
		match self {
			Num::Int(i) => i as f64,
			Num::Float(f) => f,
		}
	}

	fn is_zero(self) -> bool {
		match self {
			Num::Int(i) => i == 0,
			Num::Float(f) => f == 0.0,
		}
	}
}

fn add(a: Num, b: Num) -> Option<Num> {
	match (a, b) {
		(Num::Int(x), Num::Int(y)) => x.checked_add(y).map(Num::Int),
		_ => Some(Num::Float(a.as_f64() + b.as_f64())),
	}
}

fn sub(a: Num, b: Num) -> Option<Num> {
	match (a, b) {
		(Num::Int(x), Num::Int(y)) => x.checked_sub(y).map(Num::Int),
		_ => Some(Num::Float(a.as_f64() - b.as_f64())),
	}
}

fn mul(a: Num, b: Num) -> Option<Num> {
	match (a, b) {
		(Num::Int(x), Num::Int(y)) => x.checked_mul(y).map(Num::Int),
		_ => Some(Num::Float(a.as_f64() * b.as_f64())),
	}
}

// Exact int division stays int, everything else goes through floats.
// A zero divisor is a definite failure, not an error.
fn div(a: Num, b: Num) -> Option<Num> {
	if b.is_zero() {
		return None;
	}
	match (a, b) {
		(Num::Int(x), Num::Int(y)) if x % y == 0 => Some(Num::Int(x / y)),
		_ => Some(Num::Float(a.as_f64() / b.as_f64())),
	}
}

fn settle(target: &Term, value: Option<Num>, s: &Subst) -> Resumed {
	match value {
		None => Resumed::Fail,
		Some(value) => match unify(target, &value.term(), s) {
			Some(next) => Resumed::Unified(next),
			None => Resumed::Fail,
		},
	}
}

#[derive(Clone, Copy)]
enum Op {
	Add,
	Sub,
	Mul,
	Div,
}

/// Mode analysis for a ternary arithmetic relation over `a ∘ b = c`.
///
/// With all three ground the equation is checked; with two ground the third is
/// derived and unified; with fewer the constraint suspends until two are ground.
fn arith(label: &str, op: Op, a: Term, b: Term, c: Term) -> Goal {
	let check: Check = Arc::new(move |walked: &[Term], s: &Subst| {
		let (ta, tb, tc) = (&walked[0], &walked[1], &walked[2]);
		let (na, nb, nc) = (Num::of(ta), Num::of(tb), Num::of(tc));

		match op {
			Op::Add => match (na, nb, nc) {
				(Some(a), Some(b), _) => settle(tc, add(a, b), s),
				(Some(a), _, Some(c)) => settle(tb, sub(c, a), s),
				(_, Some(b), Some(c)) => settle(ta, sub(c, b), s),
				_ => Resumed::Fail,
			},
			Op::Sub => match (na, nb, nc) {
				(Some(a), Some(b), _) => settle(tc, sub(a, b), s),
				(Some(a), _, Some(c)) => settle(tb, sub(a, c), s),
				(_, Some(b), Some(c)) => settle(ta, add(b, c), s),
				_ => Resumed::Fail,
			},
			Op::Mul => match (na, nb, nc) {
				(Some(a), Some(b), _) => settle(tc, mul(a, b), s),
				(Some(a), _, Some(c)) => {
					if a.is_zero() {
						// 0 * b = 0 leaves b free; 0 * b = c≠0 is impossible.
						if c.is_zero() {
							Resumed::Later
						} else {
							Resumed::Fail
						}
					} else {
						settle(tb, div(c, a), s)
					}
				}
				(_, Some(b), Some(c)) => {
					if b.is_zero() {
						if c.is_zero() {
							Resumed::Later
						} else {
							Resumed::Fail
						}
					} else {
						settle(ta, div(c, b), s)
					}
				}
				_ => Resumed::Fail,
			},
			Op::Div => match (na, nb, nc) {
				(Some(a), Some(b), _) => settle(tc, div(a, b), s),
				(Some(a), _, Some(c)) => {
					if c.is_zero() {
						// a / b = 0 only when a is 0, and then b stays free.
						if a.is_zero() {
							Resumed::Later
						} else {
							Resumed::Fail
						}
					} else {
						settle(tb, div(a, c), s)
					}
				}
				(_, Some(b), Some(c)) => {
					if b.is_zero() {
						Resumed::Fail
					} else {
						settle(ta, mul(b, c), s)
					}
				}
				_ => Resumed::Fail,
			},
		}
	});
	suspendable(label, vec![a, b, c], 2, check)
}

/// `a + b = c`.
pub fn pluso(a: impl Into<Term>, b: impl Into<Term>, c: impl Into<Term>) -> Goal {
	arith("pluso", Op::Add, a.into(), b.into(), c.into())
}

/// `a - b = c`.
pub fn minuso(a: impl Into<Term>, b: impl Into<Term>, c: impl Into<Term>) -> Goal {
	arith("minuso", Op::Sub, a.into(), b.into(), c.into())
}

/// `a * b = c`.
pub fn multo(a: impl Into<Term>, b: impl Into<Term>, c: impl Into<Term>) -> Goal {
	arith("multo", Op::Mul, a.into(), b.into(), c.into())
}

/// `a / b = c`.
pub fn divideo(a: impl Into<Term>, b: impl Into<Term>, c: impl Into<Term>) -> Goal {
	arith("divideo", Op::Div, a.into(), b.into(), c.into())
}
