use crate::goal::Goal;
use crate::term::{is_ground, Term};

/// Succeeds iff the term is fully ground under the current substitution.
pub fn groundo(term: impl Into<Term>) -> Goal {
	let term = term.into();
	Goal::filter_map("groundo", move |s| is_ground(&term, s).then(|| s.clone()))
}

/// Succeeds iff some var remains in the term under the current substitution.
pub fn non_groundo(term: impl Into<Term>) -> Goal {
	let term = term.into();
	Goal::filter_map("non_groundo", move |s| (!is_ground(&term, s)).then(|| s.clone()))
}
