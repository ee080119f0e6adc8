use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{walk, Subst, Term};
use crate::goal::Goal;

static NEXT_SUSPEND_ID: AtomicU64 = AtomicU64::new(1);

/// What a suspended checker decided when it was given another chance.
pub enum Resumed {
	/// The constraint holds; continue with this (possibly extended) substitution.
	Unified(Subst),
	/// The constraint definitely fails; prune the branch.
	Fail,
	/// Still undecidable; suspend again on the vars that are still unbound.
	Later,
}

/// The checker behind a suspended constraint.
///
/// Receives the watched terms walked under the current substitution. It must be
/// commutative with respect to wake-up order: any order of waking coexisting
/// constraints has to produce the same observable outcome.
pub type Check = Arc<dyn Fn(&[Term], &Subst) -> Resumed + Send + Sync>;

/// A deferred constraint attached to a substitution, re-run whenever one of its
/// watched vars becomes bound.
#[derive(Clone)]
pub struct Suspend {
	id: u64,
	label: Arc<str>,
	terms: Vec<Term>,
	min_ground: usize,
	check: Check,
	watched: BTreeSet<u64>,
}

impl Suspend {
	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	pub fn watched(&self) -> &BTreeSet<u64> {
		&self.watched
	}

	fn watches_any(&self, ids: &[u64]) -> bool {
		ids.iter().any(|id| self.watched.contains(id))
	}
}

impl fmt::Debug for Suspend {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		// The checker is opaque; show what it watches instead.
		f.debug_struct("Suspend")
			.field("id", &self.id)
			.field("label", &self.label)
			.field("watched", &self.watched)
			.finish()
	}
}

/// Build a goal that checks a constraint as soon as enough of its terms are
/// ground, and suspends it otherwise.
///
/// For every incoming substitution the terms are walked and the grounded
/// (non-var) ones counted. At or above `min_ground` the checker runs and can
/// succeed, fail the branch, or ask to be suspended anyway. A suspension watches
/// every var still unbound in the terms and re-runs on each binding.
pub fn suspendable(label: &str, terms: Vec<Term>, min_ground: usize, check: Check) -> Goal {
	let owned: Arc<str> = label.into();
	Goal::filter_map(label, move |s| attempt(&owned, &terms, min_ground, &check, s))
}

/// One evaluation round of a (possibly suspended) constraint.
pub(crate) fn attempt(
	label: &Arc<str>,
	terms: &[Term],
	min_ground: usize,
	check: &Check,
	s: &Subst,
) -> Option<Subst> {
	let walked: Vec<Term> = terms.iter().map(|t| walk(t, s)).collect();
	let grounded = walked.iter().filter(|t| !t.is_var()).count();

	if grounded >= min_ground {
		match check(&walked, s) {
			Resumed::Unified(next) => return Some(next),
			Resumed::Fail => return None,
			Resumed::Later => {}
		}
	}

	park(label, walked, min_ground, check, s)
}

/// Suspend the constraint, watching every var still unbound in its terms.
///
/// Watch sets are re-derived here on every round, so a wake-up prunes vars that
/// have been bound in the meantime. A `Later` with nothing left to watch can
/// never be woken again; it is dropped so the branch survives unconstrained.
fn park(label: &Arc<str>, walked: Vec<Term>, min_ground: usize, check: &Check, s: &Subst) -> Option<Subst> {
	let mut watched = BTreeSet::new();
	for term in &walked {
		term.var_ids(&mut watched);
	}

	if watched.is_empty() {
		tracing::debug!(constraint = %label, "dropping suspend with nothing to watch");
		return Some(s.clone());
	}

	let suspend = Suspend {
		id: NEXT_SUSPEND_ID.fetch_add(1, Ordering::Relaxed),
		label: label.clone(),
		terms: walked,
		min_ground,
		check: check.clone(),
		watched,
	};
	Some(s.with_suspend(suspend))
}

/// Re-run every suspend watching one of the newly bound vars.
///
/// Runs in insertion order, threading the substitution through each checker. A
/// definite failure prunes the whole branch; a `Later` re-suspends with a fresh
/// watch set.
pub(crate) fn wake_suspends(s: Subst, newly_bound: &[u64]) -> Option<Subst> {
	let mut woken = Vec::new();
	let mut kept = Vec::new();
	for suspend in s.suspends() {
		if suspend.watches_any(newly_bound) {
			woken.push(suspend.clone());
		} else {
			kept.push(suspend.clone());
		}
	}

	if woken.is_empty() {
		return Some(s);
	}

	let mut cur = s.with_suspends(kept);
	for suspend in woken {
		tracing::debug!(constraint = %suspend.label, id = suspend.id, "waking suspend");
		cur = attempt(&suspend.label, &suspend.terms, suspend.min_ground, &suspend.check, &cur)?;
	}
	Some(cur)
}
