mod control;
mod core;
mod run;

pub use control::*;
pub use core::*;
pub use run::*;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::group::{GoalRef, GroupKind};
use crate::stream::Observable;
use crate::term::Subst;

static NEXT_GOAL_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_goal_id() -> u64 {
	NEXT_GOAL_ID.fetch_add(1, Ordering::Relaxed)
}

type Apply = Arc<dyn Fn(Observable<Subst>) -> Observable<Subst> + Send + Sync>;

/// A transformation on streams of substitutions.
///
/// Everything in the engine is a goal: unification, conjunction, aggregation,
/// list relations, even user-provided black boxes. A goal is cheap to clone and
/// can be wired into any number of pipelines; each [`apply`](Self::apply) builds
/// a fresh lazy stage that runs only once the terminal subscriber polls.
#[derive(Clone)]
pub struct Goal {
	id: u64,
	label: Arc<str>,
	children: Arc<Vec<Goal>>,
	apply: Apply,
}

impl Goal {
	/// A goal from a raw stream transform. No group stamping; the transform is
	/// responsible for whatever metadata it wants to propagate.
	pub fn new<F>(label: &str, apply: F) -> Goal
	where
		F: Fn(Observable<Subst>) -> Observable<Subst> + Send + Sync + 'static,
	{
		Self::assemble(next_goal_id(), label.into(), Vec::new(), apply)
	}

	/// Like [`new`](Self::new), recording the goals this one wraps so they stay
	/// visible through [`flatten`](Self::flatten).
	pub fn with_children<F>(label: &str, children: Vec<Goal>, apply: F) -> Goal
	where
		F: Fn(Observable<Subst>) -> Observable<Subst> + Send + Sync + 'static,
	{
		Self::assemble(next_goal_id(), label.into(), children, apply)
	}

	/// A pointwise relation: each substitution either extends or is dropped.
	///
	/// Substitutions are stamped with a relation group before `f` sees them.
	pub fn filter_map<F>(label: &str, f: F) -> Goal
	where
		F: Fn(&Subst) -> Option<Subst> + Send + Sync + 'static,
	{
		let id = next_goal_id();
		let label: Arc<str> = label.into();
		let peers = Arc::new(vec![GoalRef {
			id,
			label: label.clone(),
		}]);
		let f = Arc::new(f);

		let apply = {
			let peers = peers.clone();
			move |input: Observable<Subst>| {
				let f = f.clone();
				let peers = peers.clone();
				input.filter_map(move |s: Subst| {
					let group = s.group().descend(id, GroupKind::Relation, peers.clone(), peers.clone());
					f(&s.with_group(group))
				})
			}
		};
		Self::assemble(id, label, Vec::new(), apply)
	}

	/// A branching relation: each substitution maps to a stream of answers.
	///
	/// Answer streams for different substitutions run concurrently and their
	/// outputs interleave; within one answer stream, order is preserved.
	pub fn branch<F>(label: &str, f: F) -> Goal
	where
		F: Fn(&Subst) -> Observable<Subst> + Send + Sync + 'static,
	{
		let id = next_goal_id();
		let label: Arc<str> = label.into();
		let peers = Arc::new(vec![GoalRef {
			id,
			label: label.clone(),
		}]);
		let f = Arc::new(f);

		let apply = {
			let peers = peers.clone();
			move |input: Observable<Subst>| {
				let f = f.clone();
				let peers = peers.clone();
				input.flat_map(move |s: Subst| {
					let group = s.group().descend(id, GroupKind::Relation, peers.clone(), peers.clone());
					f(&s.with_group(group))
				})
			}
		};
		Self::assemble(id, label, Vec::new(), apply)
	}

	pub(crate) fn assemble<F>(id: u64, label: Arc<str>, children: Vec<Goal>, apply: F) -> Goal
	where
		F: Fn(Observable<Subst>) -> Observable<Subst> + Send + Sync + 'static,
	{
		Goal {
			id,
			label,
			children: Arc::new(children),
			apply: Arc::new(apply),
		}
	}

	/// Wire this goal into a pipeline.
	pub fn apply(&self, input: Observable<Subst>) -> Observable<Subst> {
		(self.apply)(input)
	}

	/// Run this goal over a single substitution.
	pub fn over(&self, s: Subst) -> Observable<Subst> {
		self.apply(Observable::of(s))
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	pub fn children(&self) -> &[Goal] {
		&self.children
	}

	pub fn descriptor(&self) -> GoalRef {
		GoalRef {
			id: self.id,
			label: self.label.clone(),
		}
	}

	/// This goal and every goal reachable through it, depth first.
	pub fn flatten(&self) -> Vec<GoalRef> {
		let mut out = Vec::new();
		self.flatten_into(&mut out);
		out
	}

	fn flatten_into(&self, out: &mut Vec<GoalRef>) {
		out.push(self.descriptor());
		for child in self.children.iter() {
			child.flatten_into(out);
		}
	}
}

impl fmt::Debug for Goal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Goal({}#{})", self.label, self.id)
	}
}
