use std::collections::HashMap;
use std::sync::Arc;

use super::{Suspend, Term};
use crate::group::GroupContext;

/// A substitution: bindings from var id to term, plus the metadata a branch
/// carries with it (suspended constraints, group context).
///
/// Logically immutable once emitted downstream. Every extension clones first, so
/// observers of an earlier state are never affected; the suspend list and group
/// context are `Arc`-shared and follow the same copy-on-write discipline.
#[derive(Clone, Debug, Default)]
pub struct Subst {
	bindings: HashMap<u64, Term>,
	suspends: Arc<Vec<Suspend>>,
	group: GroupContext,
}

impl Subst {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, id: u64) -> Option<&Term> {
		self.bindings.get(&id)
	}

	pub fn contains(&self, id: u64) -> bool {
		self.bindings.contains_key(&id)
	}

	pub fn len(&self) -> usize {
		self.bindings.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bindings.is_empty()
	}

	pub fn bound_ids(&self) -> impl Iterator<Item = u64> + '_ {
		self.bindings.keys().copied()
	}

	/// Extend with one binding. The occurs check happens in `unify`, not here.
	pub(crate) fn with(&self, id: u64, term: Term) -> Subst {
		let mut next = self.clone();
		next.bindings.insert(id, term);
		next
	}

	/// Var ids bound here but not in `earlier`, in ascending order.
	pub(crate) fn newly_bound(&self, earlier: &Subst) -> Vec<u64> {
		let mut ids: Vec<u64> = self
			.bindings
			.keys()
			.filter(|id| !earlier.bindings.contains_key(id))
			.copied()
			.collect();
		ids.sort_unstable();
		ids
	}

	/// Same bindings, metadata ignored. This is what negation looks at: a
	/// substitution whose only delta is a suspend attachment is not a real answer.
	pub fn same_bindings(&self, other: &Subst) -> bool {
		self.bindings == other.bindings
	}

	pub fn suspends(&self) -> &[Suspend] {
		&self.suspends
	}

	pub(crate) fn with_suspend(&self, suspend: Suspend) -> Subst {
		let mut list = self.suspends.as_ref().clone();
		list.push(suspend);
		let mut next = self.clone();
		next.suspends = Arc::new(list);
		next
	}

	pub(crate) fn with_suspends(&self, suspends: Vec<Suspend>) -> Subst {
		let mut next = self.clone();
		next.suspends = Arc::new(suspends);
		next
	}

	pub fn group(&self) -> &GroupContext {
		&self.group
	}

	pub(crate) fn with_group(&self, group: GroupContext) -> Subst {
		let mut next = self.clone();
		next.group = group;
		next
	}
}
