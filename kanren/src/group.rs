use std::sync::Arc;

/// What kind of wrapper opened a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
	Conj,
	Disj,
	Relation,
}

/// A lightweight handle to a goal, enough for a relation to recognize its peers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoalRef {
	pub id: u64,
	pub label: Arc<str>,
}

/// One step of a group path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupStep {
	pub id: u64,
	pub kind: GroupKind,
}

/// Group metadata carried by every substitution.
///
/// Conjunction, disjunction, and relation wrappers each stamp the substitutions
/// they re-emit with a group id unique to the wrapper instance, the path of
/// groups entered so far, the wrapper's direct conjuncts, and every goal
/// reachable through it. External relations use this to detect peer goals
/// running in the same group and trigger cross-goal optimizations; the core
/// only propagates it and never consults it.
#[derive(Clone, Debug, Default)]
pub struct GroupContext {
	pub id: u64,
	pub path: Arc<Vec<GroupStep>>,
	pub conj: Arc<Vec<GoalRef>>,
	pub all: Arc<Vec<GoalRef>>,
}

impl GroupContext {
	/// Enter a nested group, appending one path step.
	pub(crate) fn descend(
		&self,
		id: u64,
		kind: GroupKind,
		conj: Arc<Vec<GoalRef>>,
		all: Arc<Vec<GoalRef>>,
	) -> GroupContext {
		let mut path = self.path.as_ref().clone();
		path.push(GroupStep { id, kind });
		GroupContext {
			id,
			path: Arc::new(path),
			conj,
			all,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn descend_appends_a_step() {
		let root = GroupContext::default();
		assert_eq!(root.id, 0);
		assert!(root.path.is_empty());

		let refs = Arc::new(Vec::new());
		let child = root.descend(7, GroupKind::Conj, refs.clone(), refs.clone());
		assert_eq!(child.id, 7);
		assert_eq!(child.path.len(), 1);
		assert_eq!(child.path[0].kind, GroupKind::Conj);

		let grandchild = child.descend(9, GroupKind::Relation, refs.clone(), refs);
		assert_eq!(grandchild.path.len(), 2);
		// The parent path is untouched.
		assert_eq!(child.path.len(), 1);
	}
}
