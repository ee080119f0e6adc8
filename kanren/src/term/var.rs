use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// The only mutable global in the engine. Ids are process-unique, never reused.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// An unknown, bound through substitutions.
///
/// Two vars are equal iff their ids are equal; the optional name is a debug
/// prefix and never participates in equality or hashing.
#[derive(Clone)]
pub struct Var {
	id: u64,
	name: Option<Arc<str>>,
}

impl Var {
	/// Allocate a new var with a unique id.
	pub fn fresh() -> Self {
		Self {
			id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
			name: None,
		}
	}

	/// Allocate a new var with a debug prefix.
	pub fn named(name: &str) -> Self {
		Self {
			id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
			name: Some(name.into()),
		}
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Reset the id counter. Deterministic tests only; never call while queries run.
	#[doc(hidden)]
	pub fn reset_ids() {
		NEXT_ID.store(1, Ordering::Relaxed);
	}
}

impl PartialEq for Var {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for Var {}

impl std::hash::Hash for Var {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for Var {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.name {
			Some(name) => write!(f, "_{}.{}", name, self.id),
			None => write!(f, "_{}", self.id),
		}
	}
}

impl fmt::Display for Var {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ids_are_unique() {
		let a = Var::fresh();
		let b = Var::fresh();
		assert_ne!(a, b);
		assert!(b.id() > a.id());
	}

	#[test]
	fn name_is_ignored_by_equality() {
		let a = Var::named("x");
		let b = a.clone();
		assert_eq!(a, b);
		assert_eq!(a.name(), Some("x"));

		let c = Var::named("x");
		assert_ne!(a, c, "same name must not mean same var");
	}
}
