/// Error types for the logic engine.
///
/// Unification failures are never errors: a branch that fails to unify simply
/// stops emitting. Everything here is terminal for the subscription it occurs on.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum Error {
	/// The subscriber went away; production should stop.
	///
	/// This is not reported downstream. A cancelled stream completes silently
	/// with whatever it has already emitted.
	#[error("cancelled")]
	Cancel,

	/// A goal wrapped in [`timeout`](crate::goal::timeout) did not complete in time.
	#[error("timeout")]
	Timeout,

	/// An external projection expression failed to evaluate.
	#[error("projection error: {0}")]
	Projection(std::sync::Arc<str>),
}

/// A Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
