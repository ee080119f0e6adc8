use std::time::Duration;

use kanren_lite::Query;

/// Query limits, meant to be flattened into a binary's clap config.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct Limits {
	/// Stop after this many results.
	#[arg(long)]
	pub limit: Option<usize>,

	/// Abort the query after this many milliseconds.
	#[arg(long)]
	pub timeout_ms: Option<u64>,
}

impl Limits {
	/// Apply the configured limits to a query.
	pub fn apply(&self, mut query: Query) -> Query {
		if let Some(limit) = self.limit {
			query = query.limit(limit);
		}
		if let Some(ms) = self.timeout_ms {
			query = query.timeout(Duration::from_millis(ms));
		}
		query
	}
}
