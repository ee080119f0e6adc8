use std::time::Duration;

use super::{timeout, Goal};
use crate::term::Subst;
use crate::Error;

/// What [`run`] produced.
#[derive(Debug, Default)]
pub struct RunOutcome {
	/// Every substitution emitted before completion, the cap, or the error.
	pub results: Vec<Subst>,
	/// True iff the stream completed naturally (the cap counts as natural).
	pub completed: bool,
	/// The terminal error, if any. `completed` is false when this is set.
	pub error: Option<Error>,
}

/// Drive a goal from a single empty substitution and collect what comes out.
pub async fn run(goal: &Goal, max_results: Option<usize>, limit: Option<Duration>) -> RunOutcome {
	let goal = match limit {
		Some(limit) => timeout(goal.clone(), limit),
		None => goal.clone(),
	};

	let mut stream = goal.over(Subst::new());
	if let Some(max) = max_results {
		stream = stream.take(max);
	}

	let mut sub = stream.subscribe();
	let mut outcome = RunOutcome::default();
	loop {
		match sub.next().await {
			Ok(Some(s)) => outcome.results.push(s),
			Ok(None) => {
				outcome.completed = true;
				return outcome;
			}
			Err(err) => {
				outcome.error = Some(err);
				return outcome;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::goal::{any, eq};
	use crate::stream::Observable;
	use crate::term::Var;

	#[tokio::test]
	async fn collects_until_completion() {
		let x = Var::fresh();
		let outcome = run(&any([eq(&x, 1i64), eq(&x, 2i64)]), None, None).await;
		assert_eq!(outcome.results.len(), 2);
		assert!(outcome.completed);
		assert!(outcome.error.is_none());
	}

	#[tokio::test]
	async fn respects_max_results() {
		let x = Var::fresh();
		let outcome = run(&any([eq(&x, 1i64), eq(&x, 2i64), eq(&x, 3i64)]), Some(2), None).await;
		assert_eq!(outcome.results.len(), 2);
		assert!(outcome.completed);
	}

	#[tokio::test(start_paused = true)]
	async fn captures_timeout() {
		let stuck = Goal::new("stuck", |input| {
			input.flat_map(|_s: Subst| {
				Observable::new(|_emit| async {
					futures::future::pending::<()>().await;
					Ok(())
				})
			})
		});

		let outcome = run(&stuck, None, Some(Duration::from_millis(5))).await;
		assert!(outcome.results.is_empty());
		assert!(!outcome.completed);
		assert_eq!(outcome.error, Some(Error::Timeout));
	}
}
