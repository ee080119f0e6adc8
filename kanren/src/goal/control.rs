use std::time::Duration;

use super::Goal;
use crate::stream::{Emitter, Observable};
use crate::term::Subst;
use crate::{Error, Result};

async fn forward(stream: Observable<Subst>, emit: &Emitter<Subst>) -> Result<()> {
	let mut sub = stream.subscribe();
	while let Some(s) = sub.next().await? {
		emit.send(s).await?;
	}
	Ok(())
}

/// Committed choice: if `cond` produces any answer, run `then` over those
/// answers; otherwise run `alt` over the original substitution.
///
/// `alt` never sees `cond`'s bindings, only the untouched input.
pub fn ifte(cond: Goal, then: Goal, alt: Goal) -> Goal {
	let children = vec![cond.clone(), then.clone(), alt.clone()];
	Goal::with_children("ifte", children, move |input| {
		let cond = cond.clone();
		let then = then.clone();
		let alt = alt.clone();
		input.flat_map(move |s: Subst| {
			let cond = cond.clone();
			let then = then.clone();
			let alt = alt.clone();
			Observable::new(move |emit| async move {
				let answers = cond.over(s.clone()).subscribe().collect().await?;
				if answers.is_empty() {
					forward(alt.over(s), &emit).await
				} else {
					forward(then.apply(Observable::from_iter(answers)), &emit).await
				}
			})
		})
	})
}

/// Run `a`; if it emitted anything, those are the answers. Otherwise run `b`.
///
/// Unlike [`ifte`], the first branch's own outputs are what gets emitted, so
/// `a`'s answers stream out as they are produced.
pub fn either_or(a: Goal, b: Goal) -> Goal {
	let children = vec![a.clone(), b.clone()];
	Goal::with_children("either_or", children, move |input| {
		let a = a.clone();
		let b = b.clone();
		input.flat_map(move |s: Subst| {
			let a = a.clone();
			let b = b.clone();
			Observable::new(move |emit| async move {
				let mut sub = a.over(s.clone()).subscribe();
				let mut produced = false;
				while let Some(out) = sub.next().await? {
					produced = true;
					emit.send(out).await?;
				}
				drop(sub);

				if !produced {
					forward(b.over(s), &emit).await?;
				}
				Ok(())
			})
		})
	})
}

/// At most one answer per input substitution; cancels the goal once it has one.
pub fn once(goal: Goal) -> Goal {
	let children = vec![goal.clone()];
	Goal::with_children("once", children, move |input| {
		let goal = goal.clone();
		input.flat_map(move |s: Subst| goal.over(s).take(1))
	})
}

/// Negation as failure.
///
/// Emits the input substitution iff the goal produced no real answer for it. An
/// answer whose only delta is a suspended-constraint attachment does not count:
/// a deferred check is not evidence of success, which is what makes `not` safe
/// to combine with arithmetic that may still be suspended.
pub fn not(goal: Goal) -> Goal {
	let children = vec![goal.clone()];
	Goal::with_children("not", children, move |input| {
		let goal = goal.clone();
		input.flat_map(move |s: Subst| {
			let goal = goal.clone();
			Observable::new(move |emit| async move {
				let mut sub = goal.over(s.clone()).subscribe();
				let mut succeeded = false;
				while let Some(out) = sub.next().await? {
					let carrier_only =
						out.same_bindings(&s) && out.suspends().len() > s.suspends().len();
					if !carrier_only {
						succeeded = true;
						break;
					}
				}
				drop(sub);

				if !succeeded {
					emit.send(s).await?;
				}
				Ok(())
			})
		})
	})
}

/// Cancel the goal and surface [`Error::Timeout`] if its stream has not
/// completed within the duration.
pub fn timeout(goal: Goal, limit: Duration) -> Goal {
	let children = vec![goal.clone()];
	Goal::with_children("timeout", children, move |input| {
		let goal = goal.clone();
		Observable::new(move |emit| async move {
			let mut sub = goal.apply(input).subscribe();
			let deadline = tokio::time::sleep(limit);
			let mut deadline = std::pin::pin!(deadline);

			loop {
				tokio::select! {
					res = sub.next() => match res? {
						Some(s) => emit.send(s).await?,
						None => return Ok(()),
					},
					_ = &mut deadline => {
						tracing::warn!(?limit, "goal timed out");
						return Err(Error::Timeout);
					}
				}
			}
		})
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::goal::{all, any, eq, fail, succeed};
	use crate::relation::gto;
	use crate::term::{walk, Term, Var};

	async fn solutions(goal: Goal) -> Vec<Subst> {
		goal.over(Subst::new()).subscribe().collect().await.unwrap()
	}

	#[tokio::test]
	async fn ifte_takes_then_branch() {
		let x = Var::fresh();
		let y = Var::fresh();
		let results = solutions(ifte(eq(&x, 1i64), eq(&y, "then"), eq(&y, "else"))).await;
		assert_eq!(results.len(), 1);
		assert_eq!(walk(&Term::from(&y), &results[0]), Term::from("then"));
		// The condition's bindings flow into then.
		assert_eq!(walk(&Term::from(&x), &results[0]), Term::from(1i64));
	}

	#[tokio::test]
	async fn ifte_takes_else_on_original_subst() {
		let x = Var::fresh();
		let y = Var::fresh();
		let results = solutions(ifte(fail(), eq(&y, "then"), eq(&y, "else"))).await;
		assert_eq!(results.len(), 1);
		assert_eq!(walk(&Term::from(&y), &results[0]), Term::from("else"));
		// No leakage from the failed condition.
		assert_eq!(walk(&Term::from(&x), &results[0]), Term::from(&x));
	}

	#[tokio::test]
	async fn ifte_runs_then_over_every_answer() {
		let x = Var::fresh();
		let results = solutions(ifte(any([eq(&x, 1i64), eq(&x, 2i64)]), succeed(), fail())).await;
		assert_eq!(results.len(), 2);
	}

	#[tokio::test]
	async fn either_or_prefers_first_branch() {
		let x = Var::fresh();
		let results = solutions(either_or(eq(&x, 1i64), eq(&x, 2i64))).await;
		assert_eq!(results.len(), 1);
		assert_eq!(walk(&Term::from(&x), &results[0]), Term::from(1i64));

		let results = solutions(either_or(fail(), eq(&x, 2i64))).await;
		assert_eq!(results.len(), 1);
		assert_eq!(walk(&Term::from(&x), &results[0]), Term::from(2i64));
	}

	#[tokio::test]
	async fn once_caps_each_input() {
		let x = Var::fresh();
		let results = solutions(once(any([eq(&x, 1i64), eq(&x, 2i64)]))).await;
		assert_eq!(results.len(), 1);
	}

	#[tokio::test]
	async fn not_inverts_success() {
		assert!(solutions(not(succeed())).await.is_empty());
		assert_eq!(solutions(not(fail())).await.len(), 1);
		assert_eq!(solutions(not(not(succeed()))).await.len(), 1);
	}

	#[tokio::test]
	async fn not_with_decided_constraint() {
		let x = Var::fresh();

		// x = 5, not(x > 10): the comparison decides and fails, so not succeeds.
		let results = solutions(all([eq(&x, 5i64), not(gto(&x, 10i64))])).await;
		assert_eq!(results.len(), 1);
		assert_eq!(walk(&Term::from(&x), &results[0]), Term::from(5i64));

		// x = 5, not(x > 3): the comparison holds, so not fails.
		let y = Var::fresh();
		let results = solutions(all([eq(&y, 5i64), not(gto(&y, 3i64))])).await;
		assert!(results.is_empty());
	}

	#[tokio::test]
	async fn not_ignores_suspended_carriers() {
		// x unbound: x > 10 can only suspend, which is not a success.
		let x = Var::fresh();
		let results = solutions(not(gto(&x, 10i64))).await;
		assert_eq!(results.len(), 1);
		// And the suspend was discarded along with the subgoal.
		assert!(results[0].suspends().is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn timeout_surfaces_error_and_cancels() {
		// A goal that never completes.
		let stuck = Goal::new("stuck", |input| {
			input.flat_map(|_s: Subst| {
				Observable::new(|_emit| async {
					futures::future::pending::<()>().await;
					Ok(())
				})
			})
		});

		let goal = timeout(stuck, Duration::from_millis(10));
		let mut sub = goal.over(Subst::new()).subscribe();
		let err = sub.next().await.expect_err("should time out");
		assert_eq!(err, Error::Timeout);
	}

	#[tokio::test(start_paused = true)]
	async fn timeout_passes_through_fast_goals() {
		let x = Var::fresh();
		let goal = timeout(eq(&x, 1i64), Duration::from_secs(1));
		let results = solutions(goal).await;
		assert_eq!(results.len(), 1);
	}
}
