use std::collections::VecDeque;

use web_async::Lock;

use super::Observable;
use crate::{Error, Result};

struct State<T> {
	// Taken by the first tap that gets polled.
	upstream: Option<Observable<T>>,
	replay: VecDeque<T>,
	buffer: usize,
	taps: Vec<async_channel::Sender<Result<T>>>,
	pumping: bool,
	// Some(None) = completed, Some(Some(_)) = failed.
	done: Option<Option<Error>>,
}

/// A multicast handle over a single upstream subscription.
///
/// Every [`observe`](Self::observe) call registers a new tap; the upstream is
/// subscribed once, when the first tap is polled, and each value is fanned out to
/// all registered taps. Taps registered late receive up to the last `buffer`
/// values first.
///
/// Reference counted: when the last tap is dropped the pump stops and the
/// upstream subscription is cancelled.
pub struct Shared<T> {
	state: Lock<State<T>>,
}

impl<T> Clone for Shared<T> {
	fn clone(&self) -> Self {
		Self {
			state: self.state.clone(),
		}
	}
}

impl<T: Clone + Send + 'static> Observable<T> {
	/// Multicast this observable, replaying the last `buffer` values to late taps.
	pub fn share(self, buffer: usize) -> Shared<T> {
		Shared {
			state: Lock::new(State {
				upstream: Some(self),
				replay: VecDeque::new(),
				buffer,
				taps: Vec::new(),
				pumping: false,
				done: None,
			}),
		}
	}
}

impl<T: Clone + Send + 'static> Shared<T> {
	/// Register a new tap.
	///
	/// Registration happens now; production starts when any tap is first polled.
	pub fn observe(&self) -> Observable<T> {
		let (tx, rx) = async_channel::unbounded();

		{
			let mut state = self.state.lock();

			for item in &state.replay {
				tx.try_send(Ok(item.clone())).ok();
			}

			match &state.done {
				None => state.taps.push(tx),
				Some(None) => drop(tx),
				// Terminal error replays after the buffered values.
				Some(Some(err)) => {
					tx.try_send(Err(err.clone())).ok();
					drop(tx);
				}
			}
		}

		let shared = self.clone();
		Observable::new(move |emit| async move {
			shared.ensure_pump();
			while let Ok(res) = rx.recv().await {
				emit.send(res?).await?;
			}
			Ok(())
		})
	}

	fn ensure_pump(&self) {
		let upstream = {
			let mut state = self.state.lock();
			if state.pumping {
				return;
			}
			state.pumping = true;
			state.upstream.take()
		};

		let upstream = match upstream {
			Some(upstream) => upstream,
			None => return,
		};

		let state = self.state.clone();
		web_async::spawn(async move {
			let mut sub = upstream.subscribe();
			loop {
				match sub.next().await {
					Ok(Some(item)) => {
						let mut state = state.lock();
						if state.buffer > 0 {
							state.replay.push_back(item.clone());
							while state.replay.len() > state.buffer {
								state.replay.pop_front();
							}
						}
						state.taps.retain(|tx| tx.try_send(Ok(item.clone())).is_ok());
						if state.taps.is_empty() {
							// Last tap left; cancel upstream by dropping the subscription.
							// Mark terminal so a late tap completes instead of waiting on
							// a pump that will never run again.
							state.done = Some(None);
							break;
						}
					}
					Ok(None) => {
						let mut state = state.lock();
						state.done = Some(None);
						state.taps.clear();
						break;
					}
					Err(err) => {
						let mut state = state.lock();
						state.done = Some(Some(err.clone()));
						for tx in state.taps.drain(..) {
							tx.try_send(Err(err.clone())).ok();
						}
						break;
					}
				}
			}
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn fan_out_to_all_taps() {
		let shared = Observable::from_iter(vec![1, 2, 3]).share(0);
		let a = shared.observe();
		let b = shared.observe();

		let (a, b) = tokio::join!(
			async { a.subscribe().collect().await.unwrap() },
			async { b.subscribe().collect().await.unwrap() },
		);
		assert_eq!(a, vec![1, 2, 3]);
		assert_eq!(b, vec![1, 2, 3]);
	}

	#[tokio::test]
	async fn upstream_subscribed_once() {
		use std::sync::atomic::{AtomicUsize, Ordering};
		use std::sync::Arc;

		let subscriptions = Arc::new(AtomicUsize::new(0));
		let count = subscriptions.clone();

		let shared = Observable::new(move |emit| async move {
			count.fetch_add(1, Ordering::Relaxed);
			emit.send(1).await?;
			Ok(())
		})
		.share(1);

		let a = shared.observe();
		let b = shared.observe();
		let (a, b) = tokio::join!(
			async { a.subscribe().collect().await.unwrap() },
			async { b.subscribe().collect().await.unwrap() },
		);

		assert_eq!((a, b), (vec![1], vec![1]));
		assert_eq!(subscriptions.load(Ordering::Relaxed), 1);
	}

	#[tokio::test]
	async fn late_tap_gets_replay() {
		let shared = Observable::from_iter(vec![1, 2, 3]).share(1);

		let first = shared.observe().subscribe().collect().await.unwrap();
		assert_eq!(first, vec![1, 2, 3]);

		// The stream already completed; a late tap sees only the replay buffer.
		let late = shared.observe().subscribe().collect().await.unwrap();
		assert_eq!(late, vec![3]);
	}

	#[tokio::test]
	async fn late_tap_after_all_taps_dropped() {
		let shared = Observable::new(|emit| async move {
			for i in 0usize.. {
				emit.send(i).await?;
			}
			Ok(())
		})
		.share(0);

		let mut first = shared.observe().subscribe();
		assert_eq!(first.next().await.unwrap(), Some(0));
		drop(first);

		// Wait for the pump to notice the dropped tap and shut down.
		tokio::time::sleep(std::time::Duration::from_millis(1)).await;

		// A tap registered after the pump exited completes instead of hanging.
		let late = shared.observe().subscribe().collect().await.unwrap();
		assert!(late.is_empty());
	}

	#[tokio::test]
	async fn error_reaches_every_tap() {
		let shared = Observable::<u32>::new(|emit| async move {
			emit.send(1).await?;
			Err(Error::Timeout)
		})
		.share(0);

		let a = shared.observe();
		let b = shared.observe();

		let drain = |obs: Observable<u32>| async move {
			let mut sub = obs.subscribe();
			let mut seen = Vec::new();
			loop {
				match sub.next().await {
					Ok(Some(item)) => seen.push(item),
					Ok(None) => return (seen, None),
					Err(err) => return (seen, Some(err)),
				}
			}
		};

		let (a, b) = tokio::join!(drain(a), drain(b));
		assert_eq!(a.1, Some(Error::Timeout));
		assert_eq!(b.1, Some(Error::Timeout));
	}
}
