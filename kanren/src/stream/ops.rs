use futures::stream::SelectAll;
use futures::StreamExt;

use super::Observable;

// Lazy operators. Each one wraps the upstream in a new producer, so nothing runs
// until the terminal subscriber polls, and dropping the subscriber tears the whole
// chain down through the failed sends.
impl<T: Send + 'static> Observable<T> {
	/// Transform every value.
	pub fn map<U, F>(self, f: F) -> Observable<U>
	where
		U: Send + 'static,
		F: Fn(T) -> U + Send + 'static,
	{
		Observable::new(move |emit| async move {
			let mut sub = self.subscribe();
			while let Some(item) = sub.next().await? {
				emit.send(f(item)).await?;
			}
			Ok(())
		})
	}

	/// Keep only values matching the predicate.
	pub fn filter<F>(self, f: F) -> Observable<T>
	where
		F: Fn(&T) -> bool + Send + 'static,
	{
		self.filter_map(move |item| if f(&item) { Some(item) } else { None })
	}

	/// Transform and filter in one pass.
	pub fn filter_map<U, F>(self, f: F) -> Observable<U>
	where
		U: Send + 'static,
		F: Fn(T) -> Option<U> + Send + 'static,
	{
		Observable::new(move |emit| async move {
			let mut sub = self.subscribe();
			while let Some(item) = sub.next().await? {
				if let Some(mapped) = f(item) {
					emit.send(mapped).await?;
				}
			}
			Ok(())
		})
	}

	/// Map every value to an inner observable and interleave their outputs.
	///
	/// Inner subscriptions run concurrently. The output completes when the input
	/// has completed AND every active inner has completed.
	pub fn flat_map<U, F>(self, f: F) -> Observable<U>
	where
		U: Send + 'static,
		F: Fn(T) -> Observable<U> + Send + 'static,
	{
		Observable::new(move |emit| async move {
			let mut outer = Some(self.subscribe());
			let mut inners = SelectAll::new();

			loop {
				tokio::select! {
					biased;
					Some(res) = inners.next(), if !inners.is_empty() => {
						emit.send(res?).await?;
					}
					res = async { outer.as_mut().unwrap().next().await }, if outer.is_some() => {
						match res? {
							Some(item) => inners.push(f(item).subscribe()),
							None => outer = None,
						}
					}
					else => break,
				}
			}

			Ok(())
		})
	}

	/// Interleave two observables; completes when both complete.
	pub fn merge(self, other: Observable<T>) -> Observable<T> {
		Observable::new(move |emit| async move {
			let mut both = futures::stream::select(self.subscribe(), other.subscribe());
			while let Some(item) = both.next().await {
				emit.send(item?).await?;
			}
			Ok(())
		})
	}

	/// Forward at most `n` values, then complete and cancel upstream.
	pub fn take(self, n: usize) -> Observable<T> {
		Observable::new(move |emit| async move {
			if n == 0 {
				return Ok(());
			}

			let mut sub = self.subscribe();
			let mut taken = 0;
			while let Some(item) = sub.next().await? {
				emit.send(item).await?;
				taken += 1;
				if taken == n {
					// Dropping the subscriber cancels upstream production.
					break;
				}
			}
			Ok(())
		})
	}

	/// Fold the whole stream into a single value, emitted on completion.
	pub fn reduce<A, F>(self, init: A, f: F) -> Observable<A>
	where
		A: Send + 'static,
		F: Fn(A, T) -> A + Send + 'static,
	{
		Observable::new(move |emit| async move {
			let mut sub = self.subscribe();
			let mut acc = init;
			while let Some(item) = sub.next().await? {
				acc = f(acc, item);
			}
			emit.send(acc).await?;
			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn map_filter() {
		let sub = Observable::from_iter(1..=5)
			.map(|x| x * 10)
			.filter(|x| *x > 20)
			.subscribe();
		assert_eq!(sub.collect().await.unwrap(), vec![30, 40, 50]);
	}

	#[tokio::test]
	async fn flat_map_interleaves_and_completes() {
		let sub = Observable::from_iter(vec![1, 10])
			.flat_map(|base| Observable::from_iter(vec![base, base + 1]))
			.subscribe();

		let mut items = sub.collect().await.unwrap();
		items.sort();
		assert_eq!(items, vec![1, 2, 10, 11]);
	}

	#[tokio::test]
	async fn flat_map_empty_inner() {
		let sub = Observable::from_iter(vec![1, 2, 3])
			.flat_map(|x| {
				if x == 2 {
					Observable::empty()
				} else {
					Observable::of(x)
				}
			})
			.subscribe();

		let mut items = sub.collect().await.unwrap();
		items.sort();
		assert_eq!(items, vec![1, 3]);
	}

	#[tokio::test]
	async fn merge_sees_both_sides() {
		let a = Observable::from_iter(vec![1, 2]);
		let b = Observable::from_iter(vec![3, 4]);
		let mut items = a.merge(b).subscribe().collect().await.unwrap();
		items.sort();
		assert_eq!(items, vec![1, 2, 3, 4]);
	}

	#[tokio::test]
	async fn take_cancels_upstream() {
		use std::sync::atomic::{AtomicUsize, Ordering};
		use std::sync::Arc;

		let produced = Arc::new(AtomicUsize::new(0));
		let count = produced.clone();

		let items = Observable::new(move |emit| async move {
			for i in 0.. {
				emit.send(i).await?;
				count.fetch_add(1, Ordering::Relaxed);
			}
			Ok(())
		})
		.take(3)
		.subscribe()
		.collect()
		.await
		.unwrap();

		assert_eq!(items, vec![0, 1, 2]);
		assert!(produced.load(Ordering::Relaxed) <= 4, "infinite producer kept running");
	}

	#[tokio::test]
	async fn take_zero_never_subscribes() {
		use std::sync::atomic::{AtomicBool, Ordering};
		use std::sync::Arc;

		let started = Arc::new(AtomicBool::new(false));
		let flag = started.clone();

		let items = Observable::new(move |emit| async move {
			flag.store(true, Ordering::Relaxed);
			emit.send(1).await?;
			Ok(())
		})
		.take(0)
		.subscribe()
		.collect()
		.await
		.unwrap();

		assert!(items.is_empty());
		assert!(!started.load(Ordering::Relaxed));
	}

	#[tokio::test]
	async fn reduce_emits_once() {
		let mut sub = Observable::from_iter(1..=4).reduce(0, |acc, x| acc + x).subscribe();
		assert_eq!(sub.assert_next(), 10);
		sub.assert_done();
	}

	#[tokio::test]
	async fn reduce_of_empty_emits_init() {
		let mut sub = Observable::<u32>::empty().reduce(7, |acc, x| acc + x).subscribe();
		assert_eq!(sub.assert_next(), 7);
		sub.assert_done();
	}
}
