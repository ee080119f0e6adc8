use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::{Future, FutureExt, Stream, StreamExt};

use crate::{Error, Result};

type Produce<T> = Box<dyn FnOnce(Emitter<T>) -> BoxFuture<'static, Result<()>> + Send>;

/// A cold, cancellable stream of values.
///
/// Nothing runs until [`subscribe`](Self::subscribe) is called. The producer is a
/// future that pushes values through an [`Emitter`]; it is driven cooperatively by
/// the [`Subscriber`] that consumes them, so a chain of observables runs on a
/// single task with no internal spawning.
///
/// Cancellation is drop-driven: dropping the subscriber closes the channel, the
/// producer's next [`Emitter::send`] fails with [`Error::Cancel`], and the failure
/// unwinds through every nested producer in the chain.
pub struct Observable<T> {
	produce: Produce<T>,
}

impl<T: Send + 'static> Observable<T> {
	/// Create a new observable from a producer closure.
	///
	/// The closure receives the emitter when the observable is subscribed.
	/// Returning `Err(Error::Cancel)` is the normal way a producer reacts to a
	/// dropped subscriber; any other error is surfaced as the stream's terminal
	/// error after all buffered values have been delivered.
	pub fn new<F, Fut>(produce: F) -> Self
	where
		F: FnOnce(Emitter<T>) -> Fut + Send + 'static,
		Fut: Future<Output = Result<()>> + Send + 'static,
	{
		Self {
			produce: Box::new(move |emit| produce(emit).boxed()),
		}
	}

	/// An observable that completes immediately without emitting.
	pub fn empty() -> Self {
		Self::new(|_emit| async { Ok(()) })
	}

	/// An observable that emits a single value and completes.
	pub fn of(value: T) -> Self {
		Self::new(move |emit| async move {
			emit.send(value).await?;
			Ok(())
		})
	}

	/// An observable that emits every item of the iterator in order.
	pub fn from_iter<I>(items: I) -> Self
	where
		I: IntoIterator<Item = T> + Send + 'static,
		I::IntoIter: Send,
	{
		Self::new(move |emit| async move {
			for item in items {
				emit.send(item).await?;
			}
			Ok(())
		})
	}

	/// An observable that emits the future's output and completes.
	pub fn from_future<Fut>(future: Fut) -> Self
	where
		Fut: Future<Output = T> + Send + 'static,
	{
		Self::new(move |emit| async move {
			emit.send(future.await).await?;
			Ok(())
		})
	}

	/// An observable that forwards an async sequence, stopping at the first error.
	pub fn from_try_stream<S>(stream: S) -> Self
	where
		S: Stream<Item = Result<T>> + Send + 'static,
	{
		Self::new(move |emit| async move {
			let mut stream = std::pin::pin!(stream);
			while let Some(item) = stream.next().await {
				emit.send(item?).await?;
			}
			Ok(())
		})
	}

	/// Start the producer and return the consuming half.
	pub fn subscribe(self) -> Subscriber<T> {
		// Capacity 1 keeps production demand paced: the producer gets one value
		// ahead of the consumer and then parks on send.
		let (tx, rx) = async_channel::bounded(1);
		let driver = (self.produce)(Emitter { tx });

		Subscriber {
			rx,
			driver: Some(driver),
			failed: None,
		}
	}
}

/// The sending half handed to a producer.
pub struct Emitter<T> {
	tx: async_channel::Sender<T>,
}

impl<T> Emitter<T> {
	/// Deliver one value downstream.
	///
	/// Waits until the subscriber has made room. Fails with [`Error::Cancel`]
	/// once the subscriber has been dropped.
	pub async fn send(&self, value: T) -> Result<()> {
		self.tx.send(value).await.map_err(|_| Error::Cancel)
	}

	/// Whether the subscriber is still listening.
	pub fn is_open(&self) -> bool {
		!self.tx.is_closed()
	}
}

/// The consuming half of a subscribed [`Observable`].
///
/// Dropping the subscriber cancels the whole upstream chain.
pub struct Subscriber<T> {
	rx: async_channel::Receiver<T>,
	driver: Option<BoxFuture<'static, Result<()>>>,
	failed: Option<Error>,
}

// `poll_next` re-pins `rx` fresh on every call and never relies on address
// stability across polls, so it's sound for `Subscriber` to be `Unpin` even
// though `async_channel::Receiver` itself is marked `!Unpin`.
impl<T> Unpin for Subscriber<T> {}

impl<T: Send + 'static> Subscriber<T> {
	/// Return the next value.
	///
	/// `Ok(None)` means the stream completed. An `Err` is terminal: no further
	/// values follow it.
	pub async fn next(&mut self) -> Result<Option<T>> {
		StreamExt::next(self).await.transpose()
	}

	/// Drain the stream to completion, collecting every value.
	pub async fn collect(mut self) -> Result<Vec<T>> {
		let mut items = Vec::new();
		while let Some(item) = self.next().await? {
			items.push(item);
		}
		Ok(items)
	}
}

impl<T> Stream for Subscriber<T> {
	type Item = Result<T>;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		let this = &mut *self;

		// Drive the producer; it parks itself on send when the channel is full.
		if let Some(driver) = this.driver.as_mut() {
			if let Poll::Ready(res) = driver.as_mut().poll(cx) {
				this.driver = None;
				match res {
					// Cancel means our own consumer went away mid-production; not a failure.
					Ok(()) | Err(Error::Cancel) => {}
					Err(err) => this.failed = Some(err),
				}
			}
		}

		// Buffered values drain before a terminal error is reported.
		// SAFETY: `rx` is never moved while borrowed here; it's re-pinned fresh
		// on every poll and nothing relies on it staying at a stable address.
		match unsafe { Pin::new_unchecked(&mut this.rx) }.poll_next(cx) {
			Poll::Ready(Some(item)) => Poll::Ready(Some(Ok(item))),
			Poll::Ready(None) => Poll::Ready(this.failed.take().map(Err)),
			Poll::Pending => Poll::Pending,
		}
	}
}

#[cfg(test)]
impl<T: Send + 'static + std::fmt::Debug> Subscriber<T> {
	pub fn assert_next(&mut self) -> T {
		self.next()
			.now_or_never()
			.expect("next blocked")
			.expect("stream errored")
			.expect("stream completed")
	}

	pub fn assert_done(&mut self) {
		let next = self.next().now_or_never().expect("next blocked").expect("stream errored");
		assert!(next.is_none(), "expected completion");
	}

	pub fn assert_error(&mut self) -> Error {
		self.next()
			.now_or_never()
			.expect("next blocked")
			.expect_err("expected an error")
	}

	pub fn assert_wait(&mut self) {
		assert!(self.next().now_or_never().is_none(), "next should block");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn of_and_empty() {
		let mut sub = Observable::of(42).subscribe();
		assert_eq!(sub.assert_next(), 42);
		sub.assert_done();

		let mut sub = Observable::<u32>::empty().subscribe();
		sub.assert_done();
	}

	#[tokio::test]
	async fn from_iter_in_order() {
		let sub = Observable::from_iter(vec![1, 2, 3]).subscribe();
		assert_eq!(sub.collect().await.unwrap(), vec![1, 2, 3]);
	}

	#[tokio::test]
	async fn cold_until_subscribed() {
		use std::sync::atomic::{AtomicBool, Ordering};
		use std::sync::Arc;

		let started = Arc::new(AtomicBool::new(false));
		let flag = started.clone();

		let obs = Observable::new(move |emit| async move {
			flag.store(true, Ordering::Relaxed);
			emit.send(1).await?;
			Ok(())
		});
		assert!(!started.load(Ordering::Relaxed), "producer ran before subscribe");

		let mut sub = obs.subscribe();
		assert!(!started.load(Ordering::Relaxed), "producer ran before first poll");
		assert_eq!(sub.assert_next(), 1);
		assert!(started.load(Ordering::Relaxed));
	}

	#[tokio::test]
	async fn drop_cancels_producer() {
		use std::sync::atomic::{AtomicUsize, Ordering};
		use std::sync::Arc;

		let produced = Arc::new(AtomicUsize::new(0));
		let count = produced.clone();

		let mut sub = Observable::new(move |emit| async move {
			for i in 0usize.. {
				emit.send(i).await?;
				count.store(i + 1, Ordering::Relaxed);
			}
			Ok(())
		})
		.subscribe();

		assert_eq!(sub.assert_next(), 0);
		assert_eq!(sub.assert_next(), 1);
		drop(sub);

		// The producer can be at most one send ahead of what we consumed.
		assert!(produced.load(Ordering::Relaxed) <= 3);
	}

	#[tokio::test]
	async fn error_is_terminal_after_drain() {
		let mut sub = Observable::new(|emit| async move {
			emit.send(1).await?;
			Err(Error::Timeout)
		})
		.subscribe();

		assert_eq!(sub.assert_next(), 1);
		assert_eq!(sub.assert_error(), Error::Timeout);
		sub.assert_done();
	}

	#[tokio::test]
	async fn from_future_emits_once() {
		let mut sub = Observable::from_future(async { "hello" }).subscribe();
		assert_eq!(sub.assert_next(), "hello");
		sub.assert_done();
	}
}
