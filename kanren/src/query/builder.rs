use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use web_async::Lock;

use super::{normalize, Row};
use crate::goal::{all, timeout, Goal};
use crate::stream::{Observable, Subscriber};
use crate::term::{walk, Subst, Term, Var};
use crate::Result;

/// The logic-variable proxy handed to every `where_` callback.
///
/// Vars are allocated lazily on first use and memoized by name, so separate
/// callbacks that mention the same name share the same var.
#[derive(Clone)]
pub struct Vars {
	inner: Lock<HashMap<String, Var>>,
}

impl Default for Vars {
	fn default() -> Self {
		Self {
			inner: Lock::new(HashMap::new()),
		}
	}
}

impl Vars {
	pub fn get(&self, name: &str) -> Var {
		let mut inner = self.inner.lock();
		inner
			.entry(name.to_string())
			.or_insert_with(|| Var::named(name))
			.clone()
	}

	/// Every var the proxy has handed out, sorted by name.
	fn snapshot(&self) -> Vec<(String, Var)> {
		let inner = self.inner.lock();
		let mut all: Vec<(String, Var)> = inner.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
		all.sort_by(|a, b| a.0.cmp(&b.0));
		all
	}
}

enum Select {
	All,
	Names(Vec<String>),
}

/// A fluent query over the logic engine.
///
/// Accumulates goals through [`where_`](Self::where_), runs them as one
/// conjunction over a single empty substitution, and projects each answer into
/// a [`Row`]. Iteration is pull-based: dropping the subscriber (breaking out of
/// the loop) cancels the whole pipeline.
///
/// ```no_run
/// # use kanren_lite::*;
/// # async fn demo() -> Result<()> {
/// let rows = Query::new()
/// 	.where_(|v| membero(v.get("x"), Term::list([1i64, 2, 3])))
/// 	.where_(|v| gto(v.get("x"), 1i64))
/// 	.fetch_all()
/// 	.await?;
/// # Ok(())
/// # }
/// ```
pub struct Query {
	vars: Vars,
	goals: Vec<Goal>,
	select: Select,
	limit: Option<usize>,
	limit_time: Option<Duration>,
}

impl Default for Query {
	fn default() -> Self {
		Self::new()
	}
}

impl Query {
	pub fn new() -> Self {
		Self {
			vars: Vars::default(),
			goals: Vec::new(),
			select: Select::All,
			limit: None,
			limit_time: None,
		}
	}

	/// Add one goal, built against the shared var proxy.
	pub fn where_(mut self, f: impl FnOnce(&Vars) -> Goal) -> Self {
		let goal = f(&self.vars);
		self.goals.push(goal);
		self
	}

	/// Project only the named vars.
	pub fn select<I>(mut self, names: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		self.select = Select::Names(names.into_iter().map(Into::into).collect());
		self
	}

	/// Project every var the proxy knows about. This is the default.
	pub fn select_all(mut self) -> Self {
		self.select = Select::All;
		self
	}

	/// Cap the number of rows; the pipeline is cancelled at the cap.
	pub fn limit(mut self, n: usize) -> Self {
		self.limit = Some(n);
		self
	}

	/// Fail the query with [`Error::Timeout`](crate::Error::Timeout) if it has
	/// not completed within the duration.
	pub fn timeout(mut self, limit: Duration) -> Self {
		self.limit_time = Some(limit);
		self
	}

	/// The composed conjunction of every accumulated goal.
	pub fn goal(&self) -> Goal {
		let conj = all(self.goals.iter().cloned());
		match self.limit_time {
			Some(limit) => timeout(conj, limit),
			None => conj,
		}
	}

	/// The lazy row stream. Nothing runs until the result is subscribed.
	pub fn to_observable(&self) -> Observable<Row> {
		let mut stream = self.goal().over(Subst::new());
		if let Some(limit) = self.limit {
			stream = stream.take(limit);
		}

		let selected: Vec<(String, Var)> = match &self.select {
			Select::All => self.vars.snapshot(),
			Select::Names(names) => names.iter().map(|n| (n.clone(), self.vars.get(n))).collect(),
		};

		stream.map(move |s| {
			let fields: BTreeMap<String, Term> = selected
				.iter()
				.map(|(name, var)| (name.clone(), normalize(&walk(&Term::from(var), &s))))
				.collect();
			Row::new(fields)
		})
	}

	/// Subscribe and iterate rows asynchronously.
	pub fn subscribe(&self) -> Subscriber<Row> {
		self.to_observable().subscribe()
	}

	/// A stream of the walked values of a single term, one per answer.
	pub fn values(&self, term: impl Into<Term>) -> Subscriber<Term> {
		let term = term.into();
		let mut stream = self.goal().over(Subst::new());
		if let Some(limit) = self.limit {
			stream = stream.take(limit);
		}
		stream.map(move |s| normalize(&walk(&term, &s))).subscribe()
	}

	/// Run to completion and collect every row.
	pub async fn fetch_all(&self) -> Result<Vec<Row>> {
		self.subscribe().collect().await
	}

	/// The first row, cancelling the rest of the pipeline.
	pub async fn first(&self) -> Result<Option<Row>> {
		let mut sub = self.to_observable().take(1).subscribe();
		sub.next().await
	}

	/// The last row, after running to completion.
	pub async fn last(&self) -> Result<Option<Row>> {
		let mut sub = self.subscribe();
		let mut last = None;
		while let Some(row) = sub.next().await? {
			last = Some(row);
		}
		Ok(last)
	}
}
