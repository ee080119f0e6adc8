use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use crate::goal::Goal;
use crate::stream::Observable;
use crate::term::{walk, Atom, Term};
use crate::Error;

/// A precompiled projection expression, treated as a black box.
///
/// The engine only guarantees the streaming contract around it: inputs are
/// deeply walked before evaluation, the (possibly asynchronous) output is
/// unified against the output pattern, and an evaluation error terminates the
/// stream with [`Error::Projection`].
pub trait Evaluate: Send + Sync {
	fn evaluate(&self, input: Value) -> BoxFuture<'static, std::result::Result<Value, String>>;
}

impl<F> Evaluate for F
where
	F: Fn(Value) -> std::result::Result<Value, String> + Send + Sync,
{
	fn evaluate(&self, input: Value) -> BoxFuture<'static, std::result::Result<Value, String>> {
		futures::future::ready(self(input)).boxed()
	}
}

/// Evaluate an expression over named inputs and unify the result with `output`.
///
/// For each substitution, every input term is walked and converted to a JSON
/// value (unbound vars become null); the evaluator runs over the assembled
/// record; its result converts back to a term and unifies with the output
/// pattern. A unification mismatch drops the substitution silently, an
/// evaluator error kills the stream.
pub fn project(
	inputs: Vec<(String, Term)>,
	evaluator: Arc<dyn Evaluate>,
	output: impl Into<Term>,
) -> Goal {
	let output = output.into();
	Goal::branch("project", move |s| {
		let inputs = inputs.clone();
		let evaluator = evaluator.clone();
		let output = output.clone();
		let s = s.clone();
		Observable::new(move |emit| async move {
			let record: serde_json::Map<String, Value> = inputs
				.iter()
				.map(|(name, term)| (name.clone(), term_to_value(&walk(term, &s))))
				.collect();

			let result = evaluator
				.evaluate(Value::Object(record))
				.await
				.map_err(|msg| Error::Projection(msg.into()))?;

			if let Some(next) = crate::term::unify(&output, &term_from_value(&result), &s) {
				emit.send(next).await?;
			}
			Ok(())
		})
	})
}

/// Plain-JSON view of a term for the evaluator. Unbound vars become null,
/// bytes become arrays of numbers.
fn term_to_value(term: &Term) -> Value {
	match term {
		Term::Var(_) => Value::Null,
		Term::Nil => Value::Array(Vec::new()),
		Term::Atom(atom) => match atom {
			Atom::Int(i) => Value::from(*i),
			Atom::Float(f) => Value::from(*f),
			Atom::Str(s) => Value::from(s.as_ref()),
			Atom::Bool(b) => Value::from(*b),
			Atom::Null => Value::Null,
			Atom::Bytes(b) => Value::Array(b.iter().map(|byte| Value::from(*byte)).collect()),
		},
		Term::Seq(items) => Value::Array(items.iter().map(term_to_value).collect()),
		Term::Cons(_, _) => match term.as_list() {
			Some(items) => Value::Array(items.iter().map(term_to_value).collect()),
			None => Value::Null,
		},
		Term::Record(fields) => Value::Object(
			fields
				.iter()
				.map(|(k, v)| (k.clone(), term_to_value(v)))
				.collect(),
		),
	}
}

/// A JSON value as a term. Arrays become sequences, objects become records.
pub fn term_from_value(value: &Value) -> Term {
	match value {
		Value::Null => Term::Atom(Atom::Null),
		Value::Bool(b) => Term::from(*b),
		Value::Number(n) => match n.as_i64() {
			Some(i) => Term::from(i),
			None => Term::from(n.as_f64().unwrap_or(f64::NAN)),
		},
		Value::String(s) => Term::from(s.as_str()),
		Value::Array(items) => Term::seq(items.iter().map(term_from_value)),
		Value::Object(fields) => {
			Term::record(fields.iter().map(|(k, v)| (k.clone(), term_from_value(v))))
		}
	}
}
