use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use super::Var;

/// A ground value.
#[derive(Clone, Debug, PartialEq, derive_more::From)]
pub enum Atom {
	#[from]
	Int(i64),
	#[from]
	Float(f64),
	Str(Arc<str>),
	#[from]
	Bool(bool),
	Null,
	/// An opaque host payload. Never interpreted, compared by byte equality.
	#[from]
	Bytes(Bytes),
}

impl Atom {
	/// Numeric view, widening ints. None for non-numbers.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Atom::Int(i) => Some(*i as f64),
			Atom::Float(f) => Some(*f),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Atom::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Atom::Str(s) => Some(s),
			_ => None,
		}
	}
}

impl From<&str> for Atom {
	fn from(s: &str) -> Self {
		Atom::Str(s.into())
	}
}

impl From<String> for Atom {
	fn from(s: String) -> Self {
		Atom::Str(s.into())
	}
}

impl fmt::Display for Atom {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Atom::Int(i) => write!(f, "{}", i),
			Atom::Float(x) => write!(f, "{}", x),
			Atom::Str(s) => write!(f, "{:?}", s),
			Atom::Bool(b) => write!(f, "{}", b),
			Atom::Null => write!(f, "null"),
			Atom::Bytes(b) => write!(f, "#{}b", b.len()),
		}
	}
}

/// A value in the logic universe.
///
/// Composite children are reference counted, so cloning a term is cheap and
/// substitutions can share structure freely.
///
/// Logic lists have two encodings: the `Nil`/`Cons` spine and the fixed-arity
/// `Seq`. Unification and every list relation accept both interchangeably; the
/// query facade normalizes to `Seq` when projecting results.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
	Var(Var),
	Nil,
	Cons(Arc<Term>, Arc<Term>),
	Atom(Atom),
	Seq(Arc<Vec<Term>>),
	Record(Arc<BTreeMap<String, Term>>),
}

impl Term {
	/// Build a cons-list ending in `Nil`.
	pub fn list<I>(items: I) -> Term
	where
		I: IntoIterator,
		I::Item: Into<Term>,
		I::IntoIter: DoubleEndedIterator,
	{
		let mut tail = Term::Nil;
		for item in items.into_iter().rev() {
			tail = Term::cons(item.into(), tail);
		}
		tail
	}

	/// A single cons cell.
	pub fn cons(head: impl Into<Term>, tail: impl Into<Term>) -> Term {
		Term::Cons(Arc::new(head.into()), Arc::new(tail.into()))
	}

	/// Build a fixed-arity sequence.
	pub fn seq<I>(items: I) -> Term
	where
		I: IntoIterator,
		I::Item: Into<Term>,
	{
		Term::Seq(Arc::new(items.into_iter().map(Into::into).collect()))
	}

	/// Build a record from key/value pairs.
	pub fn record<K, V, I>(pairs: I) -> Term
	where
		K: Into<String>,
		V: Into<Term>,
		I: IntoIterator<Item = (K, V)>,
	{
		Term::Record(Arc::new(
			pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
		))
	}

	pub fn is_var(&self) -> bool {
		matches!(self, Term::Var(_))
	}

	pub fn as_var(&self) -> Option<&Var> {
		match self {
			Term::Var(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_atom(&self) -> Option<&Atom> {
		match self {
			Term::Atom(a) => Some(a),
			_ => None,
		}
	}

	/// Syntactically ground: no var anywhere in the tree.
	pub fn is_ground(&self) -> bool {
		match self {
			Term::Var(_) => false,
			Term::Nil | Term::Atom(_) => true,
			Term::Cons(head, tail) => head.is_ground() && tail.is_ground(),
			Term::Seq(items) => items.iter().all(Term::is_ground),
			Term::Record(fields) => fields.values().all(Term::is_ground),
		}
	}

	/// Collect every var id in the tree.
	pub fn var_ids(&self, out: &mut BTreeSet<u64>) {
		match self {
			Term::Var(v) => {
				out.insert(v.id());
			}
			Term::Nil | Term::Atom(_) => {}
			Term::Cons(head, tail) => {
				head.var_ids(out);
				tail.var_ids(out);
			}
			Term::Seq(items) => {
				for item in items.iter() {
					item.var_ids(out);
				}
			}
			Term::Record(fields) => {
				for value in fields.values() {
					value.var_ids(out);
				}
			}
		}
	}

	/// View a proper list (either encoding) as a slice of elements.
	///
	/// Returns None for improper lists, var tails, and non-lists.
	pub fn as_list(&self) -> Option<Vec<Term>> {
		match self {
			Term::Nil => Some(Vec::new()),
			Term::Seq(items) => Some(items.as_ref().clone()),
			Term::Cons(_, _) => {
				let mut items = Vec::new();
				let mut cur = self.clone();
				loop {
					match cur {
						Term::Cons(head, tail) => {
							items.push(head.as_ref().clone());
							cur = tail.as_ref().clone();
						}
						Term::Nil => return Some(items),
						Term::Seq(rest) => {
							items.extend(rest.iter().cloned());
							return Some(items);
						}
						_ => return None,
					}
				}
			}
			_ => None,
		}
	}
}

impl From<Var> for Term {
	fn from(v: Var) -> Self {
		Term::Var(v)
	}
}

impl From<&Var> for Term {
	fn from(v: &Var) -> Self {
		Term::Var(v.clone())
	}
}

impl From<Atom> for Term {
	fn from(a: Atom) -> Self {
		Term::Atom(a)
	}
}

impl From<i64> for Term {
	fn from(v: i64) -> Self {
		Term::Atom(Atom::Int(v))
	}
}

impl From<f64> for Term {
	fn from(v: f64) -> Self {
		Term::Atom(Atom::Float(v))
	}
}

impl From<bool> for Term {
	fn from(v: bool) -> Self {
		Term::Atom(Atom::Bool(v))
	}
}

impl From<&str> for Term {
	fn from(v: &str) -> Self {
		Term::Atom(v.into())
	}
}

impl From<String> for Term {
	fn from(v: String) -> Self {
		Term::Atom(v.into())
	}
}

impl From<Bytes> for Term {
	fn from(v: Bytes) -> Self {
		Term::Atom(Atom::Bytes(v))
	}
}

impl From<Vec<Term>> for Term {
	fn from(items: Vec<Term>) -> Self {
		Term::Seq(Arc::new(items))
	}
}

impl From<&Term> for Term {
	fn from(t: &Term) -> Self {
		t.clone()
	}
}

impl fmt::Display for Term {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Term::Var(v) => write!(f, "{}", v),
			Term::Nil => write!(f, "()"),
			Term::Atom(a) => write!(f, "{}", a),
			Term::Cons(head, tail) => {
				write!(f, "({}", head)?;
				let mut cur = tail.as_ref();
				loop {
					match cur {
						Term::Cons(h, t) => {
							write!(f, " {}", h)?;
							cur = t.as_ref();
						}
						Term::Nil => break,
						other => {
							write!(f, " . {}", other)?;
							break;
						}
					}
				}
				write!(f, ")")
			}
			Term::Seq(items) => {
				write!(f, "[")?;
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{}", item)?;
				}
				write!(f, "]")
			}
			Term::Record(fields) => {
				write!(f, "{{")?;
				for (i, (key, value)) in fields.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{}: {}", key, value)?;
				}
				write!(f, "}}")
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn list_builds_cons_spine() {
		let list = Term::list([1i64, 2, 3]);
		assert_eq!(
			list,
			Term::cons(1i64, Term::cons(2i64, Term::cons(3i64, Term::Nil)))
		);
		assert_eq!(list.as_list().unwrap().len(), 3);
	}

	#[test]
	fn as_list_accepts_both_encodings() {
		let cons = Term::list(["a", "b"]);
		let seq = Term::seq(["a", "b"]);
		assert_eq!(cons.as_list(), seq.as_list());

		// A cons prefix over a seq tail is still a proper list.
		let mixed = Term::cons("a", Term::seq(["b"]));
		assert_eq!(mixed.as_list(), seq.as_list());
	}

	#[test]
	fn as_list_rejects_var_tails() {
		let improper = Term::cons("a", Var::fresh());
		assert!(improper.as_list().is_none());
	}

	#[test]
	fn ground_and_vars() {
		let x = Var::fresh();
		let t = Term::seq([Term::from(1i64), Term::from(&x)]);
		assert!(!t.is_ground());

		let mut ids = BTreeSet::new();
		t.var_ids(&mut ids);
		assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![x.id()]);

		assert!(Term::list([1i64, 2]).is_ground());
	}

	#[test]
	fn atoms_of_different_kind_differ() {
		assert_ne!(Term::from(1i64), Term::from(1.0));
		assert_ne!(Term::from("1"), Term::from(1i64));
	}

	#[test]
	fn display_reads_naturally() {
		let x = Var::named("x");
		let t = Term::record([("k", Term::list([Term::from(1i64), Term::from(&x)]))]);
		assert_eq!(format!("{}", t), format!("{{k: (1 _x.{})}}", x.id()));
	}
}
