use std::collections::BTreeMap;
use std::fmt;

use crate::term::Term;

/// One projected result of a query: selected names mapped to resolved terms.
///
/// Terms in a row are deeply normalized: cons-lists become sequences, all the
/// way down. Anything still unbound projects as the var itself.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Row(BTreeMap<String, Term>);

impl Row {
	pub(crate) fn new(fields: BTreeMap<String, Term>) -> Self {
		Self(fields)
	}

	pub fn get(&self, name: &str) -> Option<&Term> {
		self.0.get(name)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn into_inner(self) -> BTreeMap<String, Term> {
		self.0
	}
}

impl fmt::Display for Row {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{{")?;
		for (i, (key, value)) in self.0.iter().enumerate() {
			if i > 0 {
				write!(f, ", ")?;
			}
			write!(f, "{}: {}", key, value)?;
		}
		write!(f, "}}")
	}
}

#[cfg(feature = "serde")]
impl serde::Serialize for Row {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_map(self.0.iter().map(|(k, v)| (k, crate::term::to_value(v))))
	}
}

/// Normalize the two list encodings down to sequences, recursively.
pub(crate) fn normalize(term: &Term) -> Term {
	match term {
		Term::Nil => Term::seq([] as [Term; 0]),
		Term::Cons(head, tail) => match term.as_list() {
			Some(items) => Term::seq(items.iter().map(normalize)),
			// Improper lists keep their cell structure.
			None => Term::Cons(normalize(head).into(), normalize(tail).into()),
		},
		Term::Seq(items) => Term::seq(items.iter().map(normalize)),
		Term::Record(fields) => {
			Term::record(fields.iter().map(|(k, v)| (k.clone(), normalize(v))))
		}
		leaf => leaf.clone(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::term::Var;

	#[test]
	fn normalize_flattens_cons_lists() {
		let nested = Term::list([Term::list([1i64, 2]), Term::from(3i64)]);
		let normal = normalize(&nested);
		assert_eq!(
			normal,
			Term::seq([Term::seq([1i64, 2]), Term::from(3i64)])
		);
	}

	#[test]
	fn normalize_keeps_improper_cells() {
		let x = Var::fresh();
		let improper = Term::cons(1i64, Term::from(&x));
		assert_eq!(normalize(&improper), improper);
	}

	#[test]
	fn normalize_descends_into_records() {
		let t = Term::record([("xs", Term::list([1i64]))]);
		assert_eq!(normalize(&t), Term::record([("xs", Term::seq([1i64]))]));
	}
}
