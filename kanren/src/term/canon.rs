use serde_json::{json, Value};

use super::{Atom, Term};

/// Canonical string form of a term.
///
/// Record keys serialize in lexicographic order, so two structurally equal terms
/// always produce the same string. Grouping and distinct-dedup key on this, which
/// makes their partitions depend only on the set of inputs, never arrival order.
pub fn canon(term: &Term) -> String {
	to_value(term).to_string()
}

/// Canonical JSON encoding, including non-JSON corners (vars, bytes, improper lists).
pub(crate) fn to_value(term: &Term) -> Value {
	match term {
		Term::Var(v) => json!({ "$var": v.id() }),
		Term::Nil => Value::Array(Vec::new()),
		Term::Atom(atom) => atom_value(atom),
		Term::Seq(items) => Value::Array(items.iter().map(to_value).collect()),
		Term::Record(fields) => Value::Object(
			fields
				.iter()
				.map(|(k, v)| (k.clone(), to_value(v)))
				.collect(),
		),
		Term::Cons(_, _) => match term.as_list() {
			Some(items) => Value::Array(items.iter().map(to_value).collect()),
			// Improper list: encode the cell so it cannot collide with an array.
			None => match term {
				Term::Cons(head, tail) => json!({ "$cons": [to_value(head), to_value(tail)] }),
				_ => unreachable!(),
			},
		},
	}
}

#[cfg(feature = "serde")]
impl serde::Serialize for Term {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		to_value(self).serialize(serializer)
	}
}

fn atom_value(atom: &Atom) -> Value {
	match atom {
		Atom::Int(i) => json!(i),
		Atom::Float(f) => json!(f),
		Atom::Str(s) => json!(s.as_ref()),
		Atom::Bool(b) => json!(b),
		Atom::Null => Value::Null,
		Atom::Bytes(b) => json!({ "$bytes": b.as_ref() }),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::term::Var;

	#[test]
	fn record_keys_are_ordered() {
		let a = Term::record([("b", 2i64), ("a", 1i64)]);
		let b = Term::record([("a", 1i64), ("b", 2i64)]);
		assert_eq!(canon(&a), canon(&b));
		assert_eq!(canon(&a), r#"{"a":1,"b":2}"#);
	}

	#[test]
	fn list_encodings_share_a_form() {
		assert_eq!(canon(&Term::list([1i64, 2])), canon(&Term::seq([1i64, 2])));
		assert_eq!(canon(&Term::Nil), "[]");
	}

	#[test]
	fn int_and_float_stay_distinct() {
		assert_ne!(canon(&Term::from(1i64)), canon(&Term::from(1.0)));
	}

	#[test]
	fn vars_key_on_identity() {
		let x = Var::fresh();
		let y = Var::fresh();
		assert_eq!(canon(&Term::from(&x)), canon(&Term::from(&x)));
		assert_ne!(canon(&Term::from(&x)), canon(&Term::from(&y)));
	}

	#[test]
	fn improper_list_does_not_collide_with_proper() {
		let x = Var::fresh();
		let improper = Term::cons(1i64, Term::from(&x));
		let proper = Term::list([1i64]);
		assert_ne!(canon(&improper), canon(&proper));
	}
}
