use crate::goal::Goal;
use crate::stream::Observable;
use crate::term::{unify, walk_shallow, Subst, Term};

/// Destructure an object against a pattern.
///
/// The pattern is walked structurally: a var leaf unifies with the matching
/// part of the object, a record recurses per key (the object may carry extra
/// keys), a sequence recurses elementwise, and a literal must be equal. Any
/// mismatch drops the substitution.
pub fn extracto(obj: impl Into<Term>, pattern: impl Into<Term>) -> Goal {
	let obj = obj.into();
	let pattern = pattern.into();
	Goal::filter_map("extracto", move |s| extract_match(&obj, &pattern, s))
}

fn extract_match(obj: &Term, pattern: &Term, s: &Subst) -> Option<Subst> {
	let obj = walk_shallow(obj, s);
	let pattern = walk_shallow(pattern, s);

	match &pattern {
		Term::Record(wanted) => {
			let Term::Record(fields) = &obj else { return None };
			let mut cur = s.clone();
			for (key, sub_pattern) in wanted.iter() {
				let value = fields.get(key)?;
				cur = extract_match(value, sub_pattern, &cur)?;
			}
			Some(cur)
		}
		Term::Seq(_) | Term::Cons(_, _) | Term::Nil => {
			let wanted = pattern.as_list()?;
			let values = obj.as_list()?;
			if wanted.len() != values.len() {
				return None;
			}
			let mut cur = s.clone();
			for (value, sub_pattern) in values.iter().zip(wanted.iter()) {
				cur = extract_match(value, sub_pattern, &cur)?;
			}
			Some(cur)
		}
		// Var leaves bind, literals must agree.
		_ => unify(&pattern, &obj, s),
	}
}

/// Apply [`extracto`] to every element of a list, one emission per element that
/// matches.
///
/// The concrete prefix of the list is used; an unbound tail is left alone.
pub fn extract_eacho(list: impl Into<Term>, pattern: impl Into<Term>) -> Goal {
	let list = list.into();
	let pattern = pattern.into();
	Goal::branch("extract_eacho", move |s| {
		let pattern = pattern.clone();
		let s = s.clone();

		// Walk the spine up front; matching happens lazily per element.
		let mut elements = Vec::new();
		let mut cur = walk_shallow(&list, &s);
		loop {
			match &cur {
				Term::Cons(head, tail) => {
					elements.push(head.as_ref().clone());
					cur = walk_shallow(tail, &s);
				}
				Term::Seq(items) => {
					elements.extend(items.iter().cloned());
					break;
				}
				_ => break,
			}
		}

		Observable::new(move |emit| async move {
			for element in &elements {
				if let Some(next) = extract_match(element, &pattern, &s) {
					emit.send(next).await?;
				}
			}
			Ok(())
		})
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::term::{walk, Var};

	async fn solutions(goal: Goal) -> Vec<Subst> {
		goal.over(Subst::new()).subscribe().collect().await.unwrap()
	}

	fn person(name: &str, age: i64, city: &str) -> Term {
		Term::record([
			("name", Term::from(name)),
			("age", Term::from(age)),
			("address", Term::record([("city", Term::from(city))])),
		])
	}

	#[tokio::test]
	async fn binds_var_leaves() {
		let name = Var::fresh();
		let city = Var::fresh();

		let pattern = Term::record([
			("name", Term::from(&name)),
			("address", Term::record([("city", Term::from(&city))])),
		]);

		let results = solutions(extracto(person("ada", 36, "london"), pattern)).await;
		assert_eq!(results.len(), 1);
		assert_eq!(walk(&Term::from(&name), &results[0]), Term::from("ada"));
		assert_eq!(walk(&Term::from(&city), &results[0]), Term::from("london"));
	}

	#[tokio::test]
	async fn extra_object_keys_are_fine_but_missing_fail() {
		let name = Var::fresh();

		// The pattern only mentions name; age and address are ignored.
		let pattern = Term::record([("name", Term::from(&name))]);
		assert_eq!(solutions(extracto(person("ada", 36, "london"), pattern)).await.len(), 1);

		// A key the object lacks fails.
		let missing = Term::record([("email", Term::from(&name))]);
		assert!(solutions(extracto(person("ada", 36, "london"), missing)).await.is_empty());
	}

	#[tokio::test]
	async fn literal_leaves_require_equality() {
		let pattern = Term::record([("age", Term::from(36i64))]);
		assert_eq!(solutions(extracto(person("ada", 36, "x"), pattern.clone())).await.len(), 1);
		assert!(solutions(extracto(person("bob", 37, "x"), pattern)).await.is_empty());
	}

	#[tokio::test]
	async fn sequences_recurse_elementwise() {
		let x = Var::fresh();
		let obj = Term::record([("pair", Term::seq([Term::from(1i64), Term::from(2i64)]))]);
		let pattern = Term::record([("pair", Term::seq([Term::from(1i64), Term::from(&x)]))]);

		let results = solutions(extracto(obj, pattern)).await;
		assert_eq!(walk(&Term::from(&x), &results[0]), Term::from(2i64));

		let obj = Term::record([("pair", Term::seq([Term::from(1i64)]))]);
		let pattern = Term::record([("pair", Term::seq([Term::from(1i64), Term::from(2i64)]))]);
		assert!(solutions(extracto(obj, pattern)).await.is_empty());
	}

	#[tokio::test]
	async fn extract_each_emits_per_match() {
		let name = Var::fresh();
		let list = Term::list([
			person("ada", 36, "london"),
			Term::record([("other", Term::from(1i64))]),
			person("bob", 41, "paris"),
		]);

		let pattern = Term::record([("name", Term::from(&name))]);
		let results = solutions(extract_eacho(list, pattern)).await;
		assert_eq!(results.len(), 2);
		assert_eq!(walk(&Term::from(&name), &results[0]), Term::from("ada"));
		assert_eq!(walk(&Term::from(&name), &results[1]), Term::from("bob"));
	}
}
