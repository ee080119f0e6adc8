//! A three-house zebra-style puzzle.
//!
//! Each house is a `[nation, color, pet]` triple. The clues:
//!
//! 1. The Dane lives in the first house.
//! 2. The Dane's house is blue.
//! 3. The Brit lives in the red house.
//! 4. The Swede keeps the dog.
//! 5. The Dane keeps the cat.
//! 6. The red house is the last house.
//!
//! Question: who owns the fish?

use kanren_lite::{all, eq, membero, permuteo, Query, Term, Var, Vars};

fn house(nation: impl Into<Term>, color: impl Into<Term>, pet: impl Into<Term>) -> Term {
	Term::seq([nation.into(), color.into(), pet.into()])
}

fn houses(v: &Vars) -> Term {
	Term::seq([
		house(v.get("n1"), v.get("c1"), v.get("p1")),
		house(v.get("n2"), v.get("c2"), v.get("p2")),
		house(v.get("n3"), v.get("c3"), v.get("p3")),
	])
}

pub fn query() -> Query {
	Query::new()
		.where_(|v| {
			all([
				// Every attribute ranges over its own domain, once each.
				permuteo(
					Term::seq([v.get("n1"), v.get("n2"), v.get("n3")].map(Term::from)),
					Term::seq(["dane", "brit", "swede"]),
				),
				permuteo(
					Term::seq([v.get("c1"), v.get("c2"), v.get("c3")].map(Term::from)),
					Term::seq(["red", "green", "blue"]),
				),
				permuteo(
					Term::seq([v.get("p1"), v.get("p2"), v.get("p3")].map(Term::from)),
					Term::seq(["cat", "dog", "fish"]),
				),
			])
		})
		.where_(|v| eq(v.get("n1"), "dane"))
		.where_(|v| eq(v.get("c1"), "blue"))
		.where_(|v| eq(v.get("c3"), "red"))
		.where_(|v| membero(house("brit", "red", Var::fresh()), houses(v)))
		.where_(|v| membero(house("swede", Var::fresh(), "dog"), houses(v)))
		.where_(|v| membero(house("dane", Var::fresh(), "cat"), houses(v)))
		.where_(|v| membero(house(v.get("owner"), Var::fresh(), "fish"), houses(v)))
		.select(["owner"])
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn the_brit_owns_the_fish() {
		let rows = query().fetch_all().await.unwrap();
		assert_eq!(rows.len(), 1, "the puzzle has a unique solution");
		assert_eq!(rows[0].get("owner"), Some(&Term::from("brit")));
	}
}
