//! # kanren-lite: relational logic programming over lazy streams
//!
//! `kanren-lite` is an embeddable logic-programming engine in the miniKanren
//! family, built for composition with async data sources.
//!
//! ## Overview
//!
//! The engine is organized around three ideas:
//! - **Terms and substitutions**: a tagged term tree (vars, atoms, lists,
//!   sequences, records) bound through immutable substitutions by structural
//!   unification with an occurs check.
//! - **Goals as stream transforms**: every combinator maps a cold stream of
//!   substitutions to another one. Conjunction chains goals, disjunction
//!   multicasts and merges, aggregation folds a whole stream or a whole
//!   subgoal run. Everything is lazy and cancellation is drop-driven.
//! - **Suspended constraints**: arithmetic and comparisons that cannot decide
//!   yet park themselves on the substitution and wake when a watched var is
//!   bound, so goal order stops mattering for them.
//!
//! While designed as the engine behind a query facade, every layer is public:
//! external relations are just values of [`Goal`].

mod aggregate;
mod error;
mod goal;
mod group;
mod project;
mod query;
mod relation;
mod stream;
mod term;

pub use aggregate::*;
pub use error::*;
pub use goal::*;
pub use group::*;
pub use project::*;
pub use query::*;
pub use relation::*;
pub use stream::*;
pub use term::*;
