use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::goal::{eq, Goal};
use crate::stream::{Emitter, Observable};
use crate::term::{canon, suspendable, unify, walk, walk_shallow, Check, Resumed, Subst, Term, Var};
use crate::Result;

/// One step of a list spine, abstracting over the two encodings.
enum Spine {
	Empty,
	Split(Term, Term),
	Unbound(Term),
	NotAList,
}

/// Decompose a shallow-walked term as a list.
fn split(term: &Term) -> Spine {
	match term {
		Term::Nil => Spine::Empty,
		Term::Cons(head, tail) => Spine::Split(head.as_ref().clone(), tail.as_ref().clone()),
		Term::Seq(items) => match items.split_first() {
			None => Spine::Empty,
			Some((head, rest)) => Spine::Split(head.clone(), Term::seq(rest.to_vec())),
		},
		Term::Var(_) => Spine::Unbound(term.clone()),
		_ => Spine::NotAList,
	}
}

/// `list` is the cons of `head` onto `tail`.
pub fn conso(head: impl Into<Term>, tail: impl Into<Term>, list: impl Into<Term>) -> Goal {
	eq(Term::cons(head, tail), list)
}

/// `head` is the first element of `list`.
pub fn firsto(list: impl Into<Term>, head: impl Into<Term>) -> Goal {
	conso(head, Var::fresh(), list)
}

/// `tail` is `list` without its first element.
pub fn resto(list: impl Into<Term>, tail: impl Into<Term>) -> Goal {
	conso(Var::fresh(), tail, list)
}

/// `x` is a member of `list`, one answer per element.
///
/// An unbound tail is enumerated: the list is extended one fresh cell at a
/// time, producing an unbounded answer stream paced by downstream demand.
pub fn membero(x: impl Into<Term>, list: impl Into<Term>) -> Goal {
	let x = x.into();
	let list = list.into();
	Goal::branch("membero", move |s| {
		let x = x.clone();
		let list = list.clone();
		let s = s.clone();
		Observable::new(move |emit| async move {
			let mut base = s;
			let mut cur = list;
			loop {
				match split(&walk_shallow(&cur, &base)) {
					Spine::Split(head, tail) => {
						if let Some(ans) = unify(&x, &head, &base) {
							emit.send(ans).await?;
						}
						cur = tail;
					}
					Spine::Unbound(spot) => {
						// x as the next element.
						let beyond = Var::fresh();
						if let Some(ans) = unify(&spot, &Term::cons(x.clone(), &beyond), &base) {
							emit.send(ans).await?;
						}
						// Or some other element, and x further down.
						let head = Var::fresh();
						let tail = Var::fresh();
						match unify(&spot, &Term::cons(&head, &tail), &base) {
							Some(next) => base = next,
							None => return Ok(()),
						}
						cur = Term::from(&tail);
					}
					Spine::Empty | Spine::NotAList => return Ok(()),
				}
			}
		})
	})
}

/// `ab` is `a` appended with `b`.
pub fn appendo(a: impl Into<Term>, b: impl Into<Term>, ab: impl Into<Term>) -> Goal {
	let a = a.into();
	let b = b.into();
	let ab = ab.into();
	Goal::branch("appendo", move |s| {
		let a = a.clone();
		let b = b.clone();
		let ab = ab.clone();
		let s = s.clone();
		Observable::new(move |emit| async move { append_into(a, b, ab, s, &emit).await })
	})
}

fn append_into<'a>(
	a: Term,
	b: Term,
	ab: Term,
	base: Subst,
	emit: &'a Emitter<Subst>,
) -> BoxFuture<'a, Result<()>> {
	async move {
		match split(&walk_shallow(&a, &base)) {
			Spine::Empty => {
				if let Some(ans) = unify(&b, &ab, &base) {
					emit.send(ans).await?;
				}
				Ok(())
			}
			Spine::Split(head, tail) => {
				let rest = Var::fresh();
				match unify(&ab, &Term::cons(&head, &rest), &base) {
					Some(next) => append_into(tail, b, Term::from(&rest), next, emit).await,
					None => Ok(()),
				}
			}
			Spine::Unbound(spot) => {
				// Shortest split first: a empty, then a growing one cell per answer.
				if let Some(empty) = unify(&spot, &Term::Nil, &base) {
					if let Some(ans) = unify(&b, &ab, &empty) {
						emit.send(ans).await?;
					}
				}

				let head = Var::fresh();
				let tail = Var::fresh();
				let rest = Var::fresh();
				if let Some(grown) = unify(&spot, &Term::cons(&head, &tail), &base) {
					if let Some(matched) = unify(&ab, &Term::cons(&head, &rest), &grown) {
						append_into(Term::from(&tail), b, Term::from(&rest), matched, emit).await?;
					}
				}
				Ok(())
			}
			Spine::NotAList => Ok(()),
		}
	}
	.boxed()
}

/// `n` is the length of `list`.
///
/// With a ground length and an unbound tail, the list is padded with fresh
/// vars; with both unbound, lengths are enumerated on demand.
pub fn lengtho(list: impl Into<Term>, n: impl Into<Term>) -> Goal {
	let list = list.into();
	let n = n.into();
	Goal::branch("lengtho", move |s| {
		let list = list.clone();
		let n = n.clone();
		let s = s.clone();
		Observable::new(move |emit| async move {
			let base = s;
			let mut count: i64 = 0;
			let mut cur = list;
			let spot = loop {
				match split(&walk_shallow(&cur, &base)) {
					Spine::Split(_, tail) => {
						count += 1;
						cur = tail;
					}
					Spine::Empty => {
						if let Some(ans) = unify(&n, &Term::from(count), &base) {
							emit.send(ans).await?;
						}
						return Ok(());
					}
					Spine::Unbound(spot) => break spot,
					Spine::NotAList => return Ok(()),
				}
			};

			// A concrete prefix of `count` cells ends in an unbound tail.
			match walk_shallow(&n, &base) {
				Term::Atom(crate::term::Atom::Int(k)) => {
					if k < count {
						return Ok(());
					}
					let padding = Term::list((count..k).map(|_| Term::from(Var::fresh())));
					if let Some(ans) = unify(&spot, &padding, &base) {
						emit.send(ans).await?;
					}
					Ok(())
				}
				Term::Var(_) => {
					let mut base = base;
					let mut cur = spot;
					let mut len = count;
					loop {
						if let Some(closed) = unify(&cur, &Term::Nil, &base) {
							if let Some(ans) = unify(&n, &Term::from(len), &closed) {
								emit.send(ans).await?;
							}
						}
						let head = Var::fresh();
						let tail = Var::fresh();
						match unify(&cur, &Term::cons(&head, &tail), &base) {
							Some(next) => base = next,
							None => return Ok(()),
						}
						cur = Term::from(&tail);
						len += 1;
					}
				}
				_ => Ok(()),
			}
		})
	})
}

/// `b` is a permutation of `a`.
///
/// At least one side must have a known list shape; the other is unified against
/// each permutation in turn.
pub fn permuteo(a: impl Into<Term>, b: impl Into<Term>) -> Goal {
	let a = a.into();
	let b = b.into();
	Goal::branch("permuteo", move |s| {
		let a = a.clone();
		let b = b.clone();
		let s = s.clone();
		Observable::new(move |emit| async move {
			let (items, target) = match walk(&a, &s).as_list() {
				Some(items) => (items, b),
				None => match walk(&b, &s).as_list() {
					Some(items) => (items, a),
					None => return Ok(()),
				},
			};
			permute_into(items, Vec::new(), target, s, &emit).await
		})
	})
}

fn permute_into<'a>(
	remaining: Vec<Term>,
	chosen: Vec<Term>,
	target: Term,
	base: Subst,
	emit: &'a Emitter<Subst>,
) -> BoxFuture<'a, Result<()>> {
	async move {
		if remaining.is_empty() {
			if let Some(ans) = unify(&target, &Term::seq(chosen), &base) {
				emit.send(ans).await?;
			}
			return Ok(());
		}

		for i in 0..remaining.len() {
			let mut rest = remaining.clone();
			let picked = rest.remove(i);
			let mut chosen = chosen.clone();
			chosen.push(picked);
			permute_into(rest, chosen, target.clone(), base.clone(), emit).await?;
		}
		Ok(())
	}
	.boxed()
}

/// Apply a binary relation pointwise: `rel(a[i], b[i])` for every index.
///
/// Drives from whichever side has a known spine and mirrors its shape onto the
/// other with fresh cells.
pub fn mapo<F>(rel: F, a: impl Into<Term>, b: impl Into<Term>) -> Goal
where
	F: Fn(Term, Term) -> Goal + Send + Sync + 'static,
{
	let rel: Arc<dyn Fn(Term, Term) -> Goal + Send + Sync> = Arc::new(rel);
	let a = a.into();
	let b = b.into();
	Goal::branch("mapo", move |s| {
		let rel = rel.clone();
		let a = a.clone();
		let b = b.clone();
		let s = s.clone();
		Observable::new(move |emit| async move { map_into(rel, a, b, s, &emit).await })
	})
}

fn map_into<'a>(
	rel: Arc<dyn Fn(Term, Term) -> Goal + Send + Sync>,
	a: Term,
	b: Term,
	base: Subst,
	emit: &'a Emitter<Subst>,
) -> BoxFuture<'a, Result<()>> {
	async move {
		let (drive_a, head_a, tail_a) = match split(&walk_shallow(&a, &base)) {
			Spine::Split(head, tail) => (true, head, tail),
			Spine::Empty => {
				if let Some(ans) = unify(&b, &Term::Nil, &base) {
					emit.send(ans).await?;
				}
				return Ok(());
			}
			Spine::Unbound(_) => match split(&walk_shallow(&b, &base)) {
				Spine::Split(head, tail) => (false, head, tail),
				Spine::Empty => {
					if let Some(ans) = unify(&a, &Term::Nil, &base) {
						emit.send(ans).await?;
					}
					return Ok(());
				}
				_ => return Ok(()),
			},
			Spine::NotAList => return Ok(()),
		};

		// Mirror one cell onto the passive side.
		let other_head = Var::fresh();
		let other_tail = Var::fresh();
		let (passive, ha, ta, hb, tb) = if drive_a {
			(&b, head_a.clone(), tail_a.clone(), Term::from(&other_head), Term::from(&other_tail))
		} else {
			(&a, Term::from(&other_head), Term::from(&other_tail), head_a.clone(), tail_a.clone())
		};

		let mirrored = match unify(passive, &Term::cons(&other_head, &other_tail), &base) {
			Some(next) => next,
			None => return Ok(()),
		};

		let mut answers = rel(ha, hb).over(mirrored).subscribe();
		while let Some(next) = answers.next().await? {
			map_into(rel.clone(), ta.clone(), tb.clone(), next, emit).await?;
		}
		Ok(())
	}
	.boxed()
}

/// `out` is `list` with the first occurrence of `x` removed.
///
/// Relational: one answer per position whose element unifies with `x`, plus the
/// keep-the-head alternatives, in standard rembero fashion.
pub fn remove_firsto(x: impl Into<Term>, list: impl Into<Term>, out: impl Into<Term>) -> Goal {
	let x = x.into();
	let list = list.into();
	let out = out.into();
	Goal::branch("remove_firsto", move |s| {
		let x = x.clone();
		let list = list.clone();
		let out = out.clone();
		let s = s.clone();
		Observable::new(move |emit| async move { remove_into(x, list, out, s, &emit).await })
	})
}

fn remove_into<'a>(
	x: Term,
	list: Term,
	out: Term,
	base: Subst,
	emit: &'a Emitter<Subst>,
) -> BoxFuture<'a, Result<()>> {
	async move {
		match split(&walk_shallow(&list, &base)) {
			Spine::Split(head, tail) => {
				// Remove the head here.
				if let Some(matched) = unify(&x, &head, &base) {
					if let Some(ans) = unify(&out, &tail, &matched) {
						emit.send(ans).await?;
					}
				}
				// Or keep it and remove further down.
				let rest = Var::fresh();
				if let Some(kept) = unify(&out, &Term::cons(&head, &rest), &base) {
					remove_into(x, tail, Term::from(&rest), kept, emit).await?;
				}
				Ok(())
			}
			_ => Ok(()),
		}
	}
	.boxed()
}

/// Every element of `list` is distinct (by canonical form).
///
/// Suspends until the list is fully ground.
pub fn alldistincto(list: impl Into<Term>) -> Goal {
	let check: Check = Arc::new(|walked: &[Term], s: &Subst| {
		let list = &walked[0];
		if !list.is_ground() {
			return Resumed::Later;
		}
		match list.as_list() {
			Some(items) => {
				let mut seen = BTreeSet::new();
				if items.iter().all(|item| seen.insert(canon(item))) {
					Resumed::Unified(s.clone())
				} else {
					Resumed::Fail
				}
			}
			None => Resumed::Fail,
		}
	});
	suspendable("alldistincto", vec![list.into()], 0, check)
}
