//! Coordinate and dependency resolution.
//!
//! When a delta is about to be recorded as a step, this module decides which
//! already-recorded steps on the same path it logically depends on, and
//! rewrites it relative to exactly that dependency set. The dependency set is
//! what makes later reordering safe: a step may only be swapped past steps
//! that are not in its transitive dependency set.

use std::collections::BTreeSet;

use stria_delta::{Delta, Op, Rope};
use tracing::trace;

use crate::id::StepId;
use crate::step::Step;

/// The kind of a touched character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordKind {
	/// Range produced by an insert operation.
	Insert,
	/// Range produced by a delete operation.
	Delete,
}

/// One character range touched by a delta.
///
/// Bounds are signed because the running index decreases past deletes and can
/// go below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinate {
	/// Start of the touched range.
	pub from: i64,
	/// End of the touched range.
	pub to: i64,
	/// Whether the range inserts or deletes.
	pub kind: CoordKind,
}

/// Computes the character ranges touched by a delta.
///
/// Scanning left to right with a running index: retains advance the index;
/// an insert contributes `{index, index + len}` and leaves the index where it
/// is (positions stay in base-document space); a delete contributes
/// `{index, index + count}` and then subtracts `count`, since deleted text no
/// longer occupies space going forward.
pub fn coordinates(delta: &Delta) -> Vec<Coordinate> {
	let mut index: i64 = 0;
	let mut out = Vec::new();

	for op in delta.ops() {
		match op {
			Op::Retain(n) => index += *n as i64,
			Op::Insert(ins) => {
				out.push(Coordinate {
					from: index,
					to: index + ins.char_len() as i64,
					kind: CoordKind::Insert,
				});
			}
			Op::Delete(n) => {
				out.push(Coordinate {
					from: index,
					to: index + *n as i64,
					kind: CoordKind::Delete,
				});
				index -= *n as i64;
			}
		}
	}

	out
}

/// Overlap test between a taken (already recorded) coordinate and a
/// candidate coordinate.
///
/// Two inserts overlap only when the candidate's insertion point falls
/// inside the taken range's half-open `[from, to)` interval, so a candidate
/// inserting exactly at the end of a prior insert stays independent; any
/// pair involving a delete overlaps on closed-interval intersection, so
/// exact endpoint touches count.
pub fn overlaps(taken: &Coordinate, candidate: &Coordinate) -> bool {
	match (taken.kind, candidate.kind) {
		(CoordKind::Insert, CoordKind::Insert) => {
			taken.from <= candidate.from && candidate.from < taken.to
		}
		_ => taken.to >= candidate.from && taken.from <= candidate.to,
	}
}

/// A candidate delta rewritten relative to its resolved dependency set.
#[derive(Debug, Clone)]
pub struct Resolution {
	/// Transitive dependencies, deduplicated, in application order.
	pub deps: Vec<StepId>,
	/// The delta as stored: relative to the composition of `deps`.
	pub delta: Delta,
	/// Inverse of `delta`, relative to the same base.
	pub delta_inverted: Delta,
}

/// Result of replaying a step sequence.
#[derive(Debug, Clone, Default)]
pub struct Replay {
	/// Composition of all replayed deltas, applicable to an empty document.
	pub composed: Delta,
	/// Each step's delta rebased into the replay state it was applied in.
	pub replayed: Vec<(StepId, Delta)>,
}

/// Replays steps in application order.
///
/// A step whose `deps` differ from what has been applied so far is pushed
/// forward through the replayed form of every dependency-excluded step, in
/// application order, re-deriving its delta as if it were being recorded
/// fresh against the current replay state.
pub fn replay<'a>(steps: impl IntoIterator<Item = &'a Step>) -> Replay {
	let mut out = Replay::default();

	for step in steps {
		let mut delta = step.delta.clone();
		for (id, replayed) in &out.replayed {
			if !step.deps.contains(id) {
				delta = replayed.transform(&delta);
			}
		}
		out.composed = std::mem::take(&mut out.composed).compose(delta.clone());
		out.replayed.push((step.id.clone(), delta));
	}

	out
}

/// Resolves a candidate delta (expressed against the current content of its
/// path) into its dependency set and stored form.
///
/// `applied` is every already-recorded content step for the path, in
/// application order.
pub fn resolve(applied: &[&Step], candidate: &Delta) -> Resolution {
	let mut deps: BTreeSet<StepId> = BTreeSet::new();

	// Walk priors from latest to earliest, keeping the candidate rebased
	// into the coordinate space that existed immediately after each prior
	// was applied: pulled back through every later non-dependency step's
	// inverse.
	let mut rebased = candidate.clone();
	for step in applied.iter().rev() {
		// A step already in the set through another step's closure stays a
		// dependency as-is; rebasing through its inverse would shift the
		// candidate out of the space the earlier overlap tests expect.
		let known = deps.contains(&step.id);
		let hit = known
			|| {
				let taken = coordinates(&step.delta);
				let ours = coordinates(&rebased);
				taken.iter().any(|t| ours.iter().any(|c| overlaps(t, c)))
			};

		if hit {
			deps.insert(step.id.clone());
			deps.extend(step.deps.iter().cloned());
		} else {
			rebased = step.delta_inverted.transform(&rebased);
		}
	}

	let dep_steps: Vec<&Step> = applied
		.iter()
		.filter(|s| deps.contains(&s.id))
		.copied()
		.collect();
	let base_composed = replay(dep_steps.iter().copied()).composed;
	let base = Rope::from_str(&base_composed.inserted_text());

	// Pull the candidate back through the non-dependency steps, in reverse
	// application order, so the stored delta is expressed against the
	// dependency-only base.
	let mut delta = candidate.clone();
	for step in applied.iter().rev() {
		if deps.contains(&step.id) {
			continue;
		}
		delta = invert_against(step, &base).transform(&delta);
	}

	let delta_inverted = safe_invert(&delta, &base);
	let ordered: Vec<StepId> = applied
		.iter()
		.filter(|s| deps.contains(&s.id))
		.map(|s| s.id.clone())
		.collect();

	trace!(deps = ordered.len(), "resolved candidate dependencies");

	Resolution {
		deps: ordered,
		delta,
		delta_inverted,
	}
}

/// Inverts a step relative to a given base, falling back to its stored
/// inverse when the base does not cover the step's delta.
fn invert_against(step: &Step, base: &Rope) -> Delta {
	if step.delta.base_len() <= base.len_chars() {
		step.delta.invert(base)
	} else {
		step.delta_inverted.clone()
	}
}

/// Inverts a delta relative to a base, yielding an identity inverse when the
/// base does not cover it rather than reading past the document.
fn safe_invert(delta: &Delta, base: &Rope) -> Delta {
	if delta.base_len() <= base.len_chars() {
		delta.invert(base)
	} else {
		Delta::new()
	}
}

/// Checks that every step's dependencies appear before it in the proposed
/// order, returning the first violation.
pub fn first_order_violation(ordered: &[&Step]) -> Option<(StepId, StepId)> {
	let mut seen: BTreeSet<&StepId> = BTreeSet::new();
	for step in ordered {
		for dep in &step.deps {
			if !seen.contains(dep) {
				return Some((step.id.clone(), dep.clone()));
			}
		}
		seen.insert(&step.id);
	}
	None
}
