//! Error types for step history operations.

use thiserror::Error;

use crate::id::StepId;

/// Errors surfaced by the step store.
///
/// Every failing operation leaves the in-memory history untouched; mutation
/// commits a whole new snapshot or nothing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepError {
	/// A reorder tried to move a step past one of its own dependencies.
	/// Non-fatal: callers fall back to a raw positional update.
	#[error("cannot move step {step} past its dependency {dependency}")]
	InvalidReorder {
		/// The step that would end up before a step it depends on.
		step: StepId,
		/// The violated dependency.
		dependency: StepId,
	},

	/// A step id was looked up that is not in the store.
	#[error("unknown step id {0}")]
	UnknownStep(StepId),

	/// A path was looked up that has no recorded steps.
	#[error("no steps recorded for path {0:?}")]
	UnknownPath(String),

	/// A delete targeted a step that is neither the most recent committed
	/// step for its file nor a pure-highlight step.
	#[error("step {0} is not deletable")]
	NotDeletable(StepId),
}
