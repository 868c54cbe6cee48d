//! Ordered, reorderable edit history.
//!
//! Raw text edits become named [`Step`]s, each carrying a minimal
//! [`Delta`](stria_delta::Delta) plus the set of prior steps that delta is
//! expressed relative to. The dependency set is what makes out-of-order
//! replay and validated reordering possible: content can be reconstructed at
//! any step, and a step can be swapped past exactly the steps it does not
//! depend on.
//!
//! The engine is synchronous and single-threaded; every mutation of the
//! [`StepStore`] commits a whole new snapshot or nothing.

/// Error types.
mod error;
/// Step id generation.
mod id;
/// Editor-surface keystroke folding.
mod intake;
/// Coordinate scan, overlap rules, and dependency resolution.
mod resolver;
/// Step and highlight types.
mod step;
/// The step store and content reconstruction.
mod store;
/// Persisted record shapes and batching.
mod wire;

#[cfg(test)]
mod tests;

pub use error::StepError;
pub use id::{StepId, StepIdGen};
pub use intake::{ContentChange, fold_content_changes};
pub use resolver::{CoordKind, Coordinate, coordinates, overlaps};
pub use step::{FileStatus, Highlight, Step};
pub use store::{SaveDelta, StepStore};
pub use wire::{
	CommentRecord, FieldViolation, MAX_BATCH, RecordError, StepRecord, batches, decode_record,
	decode_steps, encode_step,
};
