//! Step and highlight types.

use serde::{Deserialize, Serialize};
use stria_delta::Delta;

use crate::id::StepId;

/// How a step left its file relative to the file existing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
	/// The file did not exist before this history.
	Added,
	/// The file existed and was changed.
	Modified,
	/// The file was removed.
	Deleted,
}

/// A selection range attached to a step. Informational only; it never
/// affects content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
	/// Character offset of the selection start.
	pub offset: usize,
	/// Selection length in characters.
	pub length: usize,
}

/// One recorded, identified edit applied to a file.
///
/// `delta` and `delta_inverted` are expressed relative to the content that
/// existed immediately before this step in the *dependency-resolved* history:
/// the composition of exactly the steps in `deps`, not necessarily the
/// immediately preceding step in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
	/// Monotonic, lexicographically sortable identifier.
	pub id: StepId,
	/// Target file path.
	pub path: String,
	/// The forward change.
	pub delta: Delta,
	/// The inverse of `delta`, relative to the same base.
	pub delta_inverted: Delta,
	/// Prior step ids this delta is expressed relative to, transitive,
	/// deduplicated, sorted by application order.
	pub deps: Vec<StepId>,
	/// True while the step is still open for coalescing further edits.
	pub is_draft: bool,
	/// True for the synthetic bootstrap step seeding a file's original
	/// content into the history.
	pub is_file_dep_change: bool,
	/// Selection ranges attached to the step.
	pub highlight: Vec<Highlight>,
	/// Reviewer note attached to the step, if any.
	pub comment: Option<String>,
	/// `[insertedChars, deletedChars]`, derived from `delta`.
	pub stat: (usize, usize),
	/// Whether the file existed before/after this history.
	pub file_status: FileStatus,
	/// UI flag persisted with the step.
	pub preview_opened: bool,
}

impl Step {
	/// Returns true if this step carries no content change at all.
	pub fn is_content_neutral(&self) -> bool {
		self.delta.is_identity()
	}

	/// Returns true if this step only exists to carry a highlight.
	pub fn is_pure_highlight(&self) -> bool {
		self.is_content_neutral() && !self.highlight.is_empty()
	}
}
