//! Marker and preview types.

use serde::{Deserialize, Serialize};
use stria_delta::Delta;

/// The kind of edit a marker proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerOp {
	/// Text is added at a position.
	Insert,
	/// Text is removed.
	Delete,
	/// Text is removed and replaced in place.
	Replace,
}

/// A run of pure indentation, measured in tab units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndentRun {
	/// Number of repeated tab units in the run.
	pub units: usize,
}

/// How a preview fragment relates to the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
	/// Unchanged surrounding text.
	Context,
	/// Text the marker removes.
	Delete,
	/// Text the marker inserts.
	Insert,
}

/// A per-character-flagged slice of one displayed preview line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewFragment {
	/// The fragment text (no line terminator).
	pub text: String,
	/// Whether this fragment is context, deleted, or inserted.
	pub kind: FragmentKind,
}

/// One displayed source line of a marker preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewLine {
	/// Fragments making up the line, in order.
	pub fragments: Vec<PreviewFragment>,
}

impl PreviewLine {
	/// Returns true if any fragment is a delete or insert.
	pub fn has_edit(&self) -> bool {
		self.fragments
			.iter()
			.any(|f| f.kind != FragmentKind::Context)
	}
}

/// A single semantic edit candidate between two whole-file versions.
///
/// The delta is expressed against the modified (working) text; applying it
/// moves that region of the file toward the original (goal) text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffMarker {
	/// Sequential id within one extraction.
	pub id: u64,
	/// The kind of edit proposed.
	pub operation: MarkerOp,
	/// Character offset into the original (goal) text.
	pub original_offset: usize,
	/// Character offset into the modified (working) text.
	pub modified_offset: usize,
	/// Characters affected: deleted span length for delete/replace,
	/// inserted length for insert.
	pub length: usize,
	/// Text removed from the modified version.
	pub old_value: String,
	/// Text this marker inserts.
	pub new_value: String,
	/// The edit as a delta against the modified text.
	pub delta: Delta,
	/// Present when the marker is purely a run of indentation.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub indent: Option<IndentRun>,
	/// Up to 3 displayed source lines (derivable, not authoritative).
	pub preview: Vec<PreviewLine>,
}

impl DiffMarker {
	/// Returns true if this marker is a pure indentation run.
	pub fn is_indent(&self) -> bool {
		self.indent.is_some()
	}

	/// Indent units carried by an indent marker, `indentVal` on the wire.
	pub fn indent_val(&self) -> Option<usize> {
		self.indent.map(|run| run.units)
	}
}
