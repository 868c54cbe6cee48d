//! Editor-surface intake.
//!
//! A text-editing surface reports raw `(rangeOffset, rangeLength, text)`
//! triples per keystroke batch, all expressed against the same pre-edit
//! document. Folding them highest-offset-first keeps every lower offset
//! valid while composing.

use stria_delta::Delta;

/// One raw change reported by the editing surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
	/// Character offset of the replaced range.
	pub range_offset: usize,
	/// Length of the replaced range in characters.
	pub range_length: usize,
	/// Replacement text.
	pub text: String,
}

/// Folds a keystroke batch into a single delta.
///
/// Changes are sorted by descending offset, turned into
/// `Retain(offset)·Delete(length)·Insert(text)` deltas, and composed
/// left-to-right.
pub fn fold_content_changes(changes: &[ContentChange]) -> Delta {
	let mut sorted: Vec<&ContentChange> = changes.iter().collect();
	sorted.sort_by(|a, b| b.range_offset.cmp(&a.range_offset));

	let mut folded = Delta::new();
	for change in sorted {
		folded = folded.compose(Delta::from_edit(
			change.range_offset,
			change.range_length,
			&change.text,
		));
	}
	folded
}
