//! Bounded marker previews.

use stria_delta::{Delta, Op};

use crate::marker::{FragmentKind, PreviewFragment, PreviewLine};

/// Maximum number of displayed source lines per marker.
const MAX_PREVIEW_LINES: usize = 3;

/// Slices the text surrounding a marker's delta into per-character
/// delete/insert-tagged fragments, bounded to [`MAX_PREVIEW_LINES`] lines.
pub(crate) fn build_preview(modified: &[char], delta: &Delta, eol: &str) -> Vec<PreviewLine> {
	let mut spans: Vec<(FragmentKind, String)> = Vec::new();
	let mut pos = 0usize;

	for op in delta.ops() {
		match op {
			Op::Retain(n) => {
				let end = (pos + n).min(modified.len());
				spans.push((FragmentKind::Context, modified[pos..end].iter().collect()));
				pos = end;
			}
			Op::Delete(n) => {
				let end = (pos + n).min(modified.len());
				spans.push((FragmentKind::Delete, modified[pos..end].iter().collect()));
				pos = end;
			}
			Op::Insert(ins) => {
				spans.push((FragmentKind::Insert, ins.text().to_string()));
			}
		}
	}

	// Leading context is cut back to the start of the line the first edit
	// sits on.
	if let Some((FragmentKind::Context, text)) = spans.first_mut() {
		if let Some(eol_at) = text.rfind(eol) {
			*text = text[eol_at + eol.len()..].to_string();
		}
	}

	let mut lines = Vec::new();
	let mut current: Vec<PreviewFragment> = Vec::new();

	'outer: for (kind, text) in spans {
		let mut pieces = text.split(eol).peekable();
		while let Some(piece) = pieces.next() {
			if !piece.is_empty() {
				current.push(PreviewFragment {
					text: piece.to_string(),
					kind,
				});
			}
			let line_ended = pieces.peek().is_some();
			if line_ended {
				lines.push(PreviewLine {
					fragments: std::mem::take(&mut current),
				});
				if lines.len() == MAX_PREVIEW_LINES {
					break 'outer;
				}
			}
		}
	}

	if !current.is_empty() && lines.len() < MAX_PREVIEW_LINES {
		lines.push(PreviewLine { fragments: current });
	}

	lines
}
