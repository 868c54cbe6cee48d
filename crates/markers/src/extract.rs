//! The marker extraction pipeline.
//!
//! Two diff passes (character and line granularity) produce raw edit runs;
//! runs are classified into insert/delete/replace markers, reconciled so the
//! pass with the better semantic grouping wins, and post-processed so
//! indentation changes become independently actionable.

use stria_delta::Delta;
use tracing::debug;

use crate::marker::{DiffMarker, IndentRun, MarkerOp};
use crate::preview::build_preview;
use crate::runs::{EditRun, char_runs, is_indent, line_runs, merge_adjacent_indent_inserts};

/// A marker before ids and previews are attached.
#[derive(Debug, Clone)]
struct Proto {
	operation: MarkerOp,
	modified_offset: usize,
	original_offset: usize,
	old_value: String,
	new_value: String,
	delta: Delta,
	indent: Option<IndentRun>,
}

impl Proto {
	fn length(&self) -> usize {
		match self.operation {
			MarkerOp::Insert => self.new_value.chars().count(),
			MarkerOp::Delete | MarkerOp::Replace => self.old_value.chars().count(),
		}
	}
}

/// Extracts the semantic edit markers turning `modified` (the working text)
/// into `original` (the goal text).
///
/// `tab` is the indent unit string and `eol` the line terminator; both feed
/// indent detection, marker splitting, and previews.
pub fn extract_markers(modified: &str, original: &str, tab: &str, eol: &str) -> Vec<DiffMarker> {
	if modified == original {
		return Vec::new();
	}

	let mut by_char = char_runs(modified, original);
	let mut by_line = line_runs(modified, original);
	merge_adjacent_indent_inserts(&mut by_char, tab);
	merge_adjacent_indent_inserts(&mut by_line, tab);

	let char_protos: Vec<Proto> = by_char
		.into_iter()
		.filter_map(|run| classify(run, tab))
		.collect();
	let line_protos: Vec<Proto> = by_line
		.into_iter()
		.filter_map(|run| classify(run, tab))
		.collect();

	let mut protos = reconcile(char_protos, &line_protos);
	protos = split_trailing_indents(protos, tab, eol);
	protos = merge_increasing_indents(protos, original, eol);

	let modified_chars: Vec<char> = modified.chars().collect();
	let mut markers = Vec::new();
	for proto in protos {
		let preview = build_preview(&modified_chars, &proto.delta, eol);
		if !preview.iter().any(|line| line.has_edit()) {
			// Nothing displayable survived slicing; dropped rather than
			// emitted malformed.
			continue;
		}
		markers.push(DiffMarker {
			id: markers.len() as u64 + 1,
			operation: proto.operation,
			original_offset: proto.original_offset,
			modified_offset: proto.modified_offset,
			length: proto.length(),
			old_value: proto.old_value,
			new_value: proto.new_value,
			delta: proto.delta,
			indent: proto.indent,
			preview,
		});
	}

	debug!(count = markers.len(), "extracted diff markers");
	markers
}

/// Classifies one edit run; zero-length runs are skipped entirely.
fn classify(run: EditRun, tab: &str) -> Option<Proto> {
	let operation = match (run.deleted.is_empty(), run.inserted.is_empty()) {
		(true, true) => return None,
		(true, false) => MarkerOp::Insert,
		(false, true) => MarkerOp::Delete,
		(false, false) => MarkerOp::Replace,
	};

	let indent_text = match operation {
		MarkerOp::Insert => Some(&run.inserted),
		MarkerOp::Delete => Some(&run.deleted),
		MarkerOp::Replace => None,
	};
	let indent = indent_text
		.filter(|text| is_indent(text, tab))
		.map(|text| IndentRun {
			units: text.chars().count() / tab.chars().count(),
		});

	let mut delta = Delta::new();
	delta.retain(run.modified_offset);
	delta.delete(run.deleted.chars().count());
	delta.insert(run.inserted.clone());

	Some(Proto {
		operation,
		modified_offset: run.modified_offset,
		original_offset: run.original_offset,
		old_value: run.deleted,
		new_value: run.inserted,
		delta,
		indent,
	})
}

/// Replaces a character-pass replace marker with the line-pass markers when
/// the line pass produced more than one marker inside its modified range.
fn reconcile(char_protos: Vec<Proto>, line_protos: &[Proto]) -> Vec<Proto> {
	let mut used = vec![false; line_protos.len()];
	let mut out = Vec::with_capacity(char_protos.len());

	for proto in char_protos {
		if proto.operation != MarkerOp::Replace {
			out.push(proto);
			continue;
		}

		let from = proto.modified_offset;
		let to = proto.modified_offset + proto.old_value.chars().count();
		let inside: Vec<usize> = line_protos
			.iter()
			.enumerate()
			.filter(|(i, line)| {
				!used[*i] && line.modified_offset >= from && line.modified_offset <= to
			})
			.map(|(i, _)| i)
			.collect();

		if inside.len() > 1 {
			debug!(
				replaced = inside.len(),
				from, to, "line pass wins over char-pass replace"
			);
			for i in inside {
				used[i] = true;
				out.push(line_protos[i].clone());
			}
		} else {
			out.push(proto);
		}
	}

	out
}

/// Splits a marker whose inserted text ends with `eol` plus trailing indent
/// into the content marker and a separate indent marker.
fn split_trailing_indents(protos: Vec<Proto>, tab: &str, eol: &str) -> Vec<Proto> {
	let mut out = Vec::with_capacity(protos.len());

	for proto in protos {
		let Some(eol_at) = proto.new_value.rfind(eol) else {
			out.push(proto);
			continue;
		};
		let split_at = eol_at + eol.len();
		let tail = &proto.new_value[split_at..];
		if tail.is_empty() || !is_indent(tail, tab) {
			out.push(proto);
			continue;
		}

		let head = proto.new_value[..split_at].to_string();
		let deleted_chars = proto.old_value.chars().count();
		let tail_offset = proto.modified_offset + deleted_chars;

		let mut head_delta = Delta::new();
		head_delta.retain(proto.modified_offset);
		head_delta.delete(deleted_chars);
		head_delta.insert(head.clone());

		let mut tail_delta = Delta::new();
		tail_delta.retain(tail_offset);
		tail_delta.insert(tail.to_string());

		let head_chars = head.chars().count();
		let operation = if proto.old_value.is_empty() {
			MarkerOp::Insert
		} else {
			proto.operation
		};

		out.push(Proto {
			operation,
			new_value: head,
			delta: head_delta,
			indent: None,
			..proto.clone()
		});
		out.push(Proto {
			operation: MarkerOp::Insert,
			modified_offset: tail_offset,
			original_offset: proto.original_offset + head_chars,
			old_value: String::new(),
			new_value: tail.to_string(),
			delta: tail_delta,
			indent: Some(IndentRun {
				units: tail.chars().count() / tab.chars().count(),
			}),
		});
	}

	out
}

/// Merges consecutive per-line indent markers that insert strictly increasing
/// amounts of indentation on sequential original-file lines into a single
/// marker whose delta inserts all runs at their respective line offsets.
///
/// Uniform per-line indents stay separate so each line remains independently
/// actionable.
fn merge_increasing_indents(protos: Vec<Proto>, original: &str, eol: &str) -> Vec<Proto> {
	let line_of = |offset: usize| -> usize {
		let prefix: String = original.chars().take(offset).collect();
		prefix.matches(eol).count()
	};

	let chains = |a: &Proto, b: &Proto| -> bool {
		let (Some(ia), Some(ib)) = (a.indent, b.indent) else {
			return false;
		};
		a.operation == MarkerOp::Insert
			&& b.operation == MarkerOp::Insert
			&& ib.units > ia.units
			&& line_of(b.original_offset) == line_of(a.original_offset) + 1
	};

	let mut out: Vec<Proto> = Vec::with_capacity(protos.len());
	let mut iter = protos.into_iter().peekable();

	while let Some(first) = iter.next() {
		if first.indent.is_none() {
			out.push(first);
			continue;
		}

		let mut run = vec![first];
		loop {
			let chained = matches!(
				(run.last(), iter.peek()),
				(Some(a), Some(b)) if chains(a, b)
			);
			if !chained {
				break;
			}
			run.extend(iter.next());
		}

		if run.len() == 1 {
			out.extend(run);
			continue;
		}

		let mut delta = run[0].delta.clone();
		let mut new_value = run[0].new_value.clone();
		let mut units = run[0].indent.map_or(0, |i| i.units);
		for proto in &run[1..] {
			let rebased = delta.transform(&proto.delta);
			delta = delta.compose(rebased);
			new_value.push_str(&proto.new_value);
			units += proto.indent.map_or(0, |i| i.units);
		}

		out.push(Proto {
			operation: MarkerOp::Insert,
			modified_offset: run[0].modified_offset,
			original_offset: run[0].original_offset,
			old_value: String::new(),
			new_value,
			delta,
			indent: Some(IndentRun { units }),
		});
	}

	out
}
