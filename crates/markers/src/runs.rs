//! Raw edit runs produced by the character and line diff passes.

use similar::{Algorithm, DiffOp, capture_diff_slices};

/// One contiguous edit between the modified and original texts.
///
/// Offsets are character counts; `deleted` comes out of the modified text,
/// `inserted` out of the original (goal) text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EditRun {
	/// Character offset into the modified text.
	pub modified_offset: usize,
	/// Character offset into the original text.
	pub original_offset: usize,
	/// Text removed from the modified version.
	pub deleted: String,
	/// Text inserted from the original version.
	pub inserted: String,
}

impl EditRun {
	pub fn is_pure_insert(&self) -> bool {
		self.deleted.is_empty() && !self.inserted.is_empty()
	}
}

/// Character-granularity edit runs.
pub(crate) fn char_runs(modified: &str, original: &str) -> Vec<EditRun> {
	let old: Vec<char> = modified.chars().collect();
	let new: Vec<char> = original.chars().collect();
	let ops = capture_diff_slices(Algorithm::Myers, &old, &new);

	let mut runs = Vec::new();
	for op in ops {
		match op {
			DiffOp::Equal { .. } => {}
			DiffOp::Delete {
				old_index,
				old_len,
				new_index,
			} => runs.push(EditRun {
				modified_offset: old_index,
				original_offset: new_index,
				deleted: old[old_index..old_index + old_len].iter().collect(),
				inserted: String::new(),
			}),
			DiffOp::Insert {
				old_index,
				new_index,
				new_len,
			} => runs.push(EditRun {
				modified_offset: old_index,
				original_offset: new_index,
				deleted: String::new(),
				inserted: new[new_index..new_index + new_len].iter().collect(),
			}),
			DiffOp::Replace {
				old_index,
				old_len,
				new_index,
				new_len,
			} => runs.push(EditRun {
				modified_offset: old_index,
				original_offset: new_index,
				deleted: old[old_index..old_index + old_len].iter().collect(),
				inserted: new[new_index..new_index + new_len].iter().collect(),
			}),
		}
	}
	runs
}

/// Line-granularity edit runs: the same edit script, coalesced to whole-line
/// units, with offsets converted back to character counts.
pub(crate) fn line_runs(modified: &str, original: &str) -> Vec<EditRun> {
	let old = split_lines(modified);
	let new = split_lines(original);
	let old_starts = line_starts(&old);
	let new_starts = line_starts(&new);
	let ops = capture_diff_slices(Algorithm::Myers, &old, &new);

	let mut runs = Vec::new();
	for op in ops {
		match op {
			DiffOp::Equal { .. } => {}
			DiffOp::Delete {
				old_index,
				old_len,
				new_index,
			} => runs.push(EditRun {
				modified_offset: old_starts[old_index],
				original_offset: new_starts[new_index],
				deleted: old[old_index..old_index + old_len].concat(),
				inserted: String::new(),
			}),
			DiffOp::Insert {
				old_index,
				new_index,
				new_len,
			} => runs.push(EditRun {
				modified_offset: old_starts[old_index],
				original_offset: new_starts[new_index],
				deleted: String::new(),
				inserted: new[new_index..new_index + new_len].concat(),
			}),
			DiffOp::Replace {
				old_index,
				old_len,
				new_index,
				new_len,
			} => runs.push(EditRun {
				modified_offset: old_starts[old_index],
				original_offset: new_starts[new_index],
				deleted: old[old_index..old_index + old_len].concat(),
				inserted: new[new_index..new_index + new_len].concat(),
			}),
		}
	}
	runs
}

fn split_lines(text: &str) -> Vec<&str> {
	text.split_inclusive('\n').collect()
}

/// Character offsets of each line start, plus one past-the-end sentinel.
fn line_starts(lines: &[&str]) -> Vec<usize> {
	let mut starts = Vec::with_capacity(lines.len() + 1);
	let mut pos = 0;
	for line in lines {
		starts.push(pos);
		pos += line.chars().count();
	}
	starts.push(pos);
	starts
}

/// Merges immediately adjacent pure-indent insert runs, scanning backward so
/// multi-token indent insertions collapse into one run.
pub(crate) fn merge_adjacent_indent_inserts(runs: &mut Vec<EditRun>, tab: &str) {
	let mut i = runs.len();
	while i > 1 {
		i -= 1;
		let adjacent = {
			let (prev, cur) = (&runs[i - 1], &runs[i]);
			prev.is_pure_insert()
				&& cur.is_pure_insert()
				&& is_indent(&prev.inserted, tab)
				&& is_indent(&cur.inserted, tab)
				&& cur.modified_offset == prev.modified_offset
				&& cur.original_offset == prev.original_offset + prev.inserted.chars().count()
		};
		if adjacent {
			let cur = runs.remove(i);
			runs[i - 1].inserted.push_str(&cur.inserted);
		}
	}
}

/// Returns true if `text` is a non-empty repetition of the tab unit.
pub(crate) fn is_indent(text: &str, tab: &str) -> bool {
	if text.is_empty() || tab.is_empty() || text.len() % tab.len() != 0 {
		return false;
	}
	text.as_bytes()
		.chunks(tab.len())
		.all(|chunk| chunk == tab.as_bytes())
}
