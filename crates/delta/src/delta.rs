use ropey::Rope;

use crate::types::{Insertion, Op};

/// An ordered sequence of retain/insert/delete operations describing a text
/// edit.
///
/// Deltas use Operational Transformation (OT) principles: they can be
/// composed, inverted, and transformed against each other. A delta is
/// expressed against a specific base document, but it is *open-ended*: a
/// trailing retain to end-of-document is implicit, so a delta only needs to
/// cover the prefix it actually touches.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Delta {
	/// Sequence of retain/delete/insert operations.
	pub(crate) ops: Vec<Op>,
	/// Characters of the base document covered by retains and deletes.
	pub(crate) base_len: usize,
	/// Characters of the result document covered by retains and inserts.
	pub(crate) target_len: usize,
}

impl Delta {
	/// Creates an empty (identity) delta.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds the delta for one raw editor change: replace `delete_len`
	/// characters at `offset` with `text`.
	pub fn from_edit(offset: usize, delete_len: usize, text: &str) -> Self {
		let mut delta = Self::new();
		delta.retain(offset);
		delta.delete(delete_len);
		delta.insert(text.to_string());
		delta
	}

	/// Builds a pure-insert delta seeding whole-file content.
	pub fn from_content(text: &str) -> Self {
		let mut delta = Self::new();
		delta.insert(text.to_string());
		delta
	}

	/// Returns a slice of all operations in this delta.
	pub fn ops(&self) -> &[Op] {
		&self.ops
	}

	/// Characters of the base document this delta covers.
	pub fn base_len(&self) -> usize {
		self.base_len
	}

	/// Characters of the result document this delta covers.
	pub fn target_len(&self) -> usize {
		self.target_len
	}

	/// Returns true if this delta contains no operations.
	pub fn is_empty(&self) -> bool {
		self.ops.is_empty()
	}

	/// Returns true if applying this delta changes nothing (only retains).
	pub fn is_identity(&self) -> bool {
		self.ops.iter().all(|op| matches!(op, Op::Retain(_)))
	}

	/// `[insertedChars, deletedChars]` for this delta.
	pub fn stat(&self) -> (usize, usize) {
		let mut inserted = 0;
		let mut deleted = 0;
		for op in &self.ops {
			match op {
				Op::Retain(_) => {}
				Op::Delete(n) => deleted += n,
				Op::Insert(ins) => inserted += ins.char_len(),
			}
		}
		(inserted, deleted)
	}

	/// Concatenates all insert payloads in order.
	///
	/// This is the rendering of a delta composed down from an empty document
	/// (such a delta is pure-insert by construction).
	pub fn inserted_text(&self) -> String {
		let mut out = String::new();
		for op in &self.ops {
			if let Op::Insert(ins) = op {
				out.push_str(ins.text());
			}
		}
		out
	}

	/// Adds a retain operation, preserving N characters from the base.
	///
	/// Consecutive retains are merged.
	pub fn retain(&mut self, n: usize) {
		if n == 0 {
			return;
		}

		self.base_len += n;
		self.target_len += n;

		if let Some(Op::Retain(count)) = self.ops.last_mut() {
			*count += n;
		} else {
			self.ops.push(Op::Retain(n));
		}
	}

	/// Adds a delete operation, removing N characters from the base.
	///
	/// Consecutive deletes are merged.
	pub fn delete(&mut self, n: usize) {
		if n == 0 {
			return;
		}

		self.base_len += n;

		if let Some(Op::Delete(count)) = self.ops.last_mut() {
			*count += n;
		} else {
			self.ops.push(Op::Delete(n));
		}
	}

	/// Adds an insert operation at the current position.
	///
	/// Adjacent inserts are merged; an insert lands before a directly
	/// preceding delete so the insert/delete order stays normalized.
	pub fn insert(&mut self, text: String) {
		if text.is_empty() {
			return;
		}

		let ins = Insertion::new(text);
		self.target_len += ins.char_len();

		match self.ops.as_mut_slice() {
			[.., Op::Insert(prev)] | [.., Op::Insert(prev), Op::Delete(_)] => {
				prev.push_str(&ins);
			}
			[.., last @ Op::Delete(_)] => {
				let del = std::mem::replace(last, Op::Insert(ins));
				self.ops.push(del);
			}
			_ => {
				self.ops.push(Op::Insert(ins));
			}
		}
	}

	/// Applies this delta to a document, modifying it in place.
	///
	/// Characters past the covered prefix are left untouched (implicit
	/// trailing retain).
	pub fn apply(&self, doc: &mut Rope) {
		debug_assert!(self.base_len <= doc.len_chars());

		let mut pos = 0;
		for op in &self.ops {
			match op {
				Op::Retain(n) => {
					pos += n;
				}
				Op::Delete(n) => {
					doc.remove(pos..pos + n);
				}
				Op::Insert(ins) => {
					doc.insert(pos, ins.text());
					pos += ins.char_len();
				}
			}
		}
	}

	/// Applies this delta to a string, returning the result.
	pub fn apply_to_str(&self, doc: &str) -> String {
		let mut rope = Rope::from_str(doc);
		self.apply(&mut rope);
		rope.to_string()
	}

	/// Inverts this delta relative to its base document.
	///
	/// The base is required because inverting a delete has to restore the
	/// deleted text. Applying the result to the post-image yields the base.
	pub fn invert(&self, base: &Rope) -> Delta {
		debug_assert!(self.base_len <= base.len_chars());

		let mut result = Delta::new();
		let mut pos = 0;
		for op in &self.ops {
			match op {
				Op::Retain(n) => {
					result.retain(*n);
					pos += n;
				}
				Op::Delete(n) => {
					let deleted: String = base.slice(pos..pos + n).chars().collect();
					result.insert(deleted);
					pos += n;
				}
				Op::Insert(ins) => {
					result.delete(ins.char_len());
				}
			}
		}

		result
	}

	/// Composes two deltas into a single equivalent delta.
	///
	/// `other` must be expressed against the document produced by `self`; the
	/// result is the minimal delta with the same net effect as applying
	/// `self` then `other`. Composition is associative. Tail operations of
	/// either side pass through unchanged (open-ended deltas).
	pub fn compose(self, other: Delta) -> Delta {
		let mut result = Delta::new();

		let mut a_iter = self.ops.into_iter();
		let mut b_iter = other.ops.into_iter();
		let mut a = a_iter.next();
		let mut b = b_iter.next();

		loop {
			match (a.take(), b.take()) {
				(None, None) => break,
				// `self` exhausted: the rest of `other` addresses base text
				// past the covered prefix and passes through.
				(None, Some(op)) => {
					result.push(op);
					for op in b_iter.by_ref() {
						result.push(op);
					}
					break;
				}
				// `other` exhausted: it implicitly retains everything
				// `self` still produces.
				(Some(op), None) => {
					result.push(op);
					for op in a_iter.by_ref() {
						result.push(op);
					}
					break;
				}
				// Inserts of `other` land in front of whatever `self` does
				// at this position.
				(a_op, Some(Op::Insert(ins))) => {
					result.insert(ins.into_text());
					a = a_op;
					b = b_iter.next();
				}
				// Deletes of `self` concern text `other` never saw.
				(Some(Op::Delete(n)), b_op) => {
					result.delete(n);
					a = a_iter.next();
					b = b_op;
				}
				(Some(a_op), Some(b_op)) => {
					// Both sides now address the intermediate document:
					// retain/insert on the left, retain/delete on the right.
					let len = a_op.len().min(b_op.len());
					let keep = matches!(b_op, Op::Retain(_));
					let (a_head, a_rest) = split_front(a_op, len);
					let (_, b_rest) = split_front(b_op, len);

					match a_head {
						Op::Retain(n) => {
							if keep {
								result.retain(n);
							} else {
								result.delete(n);
							}
						}
						Op::Insert(ins) => {
							if keep {
								result.insert(ins.into_text());
							}
							// Dropped otherwise: `other` deleted text
							// `self` inserted, so neither survives.
						}
						Op::Delete(_) => unreachable!("left deletes are consumed above"),
					}

					a = a_rest.or_else(|| a_iter.next());
					b = b_rest.or_else(|| b_iter.next());
				}
			}
		}

		result
	}

	/// Transforms `other` against `self` (classic OT rebase).
	///
	/// Both deltas must be expressed against the same base document; the
	/// result expresses `other`'s intent against the document already
	/// mutated by `self`. `self` has priority: at equal positions its
	/// inserts come first and `other` is shifted past them.
	pub fn transform(&self, other: &Delta) -> Delta {
		let mut result = Delta::new();

		let mut a_iter = self.ops.iter().cloned();
		let mut b_iter = other.ops.iter().cloned();
		let mut a = a_iter.next();
		let mut b = b_iter.next();

		loop {
			match (a.take(), b.take()) {
				// `other` exhausted: it implicitly retains the rest, and
				// trailing retains are a no-op for open-ended deltas.
				(_, None) => break,
				// `self` exhausted: the rest of `other` is untouched.
				(None, Some(op)) => {
					result.push(op);
					for op in b_iter.by_ref() {
						result.push(op);
					}
					break;
				}
				// Text inserted by `self` has to be skipped over.
				(Some(Op::Insert(ins)), b_op) => {
					result.retain(ins.char_len());
					a = a_iter.next();
					b = b_op;
				}
				// `other`'s insert goes in as-is at the current position.
				(a_op, Some(Op::Insert(ins))) => {
					result.insert(ins.into_text());
					a = a_op;
					b = b_iter.next();
				}
				(Some(a_op), Some(b_op)) => {
					// Retain/delete on both sides, addressing the shared
					// base document.
					let len = a_op.len().min(b_op.len());
					let survives = matches!(a_op, Op::Retain(_));
					let (_, a_rest) = split_front(a_op, len);
					let (b_head, b_rest) = split_front(b_op, len);

					if survives {
						match b_head {
							Op::Retain(n) => result.retain(n),
							Op::Delete(n) => result.delete(n),
							Op::Insert(_) => unreachable!("inserts are consumed above"),
						}
					}
					// Text already deleted by `self` leaves nothing for
					// `other` to retain or delete.

					a = a_rest.or_else(|| a_iter.next());
					b = b_rest.or_else(|| b_iter.next());
				}
			}
		}

		result
	}

	/// Appends an operation through the merging builder methods.
	fn push(&mut self, op: Op) {
		match op {
			Op::Retain(n) => self.retain(n),
			Op::Delete(n) => self.delete(n),
			Op::Insert(ins) => self.insert(ins.into_text()),
		}
	}
}

/// Splits `op` after `len` characters, returning the consumed head and the
/// remainder (if any).
fn split_front(op: Op, len: usize) -> (Op, Option<Op>) {
	debug_assert!(len <= op.len());

	if len == op.len() {
		return (op, None);
	}

	match op {
		Op::Retain(n) => (Op::Retain(len), Some(Op::Retain(n - len))),
		Op::Delete(n) => (Op::Delete(len), Some(Op::Delete(n - len))),
		Op::Insert(mut ins) => {
			let prefix = ins.take_prefix(len);
			(Op::Insert(Insertion::new(prefix)), Some(Op::Insert(ins)))
		}
	}
}
