//! Operation types that make up a [`Delta`](crate::Delta).

/// A text insertion with cached character length.
///
/// Storing the character count avoids repeated O(n) `.chars().count()` calls
/// in hot paths like `apply()`, `compose()`, and `transform()`.
///
/// Fields are private to enforce the invariant that `char_len` always equals
/// `text.chars().count()`. Construct via [`Insertion::new`] or
/// [`Insertion::from_chars`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
	text: String,
	char_len: usize,
}

impl Insertion {
	/// Creates a new insertion, computing the character length once.
	#[inline]
	pub fn new(text: String) -> Self {
		let char_len = text.chars().count();
		Self { text, char_len }
	}

	/// Creates an insertion from a substring with pre-computed length.
	///
	/// # Debug Assertions
	/// In debug builds, asserts that `char_len` matches the actual character count.
	#[inline]
	pub fn from_chars(text: String, char_len: usize) -> Self {
		debug_assert_eq!(text.chars().count(), char_len);
		Self { text, char_len }
	}

	/// Returns true if this insertion is empty.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.char_len == 0
	}

	/// Returns the inserted text.
	#[inline]
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Returns the cached character length.
	#[inline]
	pub fn char_len(&self) -> usize {
		self.char_len
	}

	/// Appends text from another insertion, updating the cached length.
	pub(crate) fn push_str(&mut self, other: &Insertion) {
		self.text.push_str(&other.text);
		self.char_len += other.char_len;
	}

	/// Consumes this insertion and returns the owned text.
	pub(crate) fn into_text(self) -> String {
		self.text
	}

	/// Splits off the first `n` characters, returning them as a new string.
	///
	/// The remaining insertion has its cached length reduced accordingly.
	pub(crate) fn take_prefix(&mut self, n: usize) -> String {
		debug_assert!(n <= self.char_len);
		let prefix: String = self.text.chars().take(n).collect();
		let rest: String = self.text.chars().skip(n).collect();
		self.text = rest;
		self.char_len -= n;
		prefix
	}
}

/// A single operation in a delta.
///
/// Operations are applied left-to-right against an implicit cursor into the
/// base document: retain moves the cursor, delete removes the next N
/// characters, insert adds text at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
	/// Keep the next N characters of the base document.
	Retain(usize),
	/// Remove the next N characters of the base document.
	Delete(usize),
	/// Insert new text at the current position.
	Insert(Insertion),
}

impl Op {
	/// Length of this operation in characters of whichever document it
	/// addresses (base for retain/delete, result for insert).
	#[inline]
	pub fn len(&self) -> usize {
		match self {
			Op::Retain(n) | Op::Delete(n) => *n,
			Op::Insert(ins) => ins.char_len(),
		}
	}

	/// Returns true if this operation has zero length.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
