//! Step identifiers.
//!
//! A [`StepId`] is derived from wall-clock milliseconds plus an in-process
//! sequence suffix. Both halves are zero-padded decimal, so lexicographic
//! order equals creation order even for ids issued within the same
//! millisecond.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Millisecond digits in an id. Enough until the year 2286.
const MILLIS_WIDTH: usize = 13;
/// Sequence digits in an id.
const SEQ_WIDTH: usize = 4;
/// Largest sequence value before the clock half is bumped instead.
const SEQ_MAX: u32 = 9999;

/// A monotonically increasing, lexicographically sortable step identifier.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
	/// Wraps an already-validated id string.
	pub(crate) fn from_parts(millis: i64, seq: u32) -> Self {
		Self(format!(
			"{millis:0mw$}-{seq:0sw$}",
			mw = MILLIS_WIDTH,
			sw = SEQ_WIDTH
		))
	}

	/// Parses and validates an id from its wire form.
	pub fn parse(raw: &str) -> Result<Self, String> {
		let (millis, seq) = raw
			.split_once('-')
			.ok_or_else(|| format!("missing '-' separator in step id {raw:?}"))?;
		if millis.len() != MILLIS_WIDTH || !millis.bytes().all(|b| b.is_ascii_digit()) {
			return Err(format!("step id {raw:?} clock half must be {MILLIS_WIDTH} digits"));
		}
		if seq.len() != SEQ_WIDTH || !seq.bytes().all(|b| b.is_ascii_digit()) {
			return Err(format!("step id {raw:?} sequence half must be {SEQ_WIDTH} digits"));
		}
		Ok(Self(raw.to_string()))
	}

	/// The id as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for StepId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl fmt::Debug for StepId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "StepId({})", self.0)
	}
}

/// Issues strictly increasing step ids.
///
/// The clock value is bumped past the last-issued value on collision (or
/// regression), so two steps created in the same instant still sort
/// deterministically.
#[derive(Debug, Default, Clone)]
pub struct StepIdGen {
	last_millis: i64,
	last_seq: u32,
	issued: bool,
}

impl StepIdGen {
	/// Creates a generator starting from the current clock.
	pub fn new() -> Self {
		Self::default()
	}

	/// Issues the next id, strictly greater than every previous one.
	pub fn next_id(&mut self) -> StepId {
		let now = Utc::now().timestamp_millis();
		if !self.issued || now > self.last_millis {
			self.last_millis = self.last_millis.max(now);
			self.last_seq = 0;
		} else if self.last_seq < SEQ_MAX {
			self.last_seq += 1;
		} else {
			self.last_millis += 1;
			self.last_seq = 0;
		}
		self.issued = true;
		StepId::from_parts(self.last_millis, self.last_seq)
	}
}
