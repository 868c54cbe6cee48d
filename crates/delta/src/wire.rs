//! Wire encoding for deltas: `{"ops":[{"retain":n}|{"insert":s}|{"delete":n}]}`.
//!
//! Validation happens once at the deserialization boundary; internal code
//! only ever sees well-formed [`Delta`] values.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::types::Op;
use crate::Delta;

/// A malformed wire operation, reported with its position and violation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireOpError {
	/// An op object set none or more than one of retain/insert/delete.
	#[error("op {index}: exactly one of retain/insert/delete must be set")]
	AmbiguousKind {
		/// Index of the op within the `ops` array.
		index: usize,
	},

	/// An insert op carried an empty string.
	#[error("op {index}: insert text must be non-empty")]
	EmptyInsert {
		/// Index of the op within the `ops` array.
		index: usize,
	},

	/// A retain or delete op carried a zero count.
	#[error("op {index}: retain/delete count must be positive")]
	ZeroCount {
		/// Index of the op within the `ops` array.
		index: usize,
	},
}

#[derive(Serialize, Deserialize)]
struct WireOp {
	#[serde(skip_serializing_if = "Option::is_none")]
	retain: Option<usize>,
	#[serde(skip_serializing_if = "Option::is_none")]
	insert: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	delete: Option<usize>,
}

#[derive(Serialize, Deserialize)]
struct WireDelta {
	ops: Vec<WireOp>,
}

impl From<&Delta> for WireDelta {
	fn from(delta: &Delta) -> Self {
		let ops = delta
			.ops()
			.iter()
			.map(|op| match op {
				Op::Retain(n) => WireOp {
					retain: Some(*n),
					insert: None,
					delete: None,
				},
				Op::Delete(n) => WireOp {
					retain: None,
					insert: None,
					delete: Some(*n),
				},
				Op::Insert(ins) => WireOp {
					retain: None,
					insert: Some(ins.text().to_string()),
					delete: None,
				},
			})
			.collect();
		Self { ops }
	}
}

impl WireDelta {
	fn into_delta(self) -> Result<Delta, WireOpError> {
		let mut delta = Delta::new();
		for (index, op) in self.ops.into_iter().enumerate() {
			match (op.retain, op.insert, op.delete) {
				(Some(n), None, None) => {
					if n == 0 {
						return Err(WireOpError::ZeroCount { index });
					}
					delta.retain(n);
				}
				(None, Some(text), None) => {
					if text.is_empty() {
						return Err(WireOpError::EmptyInsert { index });
					}
					delta.insert(text);
				}
				(None, None, Some(n)) => {
					if n == 0 {
						return Err(WireOpError::ZeroCount { index });
					}
					delta.delete(n);
				}
				_ => return Err(WireOpError::AmbiguousKind { index }),
			}
		}
		Ok(delta)
	}
}

impl Serialize for Delta {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		WireDelta::from(self).serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for Delta {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		WireDelta::deserialize(deserializer)?
			.into_delta()
			.map_err(D::Error::custom)
	}
}
