//! Persisted record shapes, validation, and batching.
//!
//! Records are shape-checked once at this boundary; internal code operates on
//! already-validated [`Step`] values. An invalid record rejects its whole
//! batch, but other batches still apply.

use serde::{Deserialize, Serialize};
use stria_delta::Delta;
use thiserror::Error;

use crate::id::StepId;
use crate::step::{FileStatus, Highlight, Step};

/// Practical ceiling on records per persistence call; larger sets continue
/// in follow-up batches.
pub const MAX_BATCH: usize = 25;

/// Splits records into persistence-sized batches.
pub fn batches<T>(records: &[T]) -> impl Iterator<Item = &[T]> {
	records.chunks(MAX_BATCH)
}

/// The persisted shape of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
	/// Step id in its wire form.
	pub id: String,
	/// Target file path.
	pub path: String,
	/// Persisted UI flag.
	pub preview_opened: bool,
	/// Present and true only on bootstrap steps.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub is_file_dep_change: Option<bool>,
	/// File status at this step.
	pub file_status: FileStatus,
	/// Whether the step is still an open draft.
	pub is_draft: bool,
	/// Attached selection ranges.
	pub highlight: Vec<Highlight>,
	/// The forward delta.
	pub delta: Delta,
	/// The inverse delta, when recorded.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub delta_inverted: Option<Delta>,
	/// `[insertedChars, deletedChars]`.
	pub stat: (usize, usize),
}

/// The persisted shape of a step comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
	/// Comment id.
	pub id: String,
	/// The step this comment is attached to.
	pub step_id: String,
	/// Comment body.
	pub text: String,
}

/// One field that failed schema validation.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("field {field}: {reason}")]
pub struct FieldViolation {
	/// Name of the offending field.
	pub field: &'static str,
	/// What was wrong with it.
	pub reason: String,
}

/// A record rejected by schema validation, with every field violation.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("step record {record_id:?} rejected ({} field violations)", .violations.len())]
pub struct RecordError {
	/// Id of the offending record as it appeared on the wire.
	pub record_id: String,
	/// All field violations found.
	pub violations: Vec<FieldViolation>,
}

/// Encodes a step into its persisted shape.
pub fn encode_step(step: &Step) -> StepRecord {
	StepRecord {
		id: step.id.as_str().to_string(),
		path: step.path.clone(),
		preview_opened: step.preview_opened,
		is_file_dep_change: step.is_file_dep_change.then_some(true),
		file_status: step.file_status,
		is_draft: step.is_draft,
		highlight: step.highlight.clone(),
		delta: step.delta.clone(),
		delta_inverted: Some(step.delta_inverted.clone()),
		stat: step.stat,
	}
}

/// Validates one record into a step, collecting every field violation.
///
/// Dependency sets are not persisted; they are re-resolved when the history
/// is replayed.
pub fn decode_record(record: StepRecord) -> Result<Step, RecordError> {
	let mut violations = Vec::new();

	let id = match StepId::parse(&record.id) {
		Ok(id) => Some(id),
		Err(reason) => {
			violations.push(FieldViolation { field: "id", reason });
			None
		}
	};

	if record.path.is_empty() {
		violations.push(FieldViolation {
			field: "path",
			reason: "path must be non-empty".to_string(),
		});
	}

	if record.stat != record.delta.stat() {
		violations.push(FieldViolation {
			field: "stat",
			reason: format!(
				"stat {:?} does not match delta stat {:?}",
				record.stat,
				record.delta.stat()
			),
		});
	}

	match (id, violations.is_empty()) {
		(Some(id), true) => Ok(Step {
			id,
			path: record.path,
			delta: record.delta,
			delta_inverted: record.delta_inverted.unwrap_or_default(),
			deps: Vec::new(),
			is_draft: record.is_draft,
			is_file_dep_change: record.is_file_dep_change.unwrap_or(false),
			highlight: record.highlight,
			comment: None,
			stat: record.stat,
			file_status: record.file_status,
			preview_opened: record.preview_opened,
		}),
		_ => Err(RecordError {
			record_id: record.id,
			violations,
		}),
	}
}

/// Decodes a full record set batch-by-batch.
///
/// Batches containing an invalid record are skipped whole and reported;
/// every other batch's steps are returned.
pub fn decode_steps(records: Vec<StepRecord>) -> (Vec<Step>, Vec<RecordError>) {
	let mut steps = Vec::with_capacity(records.len());
	let mut errors = Vec::new();

	for batch in records.chunks(MAX_BATCH) {
		let mut decoded = Vec::with_capacity(batch.len());
		let mut failed = false;
		for record in batch {
			match decode_record(record.clone()) {
				Ok(step) => decoded.push(step),
				Err(err) => {
					errors.push(err);
					failed = true;
				}
			}
		}
		if !failed {
			steps.append(&mut decoded);
		}
	}

	(steps, errors)
}
