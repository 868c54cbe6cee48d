//! The step store: ordered, reorderable edit history per file.
//!
//! The store is the only shared mutable resource in the engine. Every
//! mutation builds a full new snapshot of the step map and ordering and swaps
//! it in atomically from the caller's perspective; a failed operation leaves
//! the prior history completely untouched.

use std::collections::BTreeMap;

use stria_delta::{Delta, Rope};
use tracing::{debug, trace};

use crate::error::StepError;
use crate::id::{StepId, StepIdGen};
use crate::resolver::{first_order_violation, replay, resolve};
use crate::step::{FileStatus, Highlight, Step};

/// Parameters for recording or coalescing one edit.
#[derive(Debug, Clone)]
pub struct SaveDelta {
	/// Target file path.
	pub path: String,
	/// The edit, expressed against the current reconstructed content of
	/// `path` (or the whole original file for a bootstrap).
	pub delta: Delta,
	/// Selection ranges attached to the edit.
	pub highlight: Vec<Highlight>,
	/// True to seed the file's original content as a synthetic bootstrap
	/// step instead of recording an edit.
	pub is_bootstrap: bool,
	/// File status carried by the step; defaults to `Modified`.
	pub file_status: Option<FileStatus>,
}

/// Ordered history of steps across all files.
#[derive(Debug, Default, Clone)]
pub struct StepStore {
	steps: BTreeMap<StepId, Step>,
	order: Vec<StepId>,
	ids: StepIdGen,
}

impl StepStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// All step ids in application order.
	pub fn order(&self) -> &[StepId] {
		&self.order
	}

	/// Number of recorded steps.
	pub fn len(&self) -> usize {
		self.order.len()
	}

	/// Returns true if no steps are recorded.
	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// Looks up a step by id.
	pub fn step(&self, id: &StepId) -> Result<&Step, StepError> {
		self.steps
			.get(id)
			.ok_or_else(|| StepError::UnknownStep(id.clone()))
	}

	/// All steps for a path, in application order.
	pub fn steps_for_path(&self, path: &str) -> Vec<&Step> {
		self.order
			.iter()
			.filter_map(|id| self.steps.get(id))
			.filter(|step| step.path == path)
			.collect()
	}

	/// The open draft for a path, if one exists.
	pub fn draft_for_path(&self, path: &str) -> Option<&Step> {
		self.steps_for_path(path)
			.into_iter()
			.find(|step| step.is_draft)
	}

	/// Content-bearing steps for a path (non-identity deltas), in
	/// application order. Pure-highlight steps never affect replay.
	fn content_steps_for_path(&self, path: &str) -> Vec<&Step> {
		self.steps_for_path(path)
			.into_iter()
			.filter(|step| !step.delta.is_identity())
			.collect()
	}

	fn bootstrap_for_path(&self, path: &str) -> Option<&Step> {
		self.steps_for_path(path)
			.into_iter()
			.find(|step| step.is_file_dep_change)
	}

	/// Records or coalesces one edit.
	///
	/// With no open draft for the path, a new draft step is created with its
	/// dependency set resolved against the already-recorded steps. With an
	/// open draft, the edit is composed onto it in place. A coalesced result
	/// that is content-neutral with no highlight and no comment deletes the
	/// draft entirely.
	///
	/// Returns the id of the step recorded or updated, or `None` when the
	/// call left no step behind.
	pub fn save_delta(&mut self, save: SaveDelta) -> Result<Option<StepId>, StepError> {
		if save.is_bootstrap {
			return self.save_bootstrap(save).map(Some);
		}

		if let Some(draft) = self.draft_for_path(&save.path) {
			let draft_id = draft.id.clone();
			return self.coalesce_draft(draft_id, save);
		}

		let prior = self.content_steps_for_path(&save.path);
		let resolution = resolve(&prior, &save.delta);
		if resolution.delta.is_identity() && save.highlight.is_empty() {
			trace!(path = %save.path, "no-op save discarded");
			return Ok(None);
		}

		let id = self.ids.next_id();
		let stat = resolution.delta.stat();
		let step = Step {
			id: id.clone(),
			path: save.path,
			delta: resolution.delta,
			delta_inverted: resolution.delta_inverted,
			deps: resolution.deps,
			is_draft: true,
			is_file_dep_change: false,
			highlight: save.highlight,
			comment: None,
			stat,
			file_status: save.file_status.unwrap_or(FileStatus::Modified),
			preview_opened: false,
		};

		let mut steps = self.steps.clone();
		let mut order = self.order.clone();
		steps.insert(id.clone(), step);
		order.push(id.clone());
		self.steps = steps;
		self.order = order;

		debug!(step = %id, "recorded new draft step");
		Ok(Some(id))
	}

	/// Seeds a file's original content as a bootstrap step, once per path.
	fn save_bootstrap(&mut self, save: SaveDelta) -> Result<StepId, StepError> {
		if let Some(existing) = self.bootstrap_for_path(&save.path) {
			return Ok(existing.id.clone());
		}

		let id = self.ids.next_id();
		let stat = save.delta.stat();
		let delta_inverted = save.delta.invert(&Rope::new());
		let step = Step {
			id: id.clone(),
			path: save.path,
			delta: save.delta,
			delta_inverted,
			deps: Vec::new(),
			is_draft: false,
			is_file_dep_change: true,
			highlight: Vec::new(),
			comment: None,
			stat,
			file_status: save.file_status.unwrap_or(FileStatus::Modified),
			preview_opened: false,
		};

		let mut steps = self.steps.clone();
		let mut order = self.order.clone();
		steps.insert(id.clone(), step);
		order.push(id.clone());
		self.steps = steps;
		self.order = order;

		debug!(step = %id, "seeded bootstrap step");
		Ok(id)
	}

	/// Composes an incoming edit onto the open draft for its path.
	fn coalesce_draft(
		&mut self,
		draft_id: StepId,
		save: SaveDelta,
	) -> Result<Option<StepId>, StepError> {
		let draft = self.step(&draft_id)?.clone();
		let path_steps = self.content_steps_for_path(&save.path);

		// The draft's delta in current-content space is its replayed form;
		// a pure-highlight draft contributes nothing.
		let replay_all = replay(path_steps.iter().copied());
		let draft_replayed = replay_all
			.replayed
			.iter()
			.find(|(id, _)| *id == draft_id)
			.map(|(_, delta)| delta.clone())
			.unwrap_or_default();

		let candidate = draft_replayed.compose(save.delta);
		let highlight = if save.highlight.is_empty() {
			draft.highlight.clone()
		} else {
			save.highlight
		};

		if candidate.is_identity() && highlight.is_empty() && draft.comment.is_none() {
			let mut steps = self.steps.clone();
			let mut order = self.order.clone();
			steps.remove(&draft_id);
			order.retain(|id| *id != draft_id);
			self.steps = steps;
			self.order = order;

			debug!(step = %draft_id, "coalesced draft became a no-op; deleted");
			return Ok(None);
		}

		let prior: Vec<&Step> = path_steps
			.into_iter()
			.filter(|step| step.id != draft_id)
			.collect();
		let resolution = resolve(&prior, &candidate);

		let mut steps = self.steps.clone();
		if let Some(step) = steps.get_mut(&draft_id) {
			step.stat = resolution.delta.stat();
			step.delta = resolution.delta;
			step.delta_inverted = resolution.delta_inverted;
			step.deps = resolution.deps;
			step.highlight = highlight;
		}
		self.steps = steps;

		trace!(step = %draft_id, "coalesced edit into draft");
		Ok(Some(draft_id))
	}

	/// Commits the open draft for a path, making it permanent.
	///
	/// Returns the committed step's id, or `None` when the path has no open
	/// draft.
	pub fn commit_draft(&mut self, path: &str) -> Result<Option<StepId>, StepError> {
		if self.steps_for_path(path).is_empty() {
			return Err(StepError::UnknownPath(path.to_string()));
		}
		let Some(draft) = self.draft_for_path(path) else {
			return Ok(None);
		};
		let id = draft.id.clone();

		let mut steps = self.steps.clone();
		if let Some(step) = steps.get_mut(&id) {
			step.is_draft = false;
		}
		self.steps = steps;

		debug!(step = %id, "committed draft");
		Ok(Some(id))
	}

	/// Attaches or clears the comment on a step.
	pub fn set_comment(&mut self, id: &StepId, comment: Option<String>) -> Result<(), StepError> {
		self.step(id)?;
		let mut steps = self.steps.clone();
		if let Some(step) = steps.get_mut(id) {
			step.comment = comment;
		}
		self.steps = steps;
		Ok(())
	}

	/// Sets the persisted preview-opened UI flag on a step.
	pub fn set_preview_opened(&mut self, id: &StepId, opened: bool) -> Result<(), StepError> {
		self.step(id)?;
		let mut steps = self.steps.clone();
		if let Some(step) = steps.get_mut(id) {
			step.preview_opened = opened;
		}
		self.steps = steps;
		Ok(())
	}

	/// Deletes a step.
	///
	/// Only an open draft, a pure-highlight step, or the most recent
	/// content step for its path can be deleted, and never one that a
	/// remaining step depends on.
	pub fn delete_step(&mut self, id: &StepId) -> Result<(), StepError> {
		let step = self.step(id)?;
		let path = step.path.clone();

		let deletable = step.is_draft
			|| step.is_pure_highlight()
			|| self
				.content_steps_for_path(&path)
				.last()
				.is_some_and(|last| last.id == *id);
		if !deletable {
			return Err(StepError::NotDeletable(id.clone()));
		}
		if let Some(dependent) = self
			.order
			.iter()
			.filter_map(|other| self.steps.get(other))
			.find(|other| other.deps.contains(id))
		{
			return Err(StepError::InvalidReorder {
				step: dependent.id.clone(),
				dependency: id.clone(),
			});
		}

		let mut steps = self.steps.clone();
		let mut order = self.order.clone();
		steps.remove(id);
		order.retain(|other| other != id);
		self.steps = steps;
		self.order = order;

		debug!(step = %id, "deleted step");
		Ok(())
	}

	/// Deletes every step on the target step's path strictly after it,
	/// discarding that tail of history. Returns the removed ids.
	pub fn delete_until(&mut self, id: &StepId) -> Result<Vec<StepId>, StepError> {
		let path = self.step(id)?.path.clone();

		let mut removed = Vec::new();
		let mut past = false;
		for other in &self.order {
			if other == id {
				past = true;
				continue;
			}
			if past && self.steps.get(other).is_some_and(|s| s.path == path) {
				removed.push(other.clone());
			}
		}

		let mut steps = self.steps.clone();
		let mut order = self.order.clone();
		for gone in &removed {
			steps.remove(gone);
		}
		order.retain(|other| !removed.contains(other));
		self.steps = steps;
		self.order = order;

		debug!(step = %id, removed = removed.len(), "deleted history tail");
		Ok(removed)
	}

	/// Swaps the positions of two steps in the visible sequence.
	///
	/// The swap is validated against every step's dependency set; moving a
	/// step past one of its own dependencies is rejected without mutating
	/// history. Returns the new application order.
	pub fn swap_steps(&mut self, from: &StepId, to: &StepId) -> Result<Vec<StepId>, StepError> {
		let from_at = self.position(from)?;
		let to_at = self.position(to)?;

		let mut order = self.order.clone();
		order.swap(from_at, to_at);

		let ordered: Vec<&Step> = order.iter().filter_map(|id| self.steps.get(id)).collect();
		if let Some((step, dependency)) = first_order_violation(&ordered) {
			trace!(%step, %dependency, "rejected invalid reorder");
			return Err(StepError::InvalidReorder { step, dependency });
		}

		self.order = order;
		debug!(%from, %to, "swapped steps");
		Ok(self.order.clone())
	}

	fn position(&self, id: &StepId) -> Result<usize, StepError> {
		self.order
			.iter()
			.position(|other| other == id)
			.ok_or_else(|| StepError::UnknownStep(id.clone()))
	}

	/// Reconstructs the content of `path` at a point in history.
	///
	/// Replays the path's content steps in application order up to (and,
	/// unless `exclude_self`, including) `up_to`, transforming each step
	/// whose dependency set differs from what was applied before it, then
	/// renders the composed result. `None` replays the whole history.
	pub fn reconstruct(
		&self,
		path: &str,
		up_to: Option<&StepId>,
		exclude_self: bool,
	) -> Result<String, StepError> {
		if self.steps_for_path(path).is_empty() {
			return Err(StepError::UnknownPath(path.to_string()));
		}

		let mut steps = self.content_steps_for_path(path);
		if let Some(stop) = up_to {
			let at = steps
				.iter()
				.position(|step| step.id == *stop)
				.ok_or_else(|| StepError::UnknownStep(stop.clone()))?;
			steps.truncate(if exclude_self { at } else { at + 1 });
		}

		let replayed = replay(steps.into_iter());
		Ok(replayed.composed.inserted_text())
	}
}
