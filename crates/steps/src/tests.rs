use pretty_assertions::assert_eq;
use proptest::prelude::*;
use stria_delta::Delta;

use crate::{
	ContentChange, CoordKind, Coordinate, FileStatus, Highlight, SaveDelta, StepError, StepId,
	StepIdGen, StepRecord, StepStore, batches, coordinates, decode_record, decode_steps,
	encode_step, fold_content_changes, overlaps,
};

const PATH: &str = "src/app.tsx";

fn bootstrap(store: &mut StepStore, content: &str) -> StepId {
	store
		.save_delta(SaveDelta {
			path: PATH.to_string(),
			delta: Delta::from_content(content),
			highlight: Vec::new(),
			is_bootstrap: true,
			file_status: None,
		})
		.unwrap()
		.unwrap()
}

fn save(store: &mut StepStore, offset: usize, delete_len: usize, text: &str) -> Option<StepId> {
	store
		.save_delta(SaveDelta {
			path: PATH.to_string(),
			delta: Delta::from_edit(offset, delete_len, text),
			highlight: Vec::new(),
			is_bootstrap: false,
			file_status: None,
		})
		.unwrap()
}

fn commit(store: &mut StepStore) -> StepId {
	store.commit_draft(PATH).unwrap().unwrap()
}

fn content(store: &StepStore) -> String {
	store.reconstruct(PATH, None, false).unwrap()
}

#[test]
fn coordinates_for_a_leading_insert() {
	let d = Delta::from_content("\t2\n\t3\n");
	assert_eq!(
		coordinates(&d),
		vec![Coordinate { from: 0, to: 6, kind: CoordKind::Insert }]
	);

	let d = Delta::from_content("111\n");
	assert_eq!(
		coordinates(&d),
		vec![Coordinate { from: 0, to: 4, kind: CoordKind::Insert }]
	);
}

#[test]
fn coordinates_keep_insert_positions_in_base_space() {
	let mut d = Delta::new();
	d.retain(4);
	d.insert("\t".into());
	d.retain(3);
	d.insert("\t".into());
	assert_eq!(
		coordinates(&d),
		vec![
			Coordinate { from: 4, to: 5, kind: CoordKind::Insert },
			Coordinate { from: 7, to: 8, kind: CoordKind::Insert },
		]
	);
}

#[test]
fn delete_coordinates_shift_the_running_index_back() {
	let mut d = Delta::new();
	d.delete(2);
	d.retain(1);
	d.delete(1);
	assert_eq!(
		coordinates(&d),
		vec![
			Coordinate { from: 0, to: 2, kind: CoordKind::Delete },
			Coordinate { from: -1, to: 0, kind: CoordKind::Delete },
		]
	);
}

#[test]
fn overlap_rules_for_inserts_and_deletes() {
	let ins = |from, to| Coordinate { from, to, kind: CoordKind::Insert };
	let del = |from, to| Coordinate { from, to, kind: CoordKind::Delete };

	// Insert against insert: half-open, so the taken range's end is free.
	assert!(overlaps(&ins(0, 3), &ins(0, 1)));
	assert!(overlaps(&ins(0, 3), &ins(2, 4)));
	assert!(!overlaps(&ins(0, 3), &ins(3, 4)));

	// Any pair involving a delete: closed, endpoint touches count.
	assert!(overlaps(&ins(1, 2), &del(2, 3)));
	assert!(overlaps(&del(2, 3), &ins(3, 4)));
	assert!(!overlaps(&del(2, 3), &ins(4, 5)));
}

#[test]
fn bootstrap_is_recorded_once_per_path() {
	let mut store = StepStore::new();
	let first = bootstrap(&mut store, "abc");
	let second = bootstrap(&mut store, "abc");
	assert_eq!(first, second);
	assert_eq!(store.len(), 1);

	let step = store.step(&first).unwrap();
	assert!(step.is_file_dep_change);
	assert!(!step.is_draft);
	assert_eq!(content(&store), "abc");
}

#[test]
fn keystrokes_coalesce_into_one_draft() {
	let mut store = StepStore::new();
	bootstrap(&mut store, "abc");
	let first = save(&mut store, 0, 0, "1").unwrap();
	let second = save(&mut store, 1, 0, "2").unwrap();
	let third = save(&mut store, 2, 0, "3").unwrap();

	assert_eq!(first, second);
	assert_eq!(second, third);
	assert_eq!(store.len(), 2);

	let draft = store.step(&first).unwrap();
	assert!(draft.is_draft);
	assert_eq!(draft.stat, (3, 0));
	assert_eq!(content(&store), "123abc");
}

#[test]
fn a_draft_coalesced_back_to_nothing_is_deleted() {
	let mut store = StepStore::new();
	bootstrap(&mut store, "abc");
	assert!(save(&mut store, 1, 0, "x").is_some());
	assert!(save(&mut store, 1, 1, "").is_none());

	assert_eq!(store.len(), 1);
	assert!(store.draft_for_path(PATH).is_none());
	assert_eq!(content(&store), "abc");
}

#[test]
fn committed_drafts_stop_coalescing() {
	let mut store = StepStore::new();
	bootstrap(&mut store, "abc");
	save(&mut store, 0, 0, "x");
	let first = commit(&mut store);
	let second = save(&mut store, 0, 0, "y").unwrap();

	assert_ne!(first, second);
	assert_eq!(store.len(), 3);
	assert_eq!(content(&store), "yxabc");
}

#[test]
fn a_no_op_save_records_nothing() {
	let mut store = StepStore::new();
	bootstrap(&mut store, "abc");
	assert!(save(&mut store, 0, 0, "").is_none());
	assert_eq!(store.len(), 1);
}

#[test]
fn a_later_highlight_replaces_the_drafts() {
	let highlight = |offset, length| Highlight { offset, length };
	let mut store = StepStore::new();
	bootstrap(&mut store, "abc");

	let id = store
		.save_delta(SaveDelta {
			path: PATH.to_string(),
			delta: Delta::from_edit(0, 0, "1"),
			highlight: vec![highlight(0, 1)],
			is_bootstrap: false,
			file_status: None,
		})
		.unwrap()
		.unwrap();

	// A highlight-less coalesce keeps the draft's highlight.
	save(&mut store, 1, 0, "2");
	assert_eq!(store.step(&id).unwrap().highlight, vec![highlight(0, 1)]);

	store
		.save_delta(SaveDelta {
			path: PATH.to_string(),
			delta: Delta::from_edit(2, 0, "3"),
			highlight: vec![highlight(2, 3)],
			is_bootstrap: false,
			file_status: None,
		})
		.unwrap();
	assert_eq!(store.step(&id).unwrap().highlight, vec![highlight(2, 3)]);
}

#[test]
fn a_pure_highlight_step_never_affects_content() {
	let mut store = StepStore::new();
	bootstrap(&mut store, "abc");
	save(&mut store, 1, 1, "X");
	commit(&mut store);

	let h = store
		.save_delta(SaveDelta {
			path: PATH.to_string(),
			delta: Delta::new(),
			highlight: vec![Highlight { offset: 0, length: 2 }],
			is_bootstrap: false,
			file_status: None,
		})
		.unwrap()
		.unwrap();
	commit(&mut store);

	assert!(store.step(&h).unwrap().is_pure_highlight());
	assert_eq!(content(&store), "aXc");

	// Deletable even though it is not the latest step for its path.
	store.delete_step(&h).unwrap();
	assert_eq!(store.len(), 2);
}

#[test]
fn insert_at_a_prior_inserts_end_is_independent() {
	let mut store = StepStore::new();
	let root = bootstrap(&mut store, "ab");
	save(&mut store, 1, 0, "P");
	let p = commit(&mut store);
	save(&mut store, 2, 0, "Q");
	let q = commit(&mut store);

	let step = store.step(&q).unwrap();
	assert_eq!(step.deps, vec![root]);
	assert!(!step.deps.contains(&p));
	assert_eq!(content(&store), "aPQb");
}

#[test]
fn insert_at_a_prior_inserts_start_depends_on_it() {
	let mut store = StepStore::new();
	let root = bootstrap(&mut store, "ab");
	save(&mut store, 1, 0, "P");
	let p = commit(&mut store);
	save(&mut store, 1, 0, "Q");
	let q = commit(&mut store);

	assert_eq!(store.step(&q).unwrap().deps, vec![root, p]);
	assert_eq!(content(&store), "aQPb");
}

#[test]
fn delete_touching_a_prior_inserts_edge_depends_on_it() {
	let mut store = StepStore::new();
	let root = bootstrap(&mut store, "ab");
	save(&mut store, 1, 0, "P");
	let p = commit(&mut store);
	save(&mut store, 2, 1, "");
	let q = commit(&mut store);

	assert_eq!(store.step(&q).unwrap().deps, vec![root, p]);
	assert_eq!(content(&store), "aP");
}

#[test]
fn swapping_independent_steps_preserves_content() {
	let mut store = StepStore::new();
	bootstrap(&mut store, "abcdef");
	save(&mut store, 1, 0, "A");
	commit(&mut store);
	save(&mut store, 4, 0, "B");
	let b = commit(&mut store);
	save(&mut store, 6, 0, "C");
	let c = commit(&mut store);
	assert_eq!(content(&store), "aAbcBdCef");

	let order = store.swap_steps(&b, &c).unwrap();
	assert_eq!(order, store.order());
	assert_eq!(content(&store), "aAbcBdCef");
}

#[test]
fn transitive_deps_do_not_pull_in_unrelated_steps() {
	let mut store = StepStore::new();
	let root = bootstrap(&mut store, "0123456789");
	save(&mut store, 5, 0, "F");
	let f = commit(&mut store);
	save(&mut store, 6, 0, "TTTTT");
	let t = commit(&mut store);
	assert_eq!(content(&store), "01234FTTTTT56789");

	// Deletes the last inserted T: depends on the insert it shortens.
	save(&mut store, 10, 1, "");
	let c = commit(&mut store);
	assert_eq!(store.step(&c).unwrap().deps, vec![root.clone(), t.clone()]);

	// Lands exactly where the delete freed space: depends on the delete
	// and, through its closure, on the shortened insert, but not on the
	// adjacent unrelated insert.
	save(&mut store, 10, 0, "X");
	let x = commit(&mut store);
	let deps = &store.step(&x).unwrap().deps;
	assert_eq!(*deps, vec![root, t, c]);
	assert!(!deps.contains(&f));
	assert_eq!(content(&store), "01234FTTTTX56789");
}

#[test]
fn swapping_around_a_dependency_chain_preserves_content() {
	let mut store = StepStore::new();
	let root = bootstrap(&mut store, "0123456789");
	save(&mut store, 2, 0, "F");
	let f = commit(&mut store);
	save(&mut store, 7, 0, "TTTTT");
	let t = commit(&mut store);
	save(&mut store, 11, 1, "");
	let c = commit(&mut store);
	save(&mut store, 11, 0, "X");
	let x = commit(&mut store);
	assert_eq!(store.step(&c).unwrap().deps, vec![root.clone(), t.clone()]);
	assert_eq!(store.step(&x).unwrap().deps, vec![root, t.clone(), c.clone()]);
	assert_eq!(content(&store), "01F2345TTTTX6789");

	// F and T only share the root; the chain behind X rides along.
	store.swap_steps(&f, &t).unwrap();
	assert_eq!(content(&store), "01F2345TTTTX6789");

	// Moving X ahead of a step in its chain is rejected.
	let err = store.swap_steps(&c, &x).unwrap_err();
	assert_eq!(err, StepError::InvalidReorder { step: x, dependency: c });
}

#[test]
fn reorder_past_a_dependency_is_rejected() {
	let mut store = StepStore::new();
	let root = bootstrap(&mut store, "abc");
	save(&mut store, 1, 1, "X");
	let x = commit(&mut store);
	save(&mut store, 1, 1, "");
	let y = commit(&mut store);
	assert_eq!(store.step(&y).unwrap().deps, vec![root, x.clone()]);

	let before = store.order().to_vec();
	let err = store.swap_steps(&x, &y).unwrap_err();
	assert_eq!(err, StepError::InvalidReorder { step: y, dependency: x });
	assert_eq!(store.order(), before);
	assert_eq!(content(&store), "ac");
}

#[test]
fn marker_deltas_replay_to_the_goal_in_any_order() {
	let working = "a\nb\nc\nd\n";
	let goal = "a\nX\nc\nY\n";
	let markers = stria_markers::extract_markers(working, goal, "\t", "\n");
	assert_eq!(markers.len(), 2);

	let forward = vec![0, 1];
	let reversed = vec![1, 0];
	for order in [forward, reversed] {
		let mut store = StepStore::new();
		bootstrap(&mut store, working);

		let mut applied: Vec<Delta> = Vec::new();
		for at in order {
			let mut delta = markers[at].delta.clone();
			for prev in &applied {
				delta = prev.transform(&delta);
			}
			store
				.save_delta(SaveDelta {
					path: PATH.to_string(),
					delta: delta.clone(),
					highlight: Vec::new(),
					is_bootstrap: false,
					file_status: None,
				})
				.unwrap();
			commit(&mut store);
			applied.push(delta);
		}

		assert_eq!(content(&store), goal);
	}
}

#[test]
fn only_the_latest_content_step_is_deletable() {
	let mut store = StepStore::new();
	let root = bootstrap(&mut store, "abc");
	save(&mut store, 0, 0, "X");
	let x = commit(&mut store);
	save(&mut store, 4, 0, "Y");
	let y = commit(&mut store);
	assert_eq!(content(&store), "XabcY");

	assert_eq!(store.delete_step(&x).unwrap_err(), StepError::NotDeletable(x.clone()));
	assert_eq!(store.delete_step(&root).unwrap_err(), StepError::NotDeletable(root.clone()));

	store.delete_step(&y).unwrap();
	store.delete_step(&x).unwrap();
	store.delete_step(&root).unwrap();
	assert!(store.is_empty());
}

#[test]
fn delete_until_discards_the_later_history() {
	let mut store = StepStore::new();
	bootstrap(&mut store, "abc");
	save(&mut store, 0, 0, "X");
	let x = commit(&mut store);
	save(&mut store, 4, 0, "Y");
	let y = commit(&mut store);

	let removed = store.delete_until(&x).unwrap();
	assert_eq!(removed, vec![y]);
	assert_eq!(store.len(), 2);
	assert_eq!(content(&store), "Xabc");
}

#[test]
fn reconstruct_stops_at_the_requested_step() {
	let mut store = StepStore::new();
	bootstrap(&mut store, "abc");
	save(&mut store, 0, 0, "X");
	let x = commit(&mut store);
	save(&mut store, 4, 0, "Y");
	let y = commit(&mut store);

	assert_eq!(store.reconstruct(PATH, Some(&x), false).unwrap(), "Xabc");
	assert_eq!(store.reconstruct(PATH, Some(&x), true).unwrap(), "abc");
	assert_eq!(store.reconstruct(PATH, Some(&y), false).unwrap(), "XabcY");
}

#[test]
fn comments_and_preview_flags_attach_to_steps() {
	let mut store = StepStore::new();
	bootstrap(&mut store, "abc");
	let id = save(&mut store, 0, 0, "X").unwrap();

	store.set_comment(&id, Some("tighten this up".to_string())).unwrap();
	assert_eq!(store.step(&id).unwrap().comment.as_deref(), Some("tighten this up"));
	store.set_comment(&id, None).unwrap();
	assert_eq!(store.step(&id).unwrap().comment, None);

	store.set_preview_opened(&id, true).unwrap();
	assert!(store.step(&id).unwrap().preview_opened);
}

#[test]
fn unknown_lookups_are_rejected() {
	let mut store = StepStore::new();
	let ghost = StepId::parse("1700000000000-0000").unwrap();

	assert_eq!(store.step(&ghost).unwrap_err(), StepError::UnknownStep(ghost.clone()));
	assert_eq!(
		store.commit_draft(PATH).unwrap_err(),
		StepError::UnknownPath(PATH.to_string())
	);
	assert_eq!(
		store.reconstruct(PATH, None, false).unwrap_err(),
		StepError::UnknownPath(PATH.to_string())
	);

	bootstrap(&mut store, "abc");
	assert_eq!(store.commit_draft(PATH).unwrap(), None);
	assert_eq!(
		store.reconstruct(PATH, Some(&ghost), false).unwrap_err(),
		StepError::UnknownStep(ghost)
	);
}

#[test]
fn ids_sort_lexicographically_in_issue_order() {
	let mut generator = StepIdGen::new();
	let ids: Vec<StepId> = (0..64).map(|_| generator.next_id()).collect();
	for pair in ids.windows(2) {
		assert!(pair[0] < pair[1]);
		assert!(pair[0].as_str() < pair[1].as_str());
	}
}

#[test]
fn id_parse_validates_shape() {
	assert!(StepId::parse("1700000000000-0001").is_ok());
	assert!(StepId::parse("nope").is_err());
	assert!(StepId::parse("170-0001").is_err());
	assert!(StepId::parse("1700000000000-1").is_err());
	assert!(StepId::parse("1700000000000-00a1").is_err());
}

#[test]
fn content_changes_fold_highest_offset_first() {
	let folded = fold_content_changes(&[
		ContentChange { range_offset: 1, range_length: 0, text: "Y".to_string() },
		ContentChange { range_offset: 4, range_length: 1, text: "X".to_string() },
	]);
	assert_eq!(folded.apply_to_str("abcdef"), "aYbcdXf");
}

fn wire_record(seq: u32) -> StepRecord {
	let delta = Delta::from_edit(0, 0, "x");
	StepRecord {
		id: format!("1700000000000-{seq:04}"),
		path: PATH.to_string(),
		preview_opened: false,
		is_file_dep_change: None,
		file_status: FileStatus::Modified,
		is_draft: false,
		highlight: Vec::new(),
		stat: delta.stat(),
		delta,
		delta_inverted: None,
	}
}

#[test]
fn step_record_wire_shape_is_camel_case() {
	let value = serde_json::to_value(wire_record(7)).unwrap();
	let keys = value.as_object().unwrap();
	assert!(keys.contains_key("previewOpened"));
	assert!(keys.contains_key("fileStatus"));
	assert!(keys.contains_key("isDraft"));
	assert!(!keys.contains_key("isFileDepChange"));
	assert!(!keys.contains_key("deltaInverted"));
	assert_eq!(value["stat"], serde_json::json!([1, 0]));
	assert_eq!(value["delta"], serde_json::json!({ "ops": [{ "insert": "x" }] }));
}

#[test]
fn bootstrap_steps_carry_the_file_dep_flag_on_the_wire() {
	let mut store = StepStore::new();
	let root = bootstrap(&mut store, "abc");
	let record = encode_step(store.step(&root).unwrap());
	let value = serde_json::to_value(record).unwrap();
	assert_eq!(value["isFileDepChange"], serde_json::json!(true));
}

#[test]
fn encoded_steps_decode_back() {
	let mut store = StepStore::new();
	bootstrap(&mut store, "abc");
	save(&mut store, 1, 1, "X");
	let id = commit(&mut store);

	let step = store.step(&id).unwrap().clone();
	let decoded = decode_record(encode_step(&step)).unwrap();

	// Dependency sets are not persisted; they are re-resolved on load.
	let mut expected = step;
	expected.deps = Vec::new();
	assert_eq!(decoded, expected);
}

#[test]
fn decode_collects_every_field_violation() {
	let mut record = wire_record(0);
	record.id = "nope".to_string();
	record.path = String::new();
	record.stat = (9, 9);

	let err = decode_record(record).unwrap_err();
	assert_eq!(err.record_id, "nope");
	let fields: Vec<&str> = err.violations.iter().map(|v| v.field).collect();
	assert_eq!(fields, vec!["id", "path", "stat"]);
}

#[test]
fn batches_chunk_at_the_ceiling() {
	let records: Vec<u32> = (0..60).collect();
	let sizes: Vec<usize> = batches(&records).map(|batch| batch.len()).collect();
	assert_eq!(sizes, vec![25, 25, 10]);
}

#[test]
fn an_invalid_record_rejects_only_its_own_batch() {
	let mut records: Vec<StepRecord> = (0..26).map(wire_record).collect();
	records[0].stat = (9, 9);

	let (steps, errors) = decode_steps(records);
	assert_eq!(steps.len(), 1);
	assert_eq!(errors.len(), 1);
	assert_eq!(errors[0].record_id, "1700000000000-0000");
}

proptest! {
	#[test]
	fn coalesced_keystrokes_match_sequential_edits(
		seed in "[a-z]{1,12}",
		edits in proptest::collection::vec((0usize..32, 0usize..4, "[a-z]{0,3}"), 1..12),
	) {
		let mut store = StepStore::new();
		store
			.save_delta(SaveDelta {
				path: PATH.to_string(),
				delta: Delta::from_content(&seed),
				highlight: Vec::new(),
				is_bootstrap: true,
				file_status: None,
			})
			.unwrap();

		let mut model = seed;
		for (start, delete_len, text) in edits {
			let offset = start.min(model.chars().count());
			let deleted = delete_len.min(model.chars().count() - offset);
			let delta = Delta::from_edit(offset, deleted, &text);
			model = delta.apply_to_str(&model);
			store
				.save_delta(SaveDelta {
					path: PATH.to_string(),
					delta,
					highlight: Vec::new(),
					is_bootstrap: false,
					file_status: None,
				})
				.unwrap();
		}

		prop_assert_eq!(store.reconstruct(PATH, None, false).unwrap(), model);
	}
}
