//! Semantic diff markers.
//!
//! Turns an old/new file pair into discrete, human-reviewable edit
//! suggestions. Each [`DiffMarker`] carries a minimal [`Delta`] against the
//! modified (working) text, so applying a marker is the same operation as
//! recording any other edit.
//!
//! Extraction runs a character-granularity and a line-granularity diff,
//! merges indentation runs, lets the line pass win where it groups a replace
//! better, and splits out indentation so it stays independently actionable.
//!
//! [`Delta`]: stria_delta::Delta

/// The extraction pipeline.
mod extract;
/// Marker and preview types.
mod marker;
/// Bounded preview slicing.
mod preview;
/// Raw diff-pass edit runs.
mod runs;


pub use extract::extract_markers;
pub use marker::{
	DiffMarker, FragmentKind, IndentRun, MarkerOp, PreviewFragment, PreviewLine,
};
