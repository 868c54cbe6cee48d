//! Composable text deltas.
//!
//! A [`Delta`] is an ordered sequence of retain/insert/delete operations
//! applied left-to-right against an implicit cursor into a base document.
//! Deltas follow Operational Transformation (OT) principles:
//!
//! * [`Delta::compose`]: sequential combination, associative.
//! * [`Delta::invert`]: the undo delta, relative to a base document.
//! * [`Delta::transform`]: rebase one delta's intent over another.
//!
//! Deltas are open-ended: the trailing retain to end-of-document is implicit,
//! so a delta only covers the prefix it touches.

/// The delta type and its algebra.
mod delta;
/// Operation types.
mod types;
/// Serde wire encoding with boundary validation.
mod wire;


pub use delta::Delta;
pub use ropey::{Rope, RopeSlice};
pub use types::{Insertion, Op};
pub use wire::WireOpError;
