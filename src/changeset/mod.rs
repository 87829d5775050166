//! Change sets between two configurations.
//!
//! # Data Flow
//! ```text
//! current (live) ──┐
//!                  ├──► build_changeset ──► ChangeSet ──► apply engine
//! target (file) ───┘
//! ```
//!
//! Items are ordered: service deletions, service additions, then per matched
//! service an optional scheduler update followed by destination deletions,
//! additions and updates.

pub mod builder;
pub mod item;

pub use builder::build_changeset;
pub use item::{Change, ChangeKind, ChangeSet, ChangeSetItem};
