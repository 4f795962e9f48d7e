//! Owned data transfer objects handed back to callers.
//!
//! These structs never borrow from libgit2, so they can cross the repository
//! worker boundary and be serialized.
//! - `tree`: EntryKind
//! - `diff`: FileDelta, Patch, DiffHunk, DiffLine, DiffStats

pub mod diff;
pub mod tree;

pub use diff::*;
pub use tree::*;
