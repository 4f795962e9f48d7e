//! gitkit - async conveniences over libgit2
//!
//! Walks tree hierarchies breadth-first as an event stream, and exposes every
//! diff mode (blob to buffer, index to workdir, tree to index, tree to tree,
//! tree to workdir, tree to workdir with index) behind one option schema that
//! accepts loose JSON as well as typed structs.
//!
//! # Usage
//! ```no_run
//! # async fn demo() -> gitkit::Result<()> {
//! use gitkit::{GitRepository, WalkOptions};
//!
//! let repo = GitRepository::open(".")?;
//! let head = repo.find_tree("HEAD").await?;
//!
//! let files = head.walk(&repo, WalkOptions::default())?.start().collect().await?;
//! println!("{} files", files.len());
//!
//! let parent = repo.find_tree("HEAD~1").await?;
//! let mut diff = head.diff(&repo, &parent, serde_json::json!({ "context_lines": 1 })).await?;
//! diff.find_similar(serde_json::json!({ "renames": true })).await?;
//! for patch in diff.patches().await? {
//!     println!("{:?} {:?}", patch.status, patch.new_path);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod git;
pub mod models;
pub mod options;

pub use error::{Error, Result};
pub use git::{
    BufferInput, Diff, GitRepository, IndexSource, PreparedBuffer, Tree, TreeBuilder, TreeEntry,
    TreeSpec, TreeWalk, WalkEvent, WalkEvents,
};
pub use models::{DiffHunk, DiffLine, DiffStats, DiffStatus, EntryKind, FileDelta, LineType, Patch};
pub use options::{normalize, DiffFindOptions, DiffOptions, OptionSchema, OptionsInput, WalkOptions};
