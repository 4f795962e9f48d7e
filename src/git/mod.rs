pub mod builder;
pub mod diff;
pub mod patch;
pub mod repository;
pub mod tree;
pub mod walk;

pub use builder::TreeBuilder;
pub use diff::{BufferInput, Diff, IndexSource, PreparedBuffer};
pub use repository::{GitRepository, TreeSpec};
pub use tree::{Tree, TreeEntry};
pub use walk::{TreeWalk, WalkEvent, WalkEvents};
