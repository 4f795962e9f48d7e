//! Tree entry kinds.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    BlobExecutable,
    Tree,
    Link,
    /// A submodule commit reference.
    Commit,
}

impl EntryKind {
    /// Classifies a normalized git filemode. libgit2 only reports the five
    /// canonical modes, so anything else is read as a plain blob.
    pub fn from_filemode(mode: i32) -> Self {
        match mode {
            0o040000 => EntryKind::Tree,
            0o100755 => EntryKind::BlobExecutable,
            0o120000 => EntryKind::Link,
            0o160000 => EntryKind::Commit,
            _ => EntryKind::Blob,
        }
    }

    /// The canonical filemode written for this kind.
    pub fn filemode(self) -> i32 {
        match self {
            EntryKind::Blob => 0o100644,
            EntryKind::BlobExecutable => 0o100755,
            EntryKind::Tree => 0o040000,
            EntryKind::Link => 0o120000,
            EntryKind::Commit => 0o160000,
        }
    }

    /// Plain and executable blobs.
    pub fn is_file(self) -> bool {
        matches!(self, EntryKind::Blob | EntryKind::BlobExecutable)
    }

    pub fn is_tree(self) -> bool {
        self == EntryKind::Tree
    }
}
