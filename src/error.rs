//! Library error types.
//!
//! Defines the `Error` enum for every failure the crate reports. Engine errors
//! from libgit2 are wrapped untouched in `Engine`; everything else is raised
//! by this crate's own contracts.
//!
//! Variants:
//! - `InvalidOption` → option input did not fit its schema
//! - `IndexOutOfRange`, `NotFound` → tree entry lookups
//! - `TraversalAborted` → a subtree failed to resolve during a walk
//! - `WorkerGone` → the repository worker thread stopped answering

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Git error: {0}")]
    Engine(#[from] git2::Error),

    #[error("Invalid option `{field}` for {schema}: {reason}")]
    InvalidOption {
        schema: &'static str,
        field: String,
        reason: String,
    },

    #[error("Entry index {index} out of range for tree with {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Walk aborted while resolving `{path}`: {source}")]
    TraversalAborted {
        path: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Repository worker is no longer running")]
    WorkerGone,
}

impl Error {
    /// Maps libgit2 "not found" failures onto [`Error::NotFound`], leaving
    /// every other engine error as-is.
    pub(crate) fn not_found_or(err: git2::Error, what: impl Into<String>) -> Self {
        if err.code() == git2::ErrorCode::NotFound {
            Error::NotFound(what.into())
        } else {
            Error::Engine(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
