use serde::{Deserialize, Serialize};

use super::{OptionSchema, OptionsInput};

/// Options for [`Tree::walk`](crate::Tree::walk).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkOptions {
    /// Emit only blob and executable-blob entries. Subtrees are still
    /// descended into either way.
    pub blobs_only: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self { blobs_only: true }
    }
}

impl WalkOptions {
    /// Emit every entry, subtrees, symlinks and submodules included.
    pub fn all_entries() -> Self {
        Self { blobs_only: false }
    }
}

impl OptionSchema for WalkOptions {
    const NAME: &'static str = "WalkOptions";
}

impl From<WalkOptions> for OptionsInput<WalkOptions> {
    fn from(options: WalkOptions) -> Self {
        OptionsInput::Canonical(options)
    }
}
