//! `DiffFindOptions`: rename and copy detection.

use serde::{Deserialize, Serialize};

use super::{OptionSchema, OptionsInput};

/// Canonical options for [`Diff::find_similar`](crate::Diff::find_similar).
///
/// With every flag left `false` the engine reads `diff.renames` from the
/// repository configuration instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffFindOptions {
    pub renames: bool,
    pub renames_from_rewrites: bool,
    pub copies: bool,
    pub copies_from_unmodified: bool,
    pub rewrites: bool,
    pub break_rewrites: bool,
    pub break_rewrites_for_renames_only: bool,
    pub for_untracked: bool,
    pub all: bool,
    pub ignore_leading_whitespace: bool,
    pub ignore_whitespace: bool,
    pub dont_ignore_whitespace: bool,
    pub exact_match_only: bool,
    pub remove_unmodified: bool,
    /// Similarity (0-100) needed to call an add/delete pair a rename.
    pub rename_threshold: u16,
    pub rename_from_rewrite_threshold: u16,
    pub copy_threshold: u16,
    pub break_rewrite_threshold: u16,
    /// Upper bound on rename candidates examined.
    pub rename_limit: usize,
}

impl Default for DiffFindOptions {
    fn default() -> Self {
        Self {
            renames: false,
            renames_from_rewrites: false,
            copies: false,
            copies_from_unmodified: false,
            rewrites: false,
            break_rewrites: false,
            break_rewrites_for_renames_only: false,
            for_untracked: false,
            all: false,
            ignore_leading_whitespace: false,
            ignore_whitespace: false,
            dont_ignore_whitespace: false,
            exact_match_only: false,
            remove_unmodified: false,
            rename_threshold: 50,
            rename_from_rewrite_threshold: 50,
            copy_threshold: 50,
            break_rewrite_threshold: 60,
            rename_limit: 1000,
        }
    }
}

impl OptionSchema for DiffFindOptions {
    const NAME: &'static str = "DiffFindOptions";
}

impl From<DiffFindOptions> for OptionsInput<DiffFindOptions> {
    fn from(options: DiffFindOptions) -> Self {
        OptionsInput::Canonical(options)
    }
}

impl From<Option<DiffFindOptions>> for OptionsInput<DiffFindOptions> {
    fn from(options: Option<DiffFindOptions>) -> Self {
        options.map_or(OptionsInput::Absent, OptionsInput::Canonical)
    }
}

impl DiffFindOptions {
    pub(crate) fn to_git2(&self) -> git2::DiffFindOptions {
        let mut opts = git2::DiffFindOptions::new();
        opts.renames(self.renames)
            .renames_from_rewrites(self.renames_from_rewrites)
            .copies(self.copies)
            .copies_from_unmodified(self.copies_from_unmodified)
            .rewrites(self.rewrites)
            .break_rewrites(self.break_rewrites)
            .break_rewrites_for_renames_only(self.break_rewrites_for_renames_only)
            .for_untracked(self.for_untracked)
            .all(self.all)
            .ignore_leading_whitespace(self.ignore_leading_whitespace)
            .ignore_whitespace(self.ignore_whitespace)
            .dont_ignore_whitespace(self.dont_ignore_whitespace)
            .exact_match_only(self.exact_match_only)
            .remove_unmodified(self.remove_unmodified)
            .rename_threshold(self.rename_threshold)
            .rename_from_rewrite_threshold(self.rename_from_rewrite_threshold)
            .copy_threshold(self.copy_threshold)
            .break_rewrite_threshold(self.break_rewrite_threshold)
            .rename_limit(self.rename_limit);
        opts
    }
}
