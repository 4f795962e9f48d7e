//! `DiffOptions`: the schema shared by every diff mode.

use serde::{Deserialize, Serialize};

use super::{OptionSchema, OptionsInput};

/// Canonical options for computing a diff.
///
/// The libgit2 diff flags appear as named booleans, all off by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    pub reverse: bool,
    pub include_ignored: bool,
    pub recurse_ignored_dirs: bool,
    pub include_untracked: bool,
    pub recurse_untracked_dirs: bool,
    pub include_unmodified: bool,
    pub include_typechange: bool,
    pub ignore_filemode: bool,
    pub ignore_submodules: bool,
    pub ignore_case: bool,
    pub disable_pathspec_match: bool,
    pub skip_binary_check: bool,
    pub force_text: bool,
    pub force_binary: bool,
    pub ignore_whitespace: bool,
    pub ignore_whitespace_change: bool,
    pub ignore_whitespace_eol: bool,
    pub ignore_blank_lines: bool,
    pub show_untracked_content: bool,
    pub show_unmodified: bool,
    pub show_binary: bool,
    pub patience: bool,
    pub minimal: bool,
    pub indent_heuristic: bool,
    /// Paths or fnmatch patterns limiting the diff; empty means everything.
    pub pathspec: Vec<String>,
    pub context_lines: u32,
    pub interhunk_lines: u32,
    pub id_abbrev: u16,
    /// Blobs larger than this many bytes are treated as binary.
    pub max_size: i64,
    pub old_prefix: String,
    pub new_prefix: String,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            reverse: false,
            include_ignored: false,
            recurse_ignored_dirs: false,
            include_untracked: false,
            recurse_untracked_dirs: false,
            include_unmodified: false,
            include_typechange: false,
            ignore_filemode: false,
            ignore_submodules: false,
            ignore_case: false,
            disable_pathspec_match: false,
            skip_binary_check: false,
            force_text: false,
            force_binary: false,
            ignore_whitespace: false,
            ignore_whitespace_change: false,
            ignore_whitespace_eol: false,
            ignore_blank_lines: false,
            show_untracked_content: false,
            show_unmodified: false,
            show_binary: false,
            patience: false,
            minimal: false,
            indent_heuristic: false,
            pathspec: Vec::new(),
            context_lines: 3,
            interhunk_lines: 0,
            id_abbrev: 7,
            max_size: 512 * 1024 * 1024,
            old_prefix: "a".to_string(),
            new_prefix: "b".to_string(),
        }
    }
}

impl OptionSchema for DiffOptions {
    const NAME: &'static str = "DiffOptions";
}

impl From<DiffOptions> for OptionsInput<DiffOptions> {
    fn from(options: DiffOptions) -> Self {
        OptionsInput::Canonical(options)
    }
}

impl From<Option<DiffOptions>> for OptionsInput<DiffOptions> {
    fn from(options: Option<DiffOptions>) -> Self {
        options.map_or(OptionsInput::Absent, OptionsInput::Canonical)
    }
}

impl DiffOptions {
    /// Builds the engine struct. `git2::DiffOptions` is not `Send`, so this
    /// runs on the repository worker.
    pub(crate) fn to_git2(&self) -> git2::DiffOptions {
        let mut opts = git2::DiffOptions::new();
        opts.reverse(self.reverse)
            .include_ignored(self.include_ignored)
            .recurse_ignored_dirs(self.recurse_ignored_dirs)
            .include_untracked(self.include_untracked)
            .recurse_untracked_dirs(self.recurse_untracked_dirs)
            .include_unmodified(self.include_unmodified)
            .include_typechange(self.include_typechange)
            .ignore_filemode(self.ignore_filemode)
            .ignore_submodules(self.ignore_submodules)
            .ignore_case(self.ignore_case)
            .disable_pathspec_match(self.disable_pathspec_match)
            .skip_binary_check(self.skip_binary_check)
            .force_text(self.force_text)
            .force_binary(self.force_binary)
            .ignore_whitespace(self.ignore_whitespace)
            .ignore_whitespace_change(self.ignore_whitespace_change)
            .ignore_whitespace_eol(self.ignore_whitespace_eol)
            .ignore_blank_lines(self.ignore_blank_lines)
            .show_untracked_content(self.show_untracked_content)
            .show_unmodified(self.show_unmodified)
            .show_binary(self.show_binary)
            .patience(self.patience)
            .minimal(self.minimal)
            .indent_heuristic(self.indent_heuristic)
            .context_lines(self.context_lines)
            .interhunk_lines(self.interhunk_lines)
            .id_abbrev(self.id_abbrev)
            .max_size(self.max_size)
            .old_prefix(self.old_prefix.as_str())
            .new_prefix(self.new_prefix.as_str());

        for spec in &self.pathspec {
            opts.pathspec(spec.as_str());
        }

        opts
    }
}
