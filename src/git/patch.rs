//! Conversion from engine diffs and patches into owned models.

use git2::{Blob, Delta, Repository};
use std::cell::RefCell;

use crate::error::Result;
use crate::models::{DiffHunk, DiffLine, DiffStatus, FileDelta, LineType, Patch};

pub(crate) fn status_of(delta: Delta) -> DiffStatus {
    match delta {
        Delta::Added => DiffStatus::Added,
        Delta::Deleted => DiffStatus::Deleted,
        Delta::Modified => DiffStatus::Modified,
        Delta::Renamed => DiffStatus::Renamed,
        Delta::Copied => DiffStatus::Copied,
        Delta::Typechange => DiffStatus::TypeChanged,
        Delta::Untracked => DiffStatus::Untracked,
        Delta::Ignored => DiffStatus::Ignored,
        Delta::Conflicted => DiffStatus::Conflicted,
        Delta::Unreadable => DiffStatus::Unreadable,
        Delta::Unmodified => DiffStatus::Unmodified,
    }
}

pub(crate) fn file_delta(delta: &git2::DiffDelta<'_>) -> FileDelta {
    FileDelta {
        status: status_of(delta.status()),
        old_path: delta.old_file().path().map(|p| p.to_string_lossy().to_string()),
        new_path: delta.new_file().path().map(|p| p.to_string_lossy().to_string()),
        old_id: delta.old_file().id().to_string(),
        new_id: delta.new_file().id().to_string(),
        is_binary: delta.flags().is_binary(),
    }
}

fn line_from_git2(line: &git2::DiffLine<'_>) -> DiffLine {
    let line_type = match line.origin() {
        '+' => LineType::Addition,
        '-' => LineType::Deletion,
        ' ' => LineType::Context,
        _ => LineType::Header,
    };

    DiffLine {
        line_type,
        old_lineno: line.old_lineno(),
        new_lineno: line.new_lineno(),
        content: String::from_utf8_lossy(line.content()).to_string(),
    }
}

fn hunk_from_git2(hunk: &git2::DiffHunk<'_>, lines: Vec<DiffLine>) -> DiffHunk {
    DiffHunk {
        old_start: hunk.old_start(),
        old_lines: hunk.old_lines(),
        new_start: hunk.new_start(),
        new_lines: hunk.new_lines(),
        header: String::from_utf8_lossy(hunk.header()).to_string(),
        lines,
    }
}

fn empty_patch(delta: &git2::DiffDelta<'_>) -> Patch {
    let delta = file_delta(delta);
    Patch {
        status: delta.status,
        old_path: delta.old_path,
        new_path: delta.new_path,
        is_binary: delta.is_binary,
        hunks: Vec::new(),
        additions: 0,
        deletions: 0,
    }
}

/// Copies one engine patch out, hunks and lines included.
pub(crate) fn patch_from_git2(patch: &git2::Patch<'_>) -> Result<Patch> {
    let delta = patch.delta();
    let mut hunks: Vec<DiffHunk> = Vec::with_capacity(patch.num_hunks());

    for hunk_idx in 0..patch.num_hunks() {
        let (hunk, _) = patch.hunk(hunk_idx)?;

        let mut lines: Vec<DiffLine> = Vec::new();
        for line_idx in 0..patch.num_lines_in_hunk(hunk_idx)? {
            lines.push(line_from_git2(&patch.line_in_hunk(hunk_idx, line_idx)?));
        }

        hunks.push(hunk_from_git2(&hunk, lines));
    }

    let (_, additions, deletions) = patch.line_stats()?;
    let delta = file_delta(&delta);

    Ok(Patch {
        status: delta.status,
        old_path: delta.old_path,
        new_path: delta.new_path,
        is_binary: delta.is_binary,
        hunks,
        additions,
        deletions,
    })
}

/// One [`Patch`] per delta, in delta order. Deltas the engine produces no
/// text patch for (binary or unchanged files) come back without hunks.
pub(crate) fn patches_from_diff(diff: &git2::Diff<'_>) -> Result<Vec<Patch>> {
    let mut patches = Vec::with_capacity(diff.deltas().len());

    for (idx, delta) in diff.deltas().enumerate() {
        match git2::Patch::from_diff(diff, idx)? {
            Some(patch) => patches.push(patch_from_git2(&patch)?),
            None => patches.push(empty_patch(&delta)),
        }
    }

    Ok(patches)
}

/// Gathers the file, hunk and line callbacks of one blob diff into a
/// [`Patch`]. The engine reports at most one file for a blob pair.
#[derive(Default)]
struct PatchCollector {
    patch: RefCell<Option<Patch>>,
}

impl PatchCollector {
    fn file(&self, delta: &git2::DiffDelta<'_>) {
        *self.patch.borrow_mut() = Some(empty_patch(delta));
    }

    fn hunk(&self, hunk: &git2::DiffHunk<'_>) {
        if let Some(patch) = self.patch.borrow_mut().as_mut() {
            patch.hunks.push(hunk_from_git2(hunk, Vec::new()));
        }
    }

    fn line(&self, line: &git2::DiffLine<'_>) {
        let line = line_from_git2(line);
        let mut patch = self.patch.borrow_mut();
        let Some(patch) = patch.as_mut() else {
            return;
        };

        match line.line_type {
            LineType::Addition => patch.additions += 1,
            LineType::Deletion => patch.deletions += 1,
            _ => {}
        }
        if let Some(hunk) = patch.hunks.last_mut() {
            hunk.lines.push(line);
        }
    }
}

/// Diffs two optional blobs through the callback API, which, unlike
/// `git2::Patch`, accepts a missing side. `None` means the engine reported no
/// file, as it does when both sides are missing or unchanged.
pub(crate) fn patch_from_blobs(
    repo: &Repository,
    old: Option<&Blob<'_>>,
    old_path: Option<&str>,
    new: Option<&Blob<'_>>,
    new_path: Option<&str>,
    opts: &mut git2::DiffOptions,
) -> Result<Option<Patch>> {
    let collector = PatchCollector::default();
    let mut on_file = |delta: git2::DiffDelta<'_>, _progress: f32| {
        collector.file(&delta);
        true
    };
    let mut on_hunk = |_delta: git2::DiffDelta<'_>, hunk: git2::DiffHunk<'_>| {
        collector.hunk(&hunk);
        true
    };
    let mut on_line = |_delta: git2::DiffDelta<'_>, _hunk: Option<git2::DiffHunk<'_>>, line: git2::DiffLine<'_>| {
        collector.line(&line);
        true
    };

    repo.diff_blobs(
        old,
        old_path,
        new,
        new_path,
        Some(opts),
        Some(&mut on_file),
        None,
        Some(&mut on_hunk),
        Some(&mut on_line),
    )?;

    Ok(collector.patch.take())
}
