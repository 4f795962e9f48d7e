//! Diff entry points.
//!
//! Every mode normalizes its options into [`DiffOptions`] before anything
//! reaches the engine, so a bad option field fails before any I/O. Modes that
//! yield a full diff return a [`Diff`] handle; the engine diff stays on the
//! repository worker until the handle is dropped.

use git2::{Oid, Repository};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::git::patch::{file_delta, patch_from_blobs, patch_from_git2, patches_from_diff};
use crate::git::repository::{DiffId, GitRepository};
use crate::git::tree::Tree;
use crate::models::{DiffStats, FileDelta, Patch};
use crate::options::{normalize, DiffFindOptions, DiffOptions, OptionsInput};

#[derive(Debug, Clone, Copy)]
enum DiffMode {
    BlobToBuffer,
    IndexToWorkdir,
    TreeToIndex,
    TreeToTree,
    TreeToWorkdir,
    TreeToWorkdirWithIndex,
}

/// Which index a diff reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IndexSource {
    /// The repository's own index.
    #[default]
    Repository,
    /// An index file at this path.
    File(PathBuf),
}

impl From<PathBuf> for IndexSource {
    fn from(path: PathBuf) -> Self {
        IndexSource::File(path)
    }
}

impl IndexSource {
    fn load(&self, repo: &Repository) -> Result<git2::Index> {
        match self {
            IndexSource::Repository => Ok(repo.index()?),
            // libgit2 opens a missing index file as an empty index.
            IndexSource::File(path) if !path.is_file() => {
                Err(Error::NotFound(format!("index at {}", path.display())))
            }
            IndexSource::File(path) => git2::Index::open(path)
                .map_err(|e| Error::not_found_or(e, format!("index at {}", path.display()))),
        }
    }
}

/// New-side content for [`GitRepository::blob_to_buffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferInput {
    Bytes(Vec<u8>),
    Text(String),
}

impl From<Vec<u8>> for BufferInput {
    fn from(bytes: Vec<u8>) -> Self {
        BufferInput::Bytes(bytes)
    }
}

impl From<&[u8]> for BufferInput {
    fn from(bytes: &[u8]) -> Self {
        BufferInput::Bytes(bytes.to_vec())
    }
}

impl From<String> for BufferInput {
    fn from(text: String) -> Self {
        BufferInput::Text(text)
    }
}

impl From<&str> for BufferInput {
    fn from(text: &str) -> Self {
        BufferInput::Text(text.to_string())
    }
}

/// A new-side buffer decoded to UTF-8 text, with the byte length the engine
/// will read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBuffer {
    pub text: Option<String>,
    /// UTF-8 encoded length of `text`, 0 when there is no buffer. This is a
    /// byte count, not a character count.
    pub byte_len: usize,
}

impl PreparedBuffer {
    pub fn new(input: Option<BufferInput>) -> Self {
        let text = input.map(|input| match input {
            BufferInput::Text(text) => text,
            BufferInput::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
            },
        });
        let byte_len = text.as_ref().map_or(0, String::len);
        Self { text, byte_len }
    }

    fn bytes(&self) -> Option<&[u8]> {
        self.text.as_deref().map(|text| &text.as_bytes()[..self.byte_len])
    }
}

impl GitRepository {
    /// Diffs a blob against an in-memory buffer.
    ///
    /// `old_blob` of `None` is an absent old side, reported as an addition. A
    /// `buffer` of `None` is an absent new side, reported as a deletion.
    /// Returns `None` when the engine reports no file, as with both sides
    /// absent.
    pub async fn blob_to_buffer(
        &self,
        old_blob: Option<Oid>,
        old_as_path: Option<&str>,
        buffer: Option<BufferInput>,
        buffer_as_path: Option<&str>,
        opts: impl Into<OptionsInput<DiffOptions>>,
    ) -> Result<Option<Patch>> {
        let options = normalize(opts)?;
        let buffer = PreparedBuffer::new(buffer);
        log_dispatch(DiffMode::BlobToBuffer, &options);
        tracing::debug!("New side buffer is {} bytes", buffer.byte_len);

        let old_as_path = old_as_path.map(str::to_string);
        let buffer_as_path = buffer_as_path.map(str::to_string);

        self.with_repo(move |repo| {
            let old = old_blob
                .map(|id| {
                    repo.find_blob(id)
                        .map_err(|e| Error::not_found_or(e, format!("blob {id}")))
                })
                .transpose()?;
            let mut git_opts = options.to_git2();
            let old_path = old_as_path.as_deref();
            let new_path = buffer_as_path.as_deref();

            match (old.as_ref(), buffer.bytes()) {
                (Some(old), Some(bytes)) => {
                    let patch = git2::Patch::from_blob_and_buffer(
                        old,
                        old_path.map(Path::new),
                        bytes,
                        new_path.map(Path::new),
                        Some(&mut git_opts),
                    )?;
                    Ok(Some(patch_from_git2(&patch)?))
                }
                (old, None) => patch_from_blobs(repo, old, old_path, None, new_path, &mut git_opts),
                (None, Some(bytes)) => {
                    // The callback API only takes blobs, so the buffer is
                    // staged in a throwaway in-memory store.
                    let scratch = scratch_repository()?;
                    let new = scratch.find_blob(scratch.blob(bytes)?)?;
                    let patch = patch_from_blobs(&scratch, None, None, Some(&new), None, &mut git_opts)?;
                    Ok(patch.map(|mut patch| {
                        patch.old_path = old_as_path.clone().or_else(|| buffer_as_path.clone());
                        patch.new_path = buffer_as_path.clone().or_else(|| old_as_path.clone());
                        patch
                    }))
                }
            }
        })
        .await
    }

    /// Diffs an index against the working directory.
    pub async fn index_to_workdir(
        &self,
        index: IndexSource,
        opts: impl Into<OptionsInput<DiffOptions>>,
    ) -> Result<Diff> {
        self.dispatch(DiffMode::IndexToWorkdir, opts.into(), move |repo, opts| {
            let index = index.load(repo)?;
            Ok(repo.diff_index_to_workdir(Some(&index), Some(opts))?)
        })
        .await
    }

    /// Diffs a tree (`None` for the empty tree) against an index.
    pub async fn tree_to_index(
        &self,
        tree: Option<Oid>,
        index: IndexSource,
        opts: impl Into<OptionsInput<DiffOptions>>,
    ) -> Result<Diff> {
        self.dispatch(DiffMode::TreeToIndex, opts.into(), move |repo, opts| {
            let tree = find_optional_tree(repo, tree)?;
            let index = index.load(repo)?;
            Ok(repo.diff_tree_to_index(tree.as_ref(), Some(&index), Some(opts))?)
        })
        .await
    }

    /// Diffs two trees; `None` on either side is the empty tree.
    pub async fn tree_to_tree(
        &self,
        old_tree: Option<Oid>,
        new_tree: Option<Oid>,
        opts: impl Into<OptionsInput<DiffOptions>>,
    ) -> Result<Diff> {
        self.dispatch(DiffMode::TreeToTree, opts.into(), move |repo, opts| {
            let old_tree = find_optional_tree(repo, old_tree)?;
            let new_tree = find_optional_tree(repo, new_tree)?;
            Ok(repo.diff_tree_to_tree(old_tree.as_ref(), new_tree.as_ref(), Some(opts))?)
        })
        .await
    }

    /// Diffs a tree against the working directory, ignoring the index.
    pub async fn tree_to_workdir(
        &self,
        tree: Option<Oid>,
        opts: impl Into<OptionsInput<DiffOptions>>,
    ) -> Result<Diff> {
        self.dispatch(DiffMode::TreeToWorkdir, opts.into(), move |repo, opts| {
            let tree = find_optional_tree(repo, tree)?;
            Ok(repo.diff_tree_to_workdir(tree.as_ref(), Some(opts))?)
        })
        .await
    }

    /// Diffs a tree against the working directory as `git diff <tree>` does,
    /// with the index in between.
    pub async fn tree_to_workdir_with_index(
        &self,
        tree: Option<Oid>,
        opts: impl Into<OptionsInput<DiffOptions>>,
    ) -> Result<Diff> {
        self.dispatch(DiffMode::TreeToWorkdirWithIndex, opts.into(), move |repo, opts| {
            let tree = find_optional_tree(repo, tree)?;
            Ok(repo.diff_tree_to_workdir_with_index(tree.as_ref(), Some(opts))?)
        })
        .await
    }

    async fn dispatch<F>(&self, mode: DiffMode, opts: OptionsInput<DiffOptions>, compute: F) -> Result<Diff>
    where
        F: for<'r> FnOnce(&'r Repository, &mut git2::DiffOptions) -> Result<git2::Diff<'r>> + Send + 'static,
    {
        let options = normalize(opts)?;
        log_dispatch(mode, &options);

        let id = self
            .with_session(move |session| {
                let mut git_opts = options.to_git2();
                let diff = compute(session.repo, &mut git_opts)?;
                tracing::debug!("{:?} diff produced {} deltas", mode, diff.deltas().len());
                Ok(session.store_diff(diff))
            })
            .await?;

        Ok(Diff {
            id,
            repo: self.clone(),
        })
    }
}

impl Tree {
    /// Diffs `from` (old side) against this tree (new side).
    pub async fn diff(
        &self,
        repo: &GitRepository,
        from: &Tree,
        opts: impl Into<OptionsInput<DiffOptions>>,
    ) -> Result<Diff> {
        repo.tree_to_tree(Some(from.id()), Some(self.id()), opts).await
    }
}

fn find_optional_tree(repo: &Repository, id: Option<Oid>) -> Result<Option<git2::Tree<'_>>> {
    id.map(|id| {
        repo.find_tree(id)
            .map_err(|e| Error::not_found_or(e, format!("tree {id}")))
    })
    .transpose()
}

/// A repository over an empty in-memory object database. Nothing written to it
/// reaches disk.
fn scratch_repository() -> Result<Repository> {
    let odb = git2::Odb::new()?;
    odb.add_new_mempack_backend(1)?;
    Ok(Repository::from_odb(odb)?)
}

fn log_dispatch(mode: DiffMode, options: &DiffOptions) {
    tracing::debug!(
        "Dispatching {:?} diff (context_lines={}, pathspec={:?})",
        mode,
        options.context_lines,
        options.pathspec
    );
}

/// Handle to a diff held by the repository worker.
///
/// Dropping the handle frees the engine diff.
pub struct Diff {
    id: DiffId,
    repo: GitRepository,
}

impl Diff {
    /// Per-file deltas in engine order.
    pub async fn deltas(&self) -> Result<Vec<FileDelta>> {
        let id = self.id;
        self.repo
            .with_session(move |session| {
                let diff = session.diff(id)?;
                Ok(diff.deltas().map(|delta| file_delta(&delta)).collect())
            })
            .await
    }

    /// Number of deltas.
    pub async fn len(&self) -> Result<usize> {
        let id = self.id;
        self.repo
            .with_session(move |session| Ok(session.diff(id)?.deltas().len()))
            .await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    pub async fn stats(&self) -> Result<DiffStats> {
        let id = self.id;
        self.repo
            .with_session(move |session| {
                let stats = session.diff(id)?.stats()?;
                Ok(DiffStats {
                    files_changed: stats.files_changed(),
                    insertions: stats.insertions(),
                    deletions: stats.deletions(),
                })
            })
            .await
    }

    /// Runs rename / copy detection over this diff, rewriting it in place.
    ///
    /// Calls accumulate: each pass works on the deltas the previous one left,
    /// so calling twice is not the same as calling once. The exclusive borrow
    /// keeps two passes from running on one diff at the same time.
    pub async fn find_similar(&mut self, opts: impl Into<OptionsInput<DiffFindOptions>>) -> Result<()> {
        let options: DiffFindOptions = normalize(opts)?;
        tracing::debug!(
            "Finding similar files (renames={}, copies={}, rename_threshold={})",
            options.renames,
            options.copies,
            options.rename_threshold
        );

        let id = self.id;
        self.repo
            .with_session(move |session| {
                let mut git_opts = options.to_git2();
                session.diff_mut(id)?.find_similar(Some(&mut git_opts))?;
                Ok(())
            })
            .await
    }

    /// Converts the diff into one [`Patch`] per delta.
    pub async fn patches(&self) -> Result<Vec<Patch>> {
        let id = self.id;
        self.repo
            .with_session(move |session| patches_from_diff(session.diff(id)?))
            .await
    }
}

impl Drop for Diff {
    fn drop(&mut self) {
        self.repo.release_handle(self.id);
    }
}

impl std::fmt::Debug for Diff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diff")
            .field("id", &self.id)
            .field("repository", &self.repo.path())
            .finish()
    }
}
