//! Repository handle and its worker thread.
//!
//! `git2::Repository` is `Send` but not `Sync`, and every `git2::Diff` borrows
//! the repository it came from. The repository therefore lives on one worker
//! thread which also keeps the live diffs in a [`Session`]. Async callers send
//! jobs over an unbounded queue and await a oneshot reply.

use git2::{Oid, Repository};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};
use crate::git::tree::Tree;

pub(crate) type DiffId = u64;
pub(crate) type BuilderId = u64;

/// Worker-side state: the repository and the diffs and tree builders that
/// borrow it.
pub(crate) struct Session<'r> {
    pub repo: &'r Repository,
    diffs: HashMap<DiffId, git2::Diff<'r>>,
    builders: HashMap<BuilderId, git2::TreeBuilder<'r>>,
    next_handle: u64,
}

impl<'r> Session<'r> {
    fn next_handle(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    pub fn store_diff(&mut self, diff: git2::Diff<'r>) -> DiffId {
        let id = self.next_handle();
        self.diffs.insert(id, diff);
        id
    }

    pub fn diff(&self, id: DiffId) -> Result<&git2::Diff<'r>> {
        self.diffs
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("diff #{id}")))
    }

    pub fn diff_mut(&mut self, id: DiffId) -> Result<&mut git2::Diff<'r>> {
        self.diffs
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("diff #{id}")))
    }

    pub fn store_builder(&mut self, builder: git2::TreeBuilder<'r>) -> BuilderId {
        let id = self.next_handle();
        self.builders.insert(id, builder);
        id
    }

    pub fn builder_mut(&mut self, id: BuilderId) -> Result<&mut git2::TreeBuilder<'r>> {
        self.builders
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("tree builder #{id}")))
    }

    /// Handle ids are unique across kinds, so one release path serves both.
    fn release(&mut self, id: u64) {
        if self.diffs.remove(&id).is_none() {
            self.builders.remove(&id);
        }
    }
}

type Job = Box<dyn for<'r> FnOnce(&mut Session<'r>) + Send>;

fn job<F>(f: F) -> Job
where
    F: for<'r> FnOnce(&mut Session<'r>) + Send + 'static,
{
    Box::new(f)
}

/// A tree to resolve: an object id, or any revision `git rev-parse` accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeSpec {
    Oid(Oid),
    Revision(String),
}

impl From<Oid> for TreeSpec {
    fn from(id: Oid) -> Self {
        TreeSpec::Oid(id)
    }
}

impl From<&str> for TreeSpec {
    fn from(revision: &str) -> Self {
        TreeSpec::Revision(revision.to_string())
    }
}

impl From<String> for TreeSpec {
    fn from(revision: String) -> Self {
        TreeSpec::Revision(revision)
    }
}

/// Cloneable async handle to a repository served by a worker thread.
///
/// The worker exits once every handle, and every [`Diff`](crate::Diff) or
/// [`TreeBuilder`](crate::TreeBuilder) made through one, has been dropped.
#[derive(Clone)]
pub struct GitRepository {
    jobs: mpsc::UnboundedSender<Job>,
    path: String,
}

impl GitRepository {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let repo = Repository::discover(&path)
            .map_err(|e| Error::not_found_or(e, format!("repository at {path_str}")))?;

        let (jobs, queue) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("gitkit-repo".to_string())
            .spawn(move || run_worker(repo, queue))
            .map_err(|_| Error::WorkerGone)?;

        tracing::debug!("Opened repository at {}", path_str);

        Ok(Self {
            jobs,
            path: path_str,
        })
    }

    /// The path the repository was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Runs `f` against the repository on the worker thread.
    pub async fn with_repo<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Repository) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.with_session(move |session| f(session.repo)).await
    }

    pub(crate) async fn with_session<F, T>(&self, f: F) -> Result<T>
    where
        F: for<'r> FnOnce(&mut Session<'r>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        self.jobs
            .send(job(move |session| {
                // The caller may have stopped waiting; nothing to report then.
                let _ = reply.send(f(session));
            }))
            .map_err(|_| Error::WorkerGone)?;

        response.await.map_err(|_| Error::WorkerGone)?
    }

    /// Drops the engine diff or tree builder behind a handle.
    /// Fire-and-forget, so it can run from `Drop`.
    pub(crate) fn release_handle(&self, id: u64) {
        let _ = self.jobs.send(job(move |session| session.release(id)));
    }

    /// Resolves `spec` to a root [`Tree`], peeling commits and tags.
    pub async fn find_tree(&self, spec: impl Into<TreeSpec>) -> Result<Arc<Tree>> {
        let spec = spec.into();
        self.with_repo(move |repo| {
            let object = match &spec {
                TreeSpec::Oid(id) => repo
                    .find_object(*id, None)
                    .map_err(|e| Error::not_found_or(e, id.to_string()))?,
                TreeSpec::Revision(revision) => repo
                    .revparse_single(revision)
                    .map_err(|e| Error::not_found_or(e, revision.clone()))?,
            };
            let tree = object.peel_to_tree()?;
            Ok(Arc::new(Tree::snapshot(&tree, String::new())))
        })
        .await
    }

    /// Loads the tree object `id`, recording `path` as where it was reached.
    pub(crate) async fn resolve_tree(&self, id: Oid, path: String) -> Result<Arc<Tree>> {
        self.with_repo(move |repo| {
            let tree = repo
                .find_tree(id)
                .map_err(|e| Error::not_found_or(e, format!("tree {id}")))?;
            Ok(Arc::new(Tree::snapshot(&tree, path)))
        })
        .await
    }
}

fn run_worker(repo: Repository, mut queue: mpsc::UnboundedReceiver<Job>) {
    let mut session = Session {
        repo: &repo,
        diffs: HashMap::new(),
        builders: HashMap::new(),
        next_handle: 0,
    };

    while let Some(job) = queue.blocking_recv() {
        job(&mut session);
    }

    tracing::debug!(
        "Repository worker stopped with {} live diffs and {} live tree builders",
        session.diffs.len(),
        session.builders.len()
    );
}
