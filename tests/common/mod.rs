#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use git2::{Oid, Repository, Signature};
use gitkit::GitRepository;
use tempfile::TempDir;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub enum Node<'a> {
    File(&'a str),
    Executable(&'a str),
    Dir(Oid),
}

/// A throwaway repository built directly through git2.
pub struct Fixture {
    pub dir: TempDir,
    pub git: Repository,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let git = Repository::init(dir.path()).unwrap();
        Self { dir, git }
    }

    pub fn open(&self) -> GitRepository {
        GitRepository::open(self.dir.path()).unwrap()
    }

    pub fn blob(&self, content: &str) -> Oid {
        self.git.blob(content.as_bytes()).unwrap()
    }

    pub fn tree(&self, entries: &[(&str, Node<'_>)]) -> Oid {
        let mut builder = self.git.treebuilder(None).unwrap();
        for (name, node) in entries {
            let (id, mode) = match node {
                Node::File(content) => (self.blob(content), 0o100644),
                Node::Executable(content) => (self.blob(content), 0o100755),
                Node::Dir(id) => (*id, 0o040000),
            };
            builder.insert(*name, id, mode).unwrap();
        }
        builder.write().unwrap()
    }

    pub fn commit(&self, tree: Oid, message: &str) -> Oid {
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let tree = self.git.find_tree(tree).unwrap();
        let parent = self
            .git
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        self.git
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    pub fn write_file(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    /// Stages `rel` from the working directory and returns the index tree.
    pub fn stage(&self, rel: &str) -> Oid {
        let mut index = self.git.index().unwrap();
        index.add_path(Path::new(rel)).unwrap();
        index.write().unwrap();
        index.write_tree().unwrap()
    }

    /// Deletes the loose object file for `id`, leaving references to it
    /// dangling.
    pub fn remove_object(&self, id: Oid) {
        let hex = id.to_string();
        let path = self.git.path().join("objects").join(&hex[..2]).join(&hex[2..]);
        fs::remove_file(path).unwrap();
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Records the message of every event seen on the current thread while the
/// guard returned by [`LogCapture::install`] is alive.
#[derive(Clone, Default)]
pub struct LogCapture {
    messages: Arc<Mutex<Vec<String>>>,
}

impl LogCapture {
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(capture.clone()));
        (capture, guard)
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.messages().iter().filter(|m| m.contains(needle)).count()
    }
}

struct MessageVisitor<'a>(&'a mut Option<String>);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = Some(format!("{value:?}"));
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut message = None;
        event.record(&mut MessageVisitor(&mut message));
        if let Some(message) = message {
            self.messages.lock().unwrap().push(message);
        }
    }
}
