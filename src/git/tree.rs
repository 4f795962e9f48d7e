use git2::Oid;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::git::repository::GitRepository;
use crate::models::EntryKind;

#[derive(Debug, Clone)]
struct RawEntry {
    name: String,
    filemode: i32,
    id: Oid,
    kind: EntryKind,
}

/// Immutable snapshot of one tree object.
///
/// Trees are shared as `Arc<Tree>`; every [`TreeEntry`] handed out keeps a
/// handle to the tree it came from.
#[derive(Debug)]
pub struct Tree {
    id: Oid,
    path: String,
    entries: Vec<RawEntry>,
}

impl Tree {
    pub(crate) fn snapshot(tree: &git2::Tree<'_>, path: String) -> Self {
        let entries = tree
            .iter()
            .map(|entry| RawEntry {
                name: String::from_utf8_lossy(entry.name_bytes()).into_owned(),
                filemode: entry.filemode(),
                id: entry.id(),
                kind: EntryKind::from_filemode(entry.filemode()),
            })
            .collect();

        Self {
            id: tree.id(),
            path,
            entries,
        }
    }

    pub fn id(&self) -> Oid {
        self.id
    }

    /// Path this tree was reached by, like `src/git`. Empty for a root tree.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Entry at position `index`, in the tree's stored order.
    pub fn entry_by_index(self: &Arc<Self>, index: usize) -> Result<TreeEntry> {
        if index >= self.entries.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entry_at(index, None))
    }

    /// Entry named `name` directly inside this tree.
    pub fn entry_by_name(self: &Arc<Self>, name: &str) -> Result<TreeEntry> {
        self.entries
            .iter()
            .position(|entry| entry.name == name)
            .map(|index| self.entry_at(index, None))
            .ok_or_else(|| Error::NotFound(join_path(&self.path, name)))
    }

    /// Immediate entries, in stored order. Does not descend into subtrees.
    pub fn entries(self: &Arc<Self>) -> Vec<TreeEntry> {
        (0..self.entries.len())
            .map(|index| self.entry_at(index, None))
            .collect()
    }

    /// Looks up a slash-delimited path such as `src/git/tree.rs`, descending
    /// as many levels as needed. Empty and `.` segments are skipped; a path
    /// with a `..` segment is never found.
    ///
    /// The entry's parent is the deepest tree containing it, and
    /// [`TreeEntry::dir_to_parent`] records the directory part of `path`.
    pub async fn get_entry(self: &Arc<Self>, repo: &GitRepository, path: &str) -> Result<TreeEntry> {
        let mut segments: Vec<&str> = path
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect();
        if segments.contains(&"..") {
            return Err(Error::NotFound(path.to_string()));
        }
        let Some(name) = segments.pop() else {
            return Err(Error::NotFound(path.to_string()));
        };
        let dir = segments.join("/");
        let dir = dir.as_str();

        let parent = if dir.is_empty() {
            Arc::clone(self)
        } else {
            let root = self.id;
            let dir_owned = dir.to_string();
            let parent_path = join_path(&self.path, dir);
            repo.with_repo(move |repo| {
                let root = repo.find_tree(root)?;
                let entry = root
                    .get_path(Path::new(&dir_owned))
                    .map_err(|e| Error::not_found_or(e, dir_owned.clone()))?;
                let tree = entry
                    .to_object(repo)
                    .and_then(|object| object.peel_to_tree())
                    .map_err(|_| Error::NotFound(format!("{dir_owned} is not a directory")))?;
                Ok(Arc::new(Tree::snapshot(&tree, parent_path)))
            })
            .await?
        };

        let index = parent
            .entries
            .iter()
            .position(|entry| entry.name == name)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;

        Ok(parent.entry_at(index, Some(dir.to_string())))
    }

    fn entry_at(self: &Arc<Self>, index: usize, dir_to_parent: Option<String>) -> TreeEntry {
        TreeEntry {
            raw: self.entries[index].clone(),
            index,
            parent: Arc::clone(self),
            dir_to_parent,
        }
    }
}

/// Identity of an entry for deduplication: the owning tree object and the
/// entry's position in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct EntryKey {
    tree: Oid,
    index: usize,
}

/// One named element of a [`Tree`], paired with the tree it was read from.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    raw: RawEntry,
    index: usize,
    parent: Arc<Tree>,
    dir_to_parent: Option<String>,
}

impl TreeEntry {
    pub fn name(&self) -> &str {
        &self.raw.name
    }

    pub fn id(&self) -> Oid {
        self.raw.id
    }

    pub fn filemode(&self) -> i32 {
        self.raw.filemode
    }

    pub fn kind(&self) -> EntryKind {
        self.raw.kind
    }

    /// Position within the parent tree.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn parent(&self) -> &Arc<Tree> {
        &self.parent
    }

    /// Directory part of the path this entry was looked up by; only set by
    /// [`Tree::get_entry`].
    pub fn dir_to_parent(&self) -> Option<&str> {
        self.dir_to_parent.as_deref()
    }

    /// Full path from the root the parent tree was reached from.
    pub fn path(&self) -> String {
        join_path(&self.parent.path, &self.raw.name)
    }

    pub fn is_file(&self) -> bool {
        self.raw.kind.is_file()
    }

    pub fn is_tree(&self) -> bool {
        self.raw.kind.is_tree()
    }

    /// Resolves a tree-kind entry into its child [`Tree`].
    pub async fn to_tree(&self, repo: &GitRepository) -> Result<Arc<Tree>> {
        if !self.is_tree() {
            return Err(Error::NotFound(format!("{} is not a directory", self.path())));
        }
        repo.resolve_tree(self.raw.id, self.path()).await
    }

    pub(crate) fn key(&self) -> EntryKey {
        EntryKey {
            tree: self.parent.id,
            index: self.index,
        }
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}
