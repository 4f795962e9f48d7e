use git2::Oid;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::git::repository::{BuilderId, GitRepository};
use crate::git::tree::Tree;
use crate::models::EntryKind;

/// Handle to a tree builder held by the repository worker.
///
/// A builder starts from a copy of one tree's entries. Edits never touch that
/// tree; [`TreeBuilder::write`] stores the edited entries as a new tree object.
/// Dropping the handle frees the engine builder.
pub struct TreeBuilder {
    id: BuilderId,
    repo: GitRepository,
    path: String,
}

impl Tree {
    /// Starts a builder seeded with this tree's entries.
    pub async fn builder(&self, repo: &GitRepository) -> Result<TreeBuilder> {
        let tree = self.id();
        let id = repo
            .with_session(move |session| {
                let tree = session
                    .repo
                    .find_tree(tree)
                    .map_err(|e| Error::not_found_or(e, format!("tree {tree}")))?;
                let builder = session.repo.treebuilder(Some(&tree))?;
                Ok(session.store_builder(builder))
            })
            .await?;

        Ok(TreeBuilder {
            id,
            repo: repo.clone(),
            path: self.path().to_string(),
        })
    }
}

impl TreeBuilder {
    /// Adds or replaces the entry `name`. The object must already exist.
    pub async fn insert(&mut self, name: &str, id: Oid, kind: EntryKind) -> Result<()> {
        let builder = self.id;
        let name = name.to_string();
        self.repo
            .with_session(move |session| {
                session.builder_mut(builder)?.insert(name.as_str(), id, kind.filemode())?;
                Ok(())
            })
            .await
    }

    /// Removes the entry `name`.
    pub async fn remove(&mut self, name: &str) -> Result<()> {
        let builder = self.id;
        let name = name.to_string();
        self.repo
            .with_session(move |session| {
                let builder = session.builder_mut(builder)?;
                if builder.get(name.as_str())?.is_none() {
                    return Err(Error::NotFound(name));
                }
                builder.remove(name.as_str())?;
                Ok(())
            })
            .await
    }

    pub async fn len(&self) -> Result<usize> {
        let builder = self.id;
        self.repo
            .with_session(move |session| Ok(session.builder_mut(builder)?.len()))
            .await
    }

    /// Writes the current entries as a tree object and returns it. The tree
    /// keeps the path of the tree the builder started from.
    pub async fn write(&self) -> Result<Arc<Tree>> {
        let builder = self.id;
        let path = self.path.clone();
        self.repo
            .with_session(move |session| {
                let id = session.builder_mut(builder)?.write()?;
                let tree = session.repo.find_tree(id)?;
                tracing::debug!("Wrote tree {} with {} entries", id, tree.len());
                Ok(Arc::new(Tree::snapshot(&tree, path)))
            })
            .await
    }
}

impl Drop for TreeBuilder {
    fn drop(&mut self) {
        self.repo.release_handle(self.id);
    }
}

impl std::fmt::Debug for TreeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeBuilder")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish()
    }
}
