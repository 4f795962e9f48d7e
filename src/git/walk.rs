//! Breadth-first tree walk delivered as a stream of events.
//!
//! A walk is built with [`Tree::walk`] and does nothing until
//! [`TreeWalk::start`]. The producer task then resolves subtrees concurrently
//! (no cap on how many are in flight) and reports through an unbounded channel:
//! any number of [`WalkEvent::Entry`], then exactly one [`WalkEvent::End`] or
//! [`WalkEvent::Error`].
//!
//! Every entry of a given tree is reported together, but the order in which
//! sibling subtrees finish resolving is not fixed. Dropping the [`WalkEvents`]
//! receiver stops the producer before its next fan-out.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::error::{Error, Result};
use crate::git::repository::GitRepository;
use crate::git::tree::{EntryKey, Tree, TreeEntry};
use crate::options::{normalize, OptionsInput, WalkOptions};

#[derive(Debug)]
pub enum WalkEvent {
    Entry(TreeEntry),
    /// Every emitted entry, in emission order.
    End(Vec<TreeEntry>),
    /// Always [`Error::TraversalAborted`]; no `End` follows.
    Error(Error),
}

/// A walk that has been configured but not started.
pub struct TreeWalk {
    repo: GitRepository,
    root: Arc<Tree>,
    options: WalkOptions,
}

struct WalkState {
    /// Trees handed to the walk whose entries have not been processed yet.
    pending: usize,
    visited: HashSet<EntryKey>,
    found: Vec<TreeEntry>,
}

impl Tree {
    /// Prepares a breadth-first walk rooted at this tree. Options are
    /// normalized here, so a bad field fails before [`TreeWalk::start`]; no
    /// I/O happens until then.
    pub fn walk(
        self: &Arc<Self>,
        repo: &GitRepository,
        options: impl Into<OptionsInput<WalkOptions>>,
    ) -> Result<TreeWalk> {
        Ok(TreeWalk {
            repo: repo.clone(),
            root: Arc::clone(self),
            options: normalize(options)?,
        })
    }
}

impl TreeWalk {
    /// Spawns the producer on the current tokio runtime.
    pub fn start(self) -> WalkEvents {
        let (events, receiver) = mpsc::unbounded_channel();
        tokio::spawn(self.run(events));
        WalkEvents { receiver }
    }

    async fn run(self, events: mpsc::UnboundedSender<WalkEvent>) {
        let started = Instant::now();
        let mut state = WalkState {
            pending: 1,
            visited: HashSet::new(),
            found: Vec::new(),
        };
        let mut resolving: JoinSet<Result<Arc<Tree>>> = JoinSet::new();
        let mut next: Result<Arc<Tree>> = Ok(Arc::clone(&self.root));

        loop {
            state.pending -= 1;

            match next {
                Ok(tree) => {
                    if !self.visit(&tree, &mut state, &mut resolving, &events) {
                        tracing::debug!("Walk of {} dropped by its consumer", self.root.id());
                        resolving.abort_all();
                        return;
                    }
                }
                Err(err) => {
                    tracing::warn!("Walk of {} aborted: {}", self.root.id(), err);
                    resolving.abort_all();
                    let _ = events.send(WalkEvent::Error(err));
                    return;
                }
            }

            if state.pending == 0 {
                break;
            }

            next = match resolving.join_next().await {
                Some(Ok(resolved)) => resolved,
                // Only a panicking resolution task gets here; nothing aborts
                // the set while the loop is still joining.
                Some(Err(_)) => Err(Error::TraversalAborted {
                    path: self.root.path().to_string(),
                    source: Box::new(Error::WorkerGone),
                }),
                None => break,
            };
        }

        tracing::info!(
            "Walked {}: {} entries in {:?}",
            self.root.id(),
            state.found.len(),
            started.elapsed()
        );
        let _ = events.send(WalkEvent::End(state.found));
    }

    /// Emits the unseen entries of `tree` and schedules its subtrees.
    /// Returns `false` once the consumer has gone away.
    fn visit(
        &self,
        tree: &Arc<Tree>,
        state: &mut WalkState,
        resolving: &mut JoinSet<Result<Arc<Tree>>>,
        events: &mpsc::UnboundedSender<WalkEvent>,
    ) -> bool {
        for entry in tree.entries() {
            if !state.visited.insert(entry.key()) {
                continue;
            }

            if !self.options.blobs_only || entry.is_file() {
                if events.send(WalkEvent::Entry(entry.clone())).is_err() {
                    return false;
                }
                state.found.push(entry.clone());
            }

            if entry.is_tree() {
                if events.is_closed() {
                    return false;
                }
                state.pending += 1;
                tracing::trace!("Resolving subtree {}", entry.path());
                let repo = self.repo.clone();
                resolving.spawn(async move {
                    entry
                        .to_tree(&repo)
                        .await
                        .map_err(|source| Error::TraversalAborted {
                            path: entry.path(),
                            source: Box::new(source),
                        })
                });
            }
        }
        true
    }
}

/// Receiving end of a started walk.
pub struct WalkEvents {
    receiver: mpsc::UnboundedReceiver<WalkEvent>,
}

impl WalkEvents {
    /// Next event, or `None` after the terminal event has been taken.
    pub async fn recv(&mut self) -> Option<WalkEvent> {
        self.receiver.recv().await
    }

    /// Drains the walk, returning the final entry list or its error.
    pub async fn collect(mut self) -> Result<Vec<TreeEntry>> {
        while let Some(event) = self.recv().await {
            match event {
                WalkEvent::Entry(_) => {}
                WalkEvent::End(entries) => return Ok(entries),
                WalkEvent::Error(err) => return Err(err),
            }
        }
        Err(Error::WorkerGone)
    }
}
