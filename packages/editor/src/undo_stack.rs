//! # Command History
//!
//! Records every tree mutation as a reversible command so the user can
//! step backward and forward through the edit sequence.
//!
//! ## Design
//!
//! - The history owns the tree index; all mutation goes through
//!   [`CommandHistory::execute`], so nothing can change the tree behind
//!   the history's back
//! - Applying a mutation yields its inverse sequence, captured from
//!   state at apply time; undo replays those inverses verbatim
//! - New work clears the redo stack (linear history)
//! - Batches group several mutations into one undo step (bulk import,
//!   multi-delete)
//! - Depth is unbounded; bounding is a deployment decision, not part of
//!   this contract

use crate::errors::TreeError;
use crate::mutations::Mutation;
use crate::tree::TreeIndex;

/// A group of mutations undone/redone together.
#[derive(Debug, Clone)]
pub struct MutationBatch {
    /// Forward mutations, in application order.
    pub mutations: Vec<Mutation>,

    /// Inverse mutations, ordered so that applying them front to back
    /// unwinds the batch (most recent mutation's inverse first).
    pub inverses: Vec<Mutation>,

    /// Optional label for history display.
    pub description: Option<String>,
}

/// Undo/redo engine and sole owner of the tree index for one open
/// document.
#[derive(Debug, Default)]
pub struct CommandHistory {
    tree: TreeIndex,

    /// Applied batches, most recent last.
    undo_stack: Vec<MutationBatch>,

    /// Undone batches, most recent last.
    redo_stack: Vec<MutationBatch>,

    /// Batch currently being built, if any.
    current_batch: Option<MutationBatch>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-built tree (a load); history starts empty.
    pub fn with_tree(tree: TreeIndex) -> Self {
        Self {
            tree,
            ..Self::default()
        }
    }

    /// Read access to the tree. Mutation only happens through
    /// [`execute`](Self::execute), [`undo`](Self::undo), and
    /// [`redo`](Self::redo).
    pub fn tree(&self) -> &TreeIndex {
        &self.tree
    }

    /// Apply a mutation and record it for undo. On failure the tree and
    /// the history are both left exactly as they were.
    pub fn execute(&mut self, mutation: Mutation) -> Result<(), TreeError> {
        let inverse = mutation.apply(&mut self.tree)?;
        tracing::debug!(kind = mutation.kind(), target = mutation.target(), "executed mutation");

        self.redo_stack.clear();
        if let Some(batch) = &mut self.current_batch {
            // The newest mutation must be unwound first.
            let mut inverses = inverse;
            inverses.append(&mut batch.inverses);
            batch.inverses = inverses;
            batch.mutations.push(mutation);
        } else {
            self.undo_stack.push(MutationBatch {
                mutations: vec![mutation],
                inverses: inverse,
                description: None,
            });
        }
        Ok(())
    }

    /// Start grouping mutations into a single undo step.
    pub fn begin_batch(&mut self, description: Option<String>) {
        self.current_batch = Some(MutationBatch {
            mutations: Vec::new(),
            inverses: Vec::new(),
            description,
        });
    }

    /// Close the current batch and push it as one undo step. Empty
    /// batches are dropped.
    pub fn end_batch(&mut self) {
        if let Some(batch) = self.current_batch.take() {
            if !batch.mutations.is_empty() {
                self.undo_stack.push(batch);
            }
        }
    }

    /// Undo the most recent batch by replaying its captured inverses.
    pub fn undo(&mut self) -> Result<(), TreeError> {
        let batch = self.undo_stack.pop().ok_or(TreeError::NothingToUndo)?;
        for inverse in &batch.inverses {
            // Inverses target state the forward mutations produced, so
            // they cannot fail against a consistent tree.
            inverse.apply(&mut self.tree)?;
        }
        tracing::debug!(mutations = batch.mutations.len(), "undid batch");
        self.redo_stack.push(batch);
        Ok(())
    }

    /// Redo the most recently undone batch by re-applying its forward
    /// mutations. The stored inverses stay exact because undo restored
    /// the precise pre-batch state.
    pub fn redo(&mut self) -> Result<(), TreeError> {
        let batch = self.redo_stack.pop().ok_or(TreeError::NothingToRedo)?;
        for mutation in &batch.mutations {
            mutation.apply(&mut self.tree)?;
        }
        tracing::debug!(mutations = batch.mutations.len(), "redid batch");
        self.undo_stack.push(batch);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Label of the batch the next undo would revert.
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().and_then(|b| b.description.as_deref())
    }

    /// Label of the batch the next redo would re-apply.
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().and_then(|b| b.description.as_deref())
    }

    /// Drop all history. The tree is untouched.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
    }
}
