//! # Tree Mutations
//!
//! High-level semantic operations on the annotation tree.
//!
//! ## Design Principles
//!
//! 1. **Intent-preserving**: Each mutation represents one user-visible
//!    operation
//! 2. **Validated**: Structural constraints are checked before anything
//!    changes; a failed mutation leaves the tree untouched
//! 3. **Invertible**: Applying a mutation yields the exact mutation
//!    sequence that undoes it, built from state captured at apply time
//!
//! ## Mutation Semantics
//!
//! ### Create
//! - Inserts a fully-formed record as a leaf under the given parent
//! - Fails on duplicate id or unknown parent
//!
//! ### Delete
//! - `Promote` (default): children are spliced into the deleted node's
//!   place, relative order preserved
//! - `Cascade`: the whole subtree goes
//!
//! ### Edit
//! - Metadata only (`text`, `category`, `image_data`, `description`);
//!   structural fields have their own mutations
//!
//! ### Move / Reparent
//! - Sibling reorder / subtree relocation; reparenting into a node's own
//!   subtree fails with `CycleDetected`

use crate::errors::TreeError;
use crate::tree::{FieldPatch, OrphanPolicy, TreeIndex};
use pagemark_model::{ParentRef, RegionRecord};
use serde::{Deserialize, Serialize};

/// Semantic mutations against the tree index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    /// Insert a new region as a leaf under `parent`.
    Create {
        record: RegionRecord,
        parent: ParentRef,
        position: Option<usize>,
    },

    /// Remove a region; `policy` decides what happens to its children.
    Delete { id: String, policy: OrphanPolicy },

    /// Patch a region's mutable metadata.
    Edit { id: String, patch: FieldPatch },

    /// Reorder a region within its current parent.
    Move { id: String, position: usize },

    /// Relocate a region (and its subtree) under a new parent.
    Reparent {
        id: String,
        new_parent: ParentRef,
        position: Option<usize>,
    },
}

impl Mutation {
    /// A short name for logging and history display.
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::Create { .. } => "create",
            Mutation::Delete { .. } => "delete",
            Mutation::Edit { .. } => "edit",
            Mutation::Move { .. } => "move",
            Mutation::Reparent { .. } => "reparent",
        }
    }

    /// The id of the region this mutation targets.
    pub fn target(&self) -> &str {
        match self {
            Mutation::Create { record, .. } => &record.id,
            Mutation::Delete { id, .. }
            | Mutation::Edit { id, .. }
            | Mutation::Move { id, .. }
            | Mutation::Reparent { id, .. } => id,
        }
    }

    /// Check structural constraints without applying.
    pub fn validate(&self, tree: &TreeIndex) -> Result<(), TreeError> {
        match self {
            Mutation::Create { record, parent, .. } => {
                if tree.contains(&record.id) {
                    return Err(TreeError::DuplicateId(record.id.clone()));
                }
                if let Some(parent_id) = parent.as_region() {
                    if !tree.contains(parent_id) {
                        return Err(TreeError::UnknownParent(parent_id.to_string()));
                    }
                }
                Ok(())
            }

            Mutation::Delete { id, .. } | Mutation::Edit { id, .. } | Mutation::Move { id, .. } => {
                tree.require(id).map(|_| ())
            }

            Mutation::Reparent { id, new_parent, .. } => {
                tree.require(id)?;
                if let Some(parent_id) = new_parent.as_region() {
                    if !tree.contains(parent_id) {
                        return Err(TreeError::UnknownParent(parent_id.to_string()));
                    }
                }
                if tree.would_create_cycle(id, new_parent) {
                    return Err(TreeError::CycleDetected {
                        id: id.clone(),
                        new_parent: new_parent.as_region().unwrap_or("ROOT").to_string(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Apply to the tree and return the mutation sequence that inverts
    /// this one exactly. Inverses are built from snapshots the tree ops
    /// hand back at apply time, never recomputed later, so a chain of
    /// undos after compound edits replays precisely.
    ///
    /// On error nothing was applied.
    pub fn apply(&self, tree: &mut TreeIndex) -> Result<Vec<Mutation>, TreeError> {
        self.validate(tree)?;

        match self {
            Mutation::Create {
                record,
                parent,
                position,
            } => {
                tree.insert(record.clone(), parent.clone(), *position)?;
                // A freshly created region is a leaf; deleting it undoes
                // the creation exactly.
                Ok(vec![Mutation::Delete {
                    id: record.id.clone(),
                    policy: OrphanPolicy::Promote,
                }])
            }

            Mutation::Delete { id, policy } => {
                let removal = tree.remove(id, *policy)?;
                let mut inverse = Vec::with_capacity(removal.removed.len() + removal.promoted.len());
                // Re-create every removed region, pre-order, at its old
                // parent and position.
                for gone in removal.removed {
                    inverse.push(Mutation::Create {
                        record: gone.record,
                        parent: gone.parent,
                        position: Some(gone.position),
                    });
                }
                // Then pull promoted children back under the restored node.
                for (slot, child) in removal.promoted.iter().enumerate() {
                    inverse.push(Mutation::Reparent {
                        id: child.clone(),
                        new_parent: ParentRef::Region(id.clone()),
                        position: Some(slot),
                    });
                }
                Ok(inverse)
            }

            Mutation::Edit { id, patch } => {
                let previous = tree.update(id, patch)?;
                Ok(vec![Mutation::Edit {
                    id: id.clone(),
                    patch: previous,
                }])
            }

            Mutation::Move { id, position } => {
                let old_position = tree.move_child(id, *position)?;
                Ok(vec![Mutation::Move {
                    id: id.clone(),
                    position: old_position,
                }])
            }

            Mutation::Reparent {
                id,
                new_parent,
                position,
            } => {
                let (old_parent, old_position) = tree.reparent(id, new_parent.clone(), *position)?;
                Ok(vec![Mutation::Reparent {
                    id: id.clone(),
                    new_parent: old_parent,
                    position: Some(old_position),
                }])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_model::{rect_coords, Category, Point, RegionDraft};

    fn record(id: &str, index: u32) -> RegionRecord {
        RegionDraft::new("doc.pdf", 1, rect_coords(Point::new(0.0, 0.0), Point::new(1.0, 1.0)))
            .with_category(Category::Text)
            .into_record(id.to_string(), index, ParentRef::Root)
            .unwrap()
    }

    #[test]
    fn mutation_serialization_round_trips() {
        let mutation = Mutation::Edit {
            id: "r-1".to_string(),
            patch: FieldPatch {
                description: Some("a table of results".to_string()),
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&mutation).unwrap();
        let back: Mutation = serde_json::from_str(&json).unwrap();
        assert_eq!(mutation, back);
    }

    #[test]
    fn create_inverse_is_delete() {
        let mut tree = TreeIndex::new();
        let mutation = Mutation::Create {
            record: record("a", 0),
            parent: ParentRef::Root,
            position: None,
        };
        let inverse = mutation.apply(&mut tree).unwrap();
        assert_eq!(tree.len(), 1);

        for m in &inverse {
            m.apply(&mut tree).unwrap();
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn delete_promote_inverse_restores_hierarchy() {
        let mut tree = TreeIndex::new();
        for (i, id) in ["p", "a"].iter().enumerate() {
            Mutation::Create {
                record: record(id, i as u32),
                parent: ParentRef::Root,
                position: None,
            }
            .apply(&mut tree)
            .unwrap();
        }
        for (i, id) in ["b", "c"].iter().enumerate() {
            Mutation::Create {
                record: record(id, 2 + i as u32),
                parent: ParentRef::Region("a".to_string()),
                position: None,
            }
            .apply(&mut tree)
            .unwrap();
        }

        let before = tree.clone();
        let inverse = Mutation::Delete {
            id: "a".to_string(),
            policy: OrphanPolicy::Promote,
        }
        .apply(&mut tree)
        .unwrap();

        // Children promoted into a's place.
        assert_eq!(tree.roots(), &["p", "b", "c"]);

        for m in &inverse {
            m.apply(&mut tree).unwrap();
        }
        assert_eq!(tree, before);
    }

    #[test]
    fn delete_cascade_inverse_rebuilds_subtree() {
        let mut tree = TreeIndex::new();
        Mutation::Create {
            record: record("a", 0),
            parent: ParentRef::Root,
            position: None,
        }
        .apply(&mut tree)
        .unwrap();
        Mutation::Create {
            record: record("b", 1),
            parent: ParentRef::Region("a".to_string()),
            position: None,
        }
        .apply(&mut tree)
        .unwrap();

        let before = tree.clone();
        let inverse = Mutation::Delete {
            id: "a".to_string(),
            policy: OrphanPolicy::Cascade,
        }
        .apply(&mut tree)
        .unwrap();
        assert!(tree.is_empty());

        for m in &inverse {
            m.apply(&mut tree).unwrap();
        }
        assert_eq!(tree, before);
    }

    #[test]
    fn failed_mutation_leaves_tree_unchanged() {
        let mut tree = TreeIndex::new();
        Mutation::Create {
            record: record("a", 0),
            parent: ParentRef::Root,
            position: None,
        }
        .apply(&mut tree)
        .unwrap();

        let before = tree.clone();
        let err = Mutation::Create {
            record: record("a", 1),
            parent: ParentRef::Root,
            position: None,
        }
        .apply(&mut tree)
        .unwrap_err();
        assert_eq!(err, TreeError::DuplicateId("a".to_string()));
        assert_eq!(tree, before);
    }
}
