//! # Pagemark Editor
//!
//! The annotation engine: a tree-consistent mutation core for labeled
//! page regions, with full undo/redo and deterministic persistence.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: region records, categories, geometry │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: tree + mutations + history          │
//! │  - TreeIndex: id→record + parent→children   │
//! │  - Mutation: create/delete/edit/move/       │
//! │    reparent, each yielding its exact inverse│
//! │  - CommandHistory: owns the tree, undo/redo │
//! │  - codec: exchange-format save/load         │
//! │  - query: filters + sibling context         │
//! │  - import/augment: collaborator adapters    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **One owner**: the command history owns the tree index; every
//!    mutation flows through `execute`, so history and tree can never
//!    disagree
//! 2. **Validate, then apply**: a failed operation leaves the tree
//!    exactly as it was: no partial writes, no silent repair
//! 3. **Exact inverses**: applying a mutation returns the mutation
//!    sequence that undoes it, built from captured state, so undo
//!    chains replay precisely
//! 4. **All-or-nothing loads**: a file either validates into a fully
//!    consistent tree or produces an error and no tree
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagemark_editor::{AnnotationDocument, OrphanPolicy};
//! use pagemark_model::{Category, ParentRef, Point, RegionDraft, rect_coords};
//!
//! let mut doc = AnnotationDocument::new("paper.pdf");
//!
//! let outline = rect_coords(Point::new(10.0, 10.0), Point::new(200.0, 80.0));
//! let id = doc.create_region(
//!     RegionDraft::new("paper.pdf", 1, outline).with_category(Category::Title),
//!     ParentRef::Root,
//!     None,
//! )?;
//!
//! doc.undo()?;            // region gone
//! doc.redo()?;            // region back
//! doc.save_as("paper.json")?;
//! ```

pub mod augment;
pub mod codec;
mod document;
mod errors;
pub mod import;
mod mutations;
pub mod query;
mod tree;
mod undo_stack;

pub use augment::{AugmentOptions, AugmentReport, DescriptionProvider, DescriptionRequest};
pub use document::AnnotationDocument;
pub use errors::{EditorError, ExchangeError, TreeError};
pub use import::{import_partitions, ImportReport, PartitionItem};
pub use mutations::Mutation;
pub use query::{DescriptionFilter, RegionFilter};
pub use tree::{FieldPatch, OrphanPolicy, Removal, RemovedRegion, TreeIndex};
pub use undo_stack::{CommandHistory, MutationBatch};

// Re-export the model types callers need for every operation.
pub use pagemark_model::{Category, ParentRef, Point, RegionDraft, RegionRecord};
