//! # Document Handle
//!
//! The lifecycle object for one open annotation set: the command
//! history (which owns the tree), the backing file, and a dirty flag.
//!
//! ## Lifecycle
//!
//! ```text
//! Load/New → Mutate (execute/undo/redo) → Save
//!    ↓              ↓                       ↓
//!  File        Tree + History             File
//! ```
//!
//! All writes go through [`AnnotationDocument::execute`]; the
//! convenience methods below only assemble mutations. The engine
//! expects a single logical mutator: background work (import,
//! augmentation) computes its proposals off to the side and submits
//! them here as ordinary mutations when ready. Callers that receive
//! completions concurrently wrap the document in a `Mutex` around each
//! call; nothing inside blocks on I/O.

use crate::codec;
use crate::errors::{EditorError, TreeError};
use crate::mutations::Mutation;
use crate::tree::{FieldPatch, OrphanPolicy, TreeIndex};
use crate::undo_stack::CommandHistory;
use pagemark_model::{new_region_id, ParentRef, RegionDraft};
use std::path::{Path, PathBuf};

/// One open annotation document.
#[derive(Debug, Default)]
pub struct AnnotationDocument {
    /// Source document (PDF path or URL) the annotations refer to.
    document_ref: String,

    /// Backing annotation file, once saved or loaded.
    path: Option<PathBuf>,

    history: CommandHistory,

    /// Unsaved changes present.
    dirty: bool,
}

impl AnnotationDocument {
    /// Start an empty annotation set for a source document.
    pub fn new(document_ref: impl Into<String>) -> Self {
        Self {
            document_ref: document_ref.into(),
            path: None,
            history: CommandHistory::new(),
            dirty: false,
        }
    }

    /// Load an annotation file. The load validates the whole tree; a
    /// file that fails validation produces an error and no document.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, EditorError> {
        let path = path.into();
        let tree = codec::load_from(&path)?;
        let document_ref = tree
            .reading_order()
            .first()
            .map(|r| r.document_ref.clone())
            .unwrap_or_default();
        Ok(Self {
            document_ref,
            path: Some(path),
            history: CommandHistory::with_tree(tree),
            dirty: false,
        })
    }

    pub fn document_ref(&self) -> &str {
        &self.document_ref
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read access to the region tree.
    pub fn tree(&self) -> &TreeIndex {
        self.history.tree()
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    // ---- mutation --------------------------------------------------------

    /// Apply any mutation through the history.
    pub fn execute(&mut self, mutation: Mutation) -> Result<(), TreeError> {
        self.history.execute(mutation)?;
        self.dirty = true;
        Ok(())
    }

    /// Finish a draft into a record (fresh id, next per-page index) and
    /// create it under `parent`. Returns the new region's id.
    pub fn create_region(
        &mut self,
        draft: RegionDraft,
        parent: ParentRef,
        position: Option<usize>,
    ) -> Result<String, EditorError> {
        let id = new_region_id();
        let index = self.tree().next_index(draft.page);
        let record = draft.into_record(id.clone(), index, parent.clone())?;
        self.execute(Mutation::Create {
            record,
            parent,
            position,
        })?;
        Ok(id)
    }

    pub fn delete_region(&mut self, id: &str, policy: OrphanPolicy) -> Result<(), TreeError> {
        self.execute(Mutation::Delete {
            id: id.to_string(),
            policy,
        })
    }

    pub fn edit_region(&mut self, id: &str, patch: FieldPatch) -> Result<(), TreeError> {
        self.execute(Mutation::Edit {
            id: id.to_string(),
            patch,
        })
    }

    pub fn move_region(&mut self, id: &str, position: usize) -> Result<(), TreeError> {
        self.execute(Mutation::Move {
            id: id.to_string(),
            position,
        })
    }

    pub fn reparent_region(
        &mut self,
        id: &str,
        new_parent: ParentRef,
        position: Option<usize>,
    ) -> Result<(), TreeError> {
        self.execute(Mutation::Reparent {
            id: id.to_string(),
            new_parent,
            position,
        })
    }

    /// Group the following mutations into a single undo step.
    pub fn begin_batch(&mut self, description: Option<String>) {
        self.history.begin_batch(description);
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    pub fn undo(&mut self) -> Result<(), TreeError> {
        self.history.undo()?;
        self.dirty = true;
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), TreeError> {
        self.history.redo()?;
        self.dirty = true;
        Ok(())
    }

    // ---- persistence -----------------------------------------------------

    /// Save to the backing file.
    pub fn save(&mut self) -> Result<(), EditorError> {
        let path = self.path.clone().ok_or(EditorError::NoBackingFile)?;
        codec::save_to(&path, self.history.tree())?;
        self.dirty = false;
        Ok(())
    }

    /// Save to a new backing file, which becomes the document's file.
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<(), EditorError> {
        let path = path.into();
        codec::save_to(&path, self.history.tree())?;
        self.path = Some(path);
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_model::{rect_coords, Category, Point};

    fn draft(page: u32) -> RegionDraft {
        RegionDraft::new(
            "paper.pdf",
            page,
            rect_coords(Point::new(0.0, 0.0), Point::new(5.0, 5.0)),
        )
        .with_category(Category::Text)
    }

    #[test]
    fn create_assigns_id_and_page_index() {
        let mut doc = AnnotationDocument::new("paper.pdf");
        let first = doc.create_region(draft(1), ParentRef::Root, None).unwrap();
        let second = doc.create_region(draft(1), ParentRef::Root, None).unwrap();
        let other_page = doc.create_region(draft(2), ParentRef::Root, None).unwrap();

        assert_ne!(first, second);
        assert_eq!(doc.tree().get(&first).unwrap().index, 0);
        assert_eq!(doc.tree().get(&second).unwrap().index, 1);
        assert_eq!(doc.tree().get(&other_page).unwrap().index, 0);
        assert!(doc.is_dirty());
    }

    #[test]
    fn deleted_index_is_not_reused() {
        let mut doc = AnnotationDocument::new("paper.pdf");
        doc.create_region(draft(1), ParentRef::Root, None).unwrap();
        let second = doc.create_region(draft(1), ParentRef::Root, None).unwrap();
        doc.delete_region(&second, OrphanPolicy::Promote).unwrap();

        let third = doc.create_region(draft(1), ParentRef::Root, None).unwrap();
        assert_eq!(doc.tree().get(&third).unwrap().index, 2);
    }

    #[test]
    fn create_rejects_degenerate_outline() {
        let mut doc = AnnotationDocument::new("paper.pdf");
        let bad = RegionDraft::new("paper.pdf", 1, vec![Point::new(0.0, 0.0)]);
        let result = doc.create_region(bad, ParentRef::Root, None);
        assert!(matches!(result, Err(EditorError::Geometry(_))));
        assert!(doc.tree().is_empty());
        assert!(!doc.is_dirty());
    }

    #[test]
    fn save_without_path_fails() {
        let mut doc = AnnotationDocument::new("paper.pdf");
        assert!(matches!(doc.save(), Err(EditorError::NoBackingFile)));
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        let mut doc = AnnotationDocument::new("paper.pdf");
        let parent = doc.create_region(
            draft(1).with_category(Category::Container),
            ParentRef::Root,
            None,
        )
        .unwrap();
        doc.create_region(
            draft(1).with_text("inside"),
            ParentRef::Region(parent.clone()),
            None,
        )
        .unwrap();
        doc.save_as(&path).unwrap();
        assert!(!doc.is_dirty());

        let loaded = AnnotationDocument::load(&path).unwrap();
        assert_eq!(loaded.tree(), doc.tree());
        assert_eq!(loaded.document_ref(), "paper.pdf");
        assert!(!loaded.is_dirty());
    }

    #[test]
    fn undo_redo_marks_dirty() {
        let mut doc = AnnotationDocument::new("paper.pdf");
        let id = doc.create_region(draft(1), ParentRef::Root, None).unwrap();

        doc.undo().unwrap();
        assert!(!doc.tree().contains(&id));
        doc.redo().unwrap();
        assert!(doc.tree().contains(&id));
        assert!(doc.is_dirty());
    }
}
