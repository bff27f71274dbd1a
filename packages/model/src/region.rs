//! # Region Records
//!
//! A region record is one annotated area of a document page: its
//! outline, extracted text, category, screenshot blob, free-form
//! description, and its place in the annotation hierarchy.

use crate::category::Category;
use crate::geometry::{validate_outline, GeometryError, Point};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a fresh region id (UUID v4, string form).
pub fn new_region_id() -> String {
    Uuid::new_v4().to_string()
}

/// A region's parent: either the synthetic root or another region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParentRef {
    Root,
    Region(String),
}

impl ParentRef {
    pub fn is_root(&self) -> bool {
        matches!(self, ParentRef::Root)
    }

    /// The parent region id, or `None` for the root.
    pub fn as_region(&self) -> Option<&str> {
        match self {
            ParentRef::Root => None,
            ParentRef::Region(id) => Some(id),
        }
    }
}

impl From<Option<String>> for ParentRef {
    fn from(id: Option<String>) -> Self {
        match id {
            None => ParentRef::Root,
            Some(id) => ParentRef::Region(id),
        }
    }
}

/// One annotated area of a document page.
///
/// `id`, `document_ref`, `page`, `index`, and `coordinates` are fixed at
/// creation. `parent` changes only through a reparent operation. Child
/// order is not stored here; it lives in the tree index so the two sides
/// of the parent/child relation cannot drift apart inside a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    /// Unique across the whole document, not just its page.
    pub id: String,

    /// Source document path or URL.
    pub document_ref: String,

    /// 1-based page number.
    pub page: u32,

    /// Position in the page's creation order. Monotonically increasing
    /// per page; never renumbered, so deletions leave gaps.
    pub index: u32,

    /// Ordered outline vertices; 4 for a rectangle, 3+ for a polygon.
    pub coordinates: Vec<Point>,

    /// Text extracted from the page within the outline, or user-entered.
    pub text: String,

    pub category: Category,

    /// Screenshot of the region as an opaque encoded blob. Empty when no
    /// screenshot was captured.
    pub image_data: Vec<u8>,

    /// Free-form description; the one field the augmentation pass fills.
    pub description: String,

    pub parent: ParentRef,
}

/// The caller-supplied part of a new region, before the document assigns
/// an id, a per-page index, and a place in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionDraft {
    pub document_ref: String,
    pub page: u32,
    pub coordinates: Vec<Point>,
    pub text: String,
    pub category: Category,
    pub image_data: Vec<u8>,
    pub description: String,
}

impl RegionDraft {
    pub fn new(document_ref: impl Into<String>, page: u32, coordinates: Vec<Point>) -> Self {
        Self {
            document_ref: document_ref.into(),
            page,
            coordinates,
            text: String::new(),
            category: Category::Unknown,
            image_data: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_image_data(mut self, image_data: Vec<u8>) -> Self {
        self.image_data = image_data;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Validate the outline and finish the draft into a record.
    pub fn into_record(
        self,
        id: String,
        index: u32,
        parent: ParentRef,
    ) -> Result<RegionRecord, GeometryError> {
        validate_outline(&self.coordinates)?;
        Ok(RegionRecord {
            id,
            document_ref: self.document_ref,
            page: self.page,
            index,
            coordinates: self.coordinates,
            text: self.text,
            category: self.category,
            image_data: self.image_data,
            description: self.description,
            parent,
        })
    }
}
