//! # Serialization Codec
//!
//! Deterministic two-way mapping between the in-memory tree index and
//! the persisted exchange format.
//!
//! ## Exchange shape
//!
//! The file is a JSON object keyed by page number (as a string, which
//! `BTreeMap<u32, _>` gives for free, in ascending numeric order), each
//! page holding its regions in reading order. Region fields use the
//! exchange names (`id_`, `doc`, `idx`, ...); a root's `parent` is the
//! literal `"ROOT"`.
//!
//! ## Loading
//!
//! Loading is all-or-nothing. Pass 1 instantiates every record and
//! checks global id uniqueness; pass 2 wires parent/child links and runs
//! the full consistency check. A file that fails either pass produces a
//! descriptive error and no tree, never a half-built one.

use crate::errors::{ExchangeError, TreeError};
use crate::tree::{FieldPatch, TreeIndex};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use pagemark_model::{Category, ParentRef, Point, RegionRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// The `parent` value marking a top-level region.
pub const ROOT_SENTINEL: &str = "ROOT";

/// One region as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionEntry {
    #[serde(rename = "id_")]
    pub id: String,
    pub doc: String,
    pub page: u32,
    pub idx: u32,
    pub coords: Vec<(f64, f64)>,
    pub text: String,
    pub category: String,
    /// Screenshot blob, base64; empty when none was captured.
    pub image: String,
    /// `"ROOT"` or another region's id.
    pub parent: String,
    pub children: Vec<String>,
    pub description: String,
}

/// The persisted document: page number -> regions in reading order.
pub type ExchangeDocument = BTreeMap<u32, Vec<RegionEntry>>;

/// Emit the tree as an exchange document. Pages ascend numerically;
/// within a page regions appear in reading order, so a reload
/// reconstructs both the hierarchy and the sibling order exactly.
pub fn serialize(tree: &TreeIndex) -> ExchangeDocument {
    let mut doc = ExchangeDocument::new();
    for record in tree.reading_order() {
        doc.entry(record.page)
            .or_default()
            .push(to_entry(tree, record));
    }
    doc
}

/// Build a tree index from an exchange document, or fail with the first
/// inconsistency found.
pub fn deserialize(doc: &ExchangeDocument) -> Result<TreeIndex, ExchangeError> {
    // Pass 1: instantiate records, check global id uniqueness.
    let mut seen = HashSet::new();
    let mut records = HashMap::new();
    for entries in doc.values() {
        for entry in entries {
            if !seen.insert(entry.id.clone()) {
                return Err(TreeError::DuplicateId(entry.id.clone()).into());
            }
            let record = from_entry(entry)?;
            records.insert(record.id.clone(), record);
        }
    }

    // Pass 2: wire parent/child order, then check every invariant.
    let mut children: HashMap<ParentRef, Vec<String>> = HashMap::new();
    for entries in doc.values() {
        for entry in entries {
            if entry.parent == ROOT_SENTINEL {
                children
                    .entry(ParentRef::Root)
                    .or_default()
                    .push(entry.id.clone());
            }
            if !entry.children.is_empty() {
                children.insert(ParentRef::Region(entry.id.clone()), entry.children.clone());
            }
        }
    }

    let tree = TreeIndex::from_parts(records, children);
    tree.validate()?;
    tracing::debug!(regions = tree.len(), pages = doc.len(), "deserialized exchange document");
    Ok(tree)
}

/// Write a tree to a JSON file (pretty-printed, as the interactive tool
/// saves it).
pub fn save_to(path: &Path, tree: &TreeIndex) -> Result<(), ExchangeError> {
    let doc = serialize(tree);
    let json = serde_json::to_string_pretty(&doc)?;
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), regions = tree.len(), "saved annotations");
    Ok(())
}

/// Read a tree from a JSON file, with full consistency validation.
pub fn load_from(path: &Path) -> Result<TreeIndex, ExchangeError> {
    let json = std::fs::read_to_string(path)?;
    let doc: ExchangeDocument = serde_json::from_str(&json)?;
    let tree = deserialize(&doc)?;
    tracing::info!(path = %path.display(), regions = tree.len(), "loaded annotations");
    Ok(tree)
}

/// Screen a loosely-typed edit (the shape a dialog or CLI hands over,
/// with exchange field names) into a typed [`FieldPatch`]. Any key
/// outside the four mutable fields is rejected with
/// `ImmutableFieldViolation`; that covers the structural fields
/// `id_`, `doc`, `page`, `idx`, `coords`, `parent`, and `children`.
pub fn patch_from_json(
    target_id: &str,
    value: &serde_json::Value,
) -> Result<FieldPatch, ExchangeError> {
    let object = value
        .as_object()
        .ok_or_else(|| TreeError::ImmutableFieldViolation("<non-object patch>".to_string()))?;

    let mut patch = FieldPatch::default();
    for (key, field) in object {
        match key.as_str() {
            "text" => patch.text = Some(serde_json::from_value(field.clone())?),
            "category" => {
                let name: String = serde_json::from_value(field.clone())?;
                patch.category = Some(Category::parse(&name));
            }
            "image" => {
                let blob: String = serde_json::from_value(field.clone())?;
                patch.image_data =
                    Some(BASE64.decode(blob).map_err(|source| {
                        ExchangeError::BadImageData {
                            id: target_id.to_string(),
                            source,
                        }
                    })?);
            }
            "description" => patch.description = Some(serde_json::from_value(field.clone())?),
            other => {
                return Err(TreeError::ImmutableFieldViolation(other.to_string()).into());
            }
        }
    }
    Ok(patch)
}

fn to_entry(tree: &TreeIndex, record: &RegionRecord) -> RegionEntry {
    RegionEntry {
        id: record.id.clone(),
        doc: record.document_ref.clone(),
        page: record.page,
        idx: record.index,
        coords: record.coordinates.iter().map(|p| (p.x, p.y)).collect(),
        text: record.text.clone(),
        category: record.category.name().to_string(),
        image: if record.image_data.is_empty() {
            String::new()
        } else {
            BASE64.encode(&record.image_data)
        },
        parent: match &record.parent {
            ParentRef::Root => ROOT_SENTINEL.to_string(),
            ParentRef::Region(id) => id.clone(),
        },
        children: tree
            .children_of(&ParentRef::Region(record.id.clone()))
            .to_vec(),
        description: record.description.clone(),
    }
}

fn from_entry(entry: &RegionEntry) -> Result<RegionRecord, ExchangeError> {
    if entry.coords.is_empty() {
        return Err(ExchangeError::EmptyCoordinates(entry.id.clone()));
    }
    let image_data = if entry.image.is_empty() {
        Vec::new()
    } else {
        BASE64
            .decode(&entry.image)
            .map_err(|source| ExchangeError::BadImageData {
                id: entry.id.clone(),
                source,
            })?
    };
    Ok(RegionRecord {
        id: entry.id.clone(),
        document_ref: entry.doc.clone(),
        page: entry.page,
        index: entry.idx,
        coordinates: entry.coords.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        text: entry.text.clone(),
        category: Category::parse(&entry.category),
        image_data,
        description: entry.description.clone(),
        parent: if entry.parent == ROOT_SENTINEL {
            ParentRef::Root
        } else {
            ParentRef::Region(entry.parent.clone())
        },
    })
}
