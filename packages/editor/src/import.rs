//! # Import Pass
//!
//! Turns the output of an external document-partitioning service into
//! region records. The service hands over a tree of raw partition items
//! (page, label, text, geometry, nested children); each item becomes one
//! `Create` mutation, so a whole import lands as a single undoable
//! batch.
//!
//! Index values follow page-relative creation order, exactly as if the
//! regions had been drawn by hand in the order the service emitted them.

use crate::document::AnnotationDocument;
use pagemark_model::{enclosing_polygon, Category, ParentRef, Point, RegionDraft};

/// One raw item from the partitioning service.
#[derive(Debug, Clone, Default)]
pub struct PartitionItem {
    /// 1-based page number.
    pub page: u32,

    /// The service's element label (e.g. `NarrativeText`), mapped onto
    /// the category legend at import time.
    pub label: String,

    pub text: String,

    /// Outline in document coordinates. Container items may come with no
    /// geometry of their own; they get the enclosing polygon of their
    /// children instead.
    pub coordinates: Vec<Point>,

    /// Screenshot blob, if the service captured one.
    pub image_data: Vec<u8>,

    pub children: Vec<PartitionItem>,
}

/// What an import did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Ids of the regions created, in creation order.
    pub created: Vec<String>,

    /// Items (and their nested children) skipped because no valid
    /// region could be built from them.
    pub skipped: usize,
}

/// Import a partition tree as one undoable batch. Items that cannot
/// produce a valid region are skipped together with their subtree; the
/// rest of the import proceeds.
pub fn import_partitions(doc: &mut AnnotationDocument, items: &[PartitionItem]) -> ImportReport {
    let mut report = ImportReport::default();
    doc.begin_batch(Some("import".to_string()));
    for item in items {
        visit(doc, item, ParentRef::Root, &mut report);
    }
    doc.end_batch();
    tracing::info!(
        created = report.created.len(),
        skipped = report.skipped,
        "imported partition tree"
    );
    report
}

fn visit(
    doc: &mut AnnotationDocument,
    item: &PartitionItem,
    parent: ParentRef,
    report: &mut ImportReport,
) {
    let coordinates = if item.coordinates.is_empty() {
        enclosing_outline(item)
    } else {
        item.coordinates.clone()
    };

    let draft = RegionDraft::new(doc.document_ref().to_string(), item.page, coordinates)
        .with_text(item.text.clone())
        .with_category(Category::from_partition_label(&item.label))
        .with_image_data(item.image_data.clone());

    match doc.create_region(draft, parent, None) {
        Ok(id) => {
            report.created.push(id.clone());
            for child in &item.children {
                visit(doc, child, ParentRef::Region(id.clone()), report);
            }
        }
        Err(error) => {
            tracing::warn!(label = %item.label, page = item.page, %error, "skipping partition item");
            report.skipped += 1 + count_items(&item.children);
        }
    }
}

/// A container without geometry encloses whatever its descendants cover.
fn enclosing_outline(item: &PartitionItem) -> Vec<Point> {
    let mut outlines = Vec::new();
    collect_outlines(&item.children, &mut outlines);
    enclosing_polygon(&outlines)
}

fn collect_outlines(items: &[PartitionItem], out: &mut Vec<Vec<Point>>) {
    for item in items {
        if !item.coordinates.is_empty() {
            out.push(item.coordinates.clone());
        }
        collect_outlines(&item.children, out);
    }
}

fn count_items(items: &[PartitionItem]) -> usize {
    items.iter().map(|i| 1 + count_items(&i.children)).sum()
}
