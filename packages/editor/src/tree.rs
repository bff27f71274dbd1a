//! # Tree Index
//!
//! Authoritative in-memory store of all region records for one open
//! document, plus the parent/child order that arranges them into a
//! tree under a synthetic root.
//!
//! ## Representation
//!
//! Two independent maps, per the crate's no-back-pointer rule:
//!
//! - `records`: id -> owning [`RegionRecord`] (each record knows its
//!   parent, nothing else about the tree)
//! - `children`: parent -> ordered child ids (the derived index; the
//!   `Root` key holds top-level order)
//!
//! Agreement between the two maps is the core invariant. Every
//! structural write re-checks the touched subtree with an O(depth) walk,
//! not a full-tree scan; [`TreeIndex::validate`] does the full scan and
//! is reserved for loads.
//!
//! Sibling order in `children` is the document's reading order and is
//! what serialization emits. A record's `index` field is creation-order
//! metadata only: reordering never rewrites it and deletions leave gaps.

use crate::errors::TreeError;
use pagemark_model::{Category, ParentRef, RegionRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What happens to a removed region's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrphanPolicy {
    /// Children take the removed node's place under its former parent,
    /// keeping their relative order. Deleting an organizational node
    /// must not silently discard its leaves, so this is the default.
    Promote,
    /// Children are removed recursively along with the node.
    Cascade,
}

impl Default for OrphanPolicy {
    fn default() -> Self {
        OrphanPolicy::Promote
    }
}

/// A partial update to a region's mutable fields. Structural fields
/// (`id`, `document_ref`, `page`, `index`, `coordinates`, `parent`,
/// child order) have dedicated operations and cannot appear here;
/// loosely-typed patches are screened by `codec::patch_from_json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldPatch {
    pub text: Option<String>,
    pub category: Option<Category>,
    pub image_data: Option<Vec<u8>>,
    pub description: Option<String>,
}

impl FieldPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.category.is_none()
            && self.image_data.is_none()
            && self.description.is_none()
    }
}

/// Snapshot of one removed region: the record plus where it sat, enough
/// to put it back exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedRegion {
    pub record: RegionRecord,
    pub parent: ParentRef,
    pub position: usize,
}

/// Result of a [`TreeIndex::remove`]: every removed region in pre-order
/// (the target first), and the ids of children promoted in its place
/// (empty under `Cascade`).
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub removed: Vec<RemovedRegion>,
    pub promoted: Vec<String>,
}

/// In-memory region store and hierarchy for one open document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeIndex {
    /// id -> record (owning)
    records: HashMap<String, RegionRecord>,
    /// parent -> ordered child ids (derived index). Entries are dropped
    /// when they empty out so structural equality is representation-free.
    children: HashMap<ParentRef, Vec<String>>,
}

impl TreeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble an index straight from its two maps. Load path only: the
    /// caller (the codec) must run [`validate`](Self::validate) before
    /// exposing the result.
    pub(crate) fn from_parts(
        records: HashMap<String, RegionRecord>,
        children: HashMap<ParentRef, Vec<String>>,
    ) -> Self {
        Self { records, children }
    }

    // ---- reads ----------------------------------------------------------

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&RegionRecord> {
        self.records.get(id)
    }

    /// Like [`get`](Self::get) but failing with `UnknownId`.
    pub fn require(&self, id: &str) -> Result<&RegionRecord, TreeError> {
        self.records
            .get(id)
            .ok_or_else(|| TreeError::UnknownId(id.to_string()))
    }

    /// Ordered child ids of a parent; empty for leaves and unknown ids.
    pub fn children_of(&self, parent: &ParentRef) -> &[String] {
        self.children.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Top-level region ids in order.
    pub fn roots(&self) -> &[String] {
        self.children_of(&ParentRef::Root)
    }

    pub fn parent_of(&self, id: &str) -> Option<&ParentRef> {
        self.records.get(id).map(|r| &r.parent)
    }

    /// Distinct page numbers in ascending order.
    pub fn pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.records.values().map(|r| r.page).collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }

    /// All regions in reading order: depth-first over the sibling order,
    /// roots first.
    pub fn reading_order(&self) -> Vec<&RegionRecord> {
        let mut out = Vec::with_capacity(self.records.len());
        let mut stack: Vec<&str> = self.roots().iter().rev().map(String::as_str).collect();
        while let Some(id) = stack.pop() {
            if let Some(record) = self.records.get(id) {
                out.push(record);
            }
            let kids = self.children_of(&ParentRef::Region(id.to_string()));
            for child in kids.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Regions on one page, in reading order.
    pub fn regions_on_page(&self, page: u32) -> Vec<&RegionRecord> {
        self.reading_order()
            .into_iter()
            .filter(|r| r.page == page)
            .collect()
    }

    /// The next creation index for a page: one past the highest ever
    /// assigned there. Gaps from deletions are never reused.
    pub fn next_index(&self, page: u32) -> u32 {
        self.records
            .values()
            .filter(|r| r.page == page)
            .map(|r| r.index + 1)
            .max()
            .unwrap_or(0)
    }

    // ---- structural writes ----------------------------------------------

    /// Insert a record under `parent` at `position` within the sibling
    /// order (append when `None`). The record's own `parent` field is
    /// overwritten to match.
    pub fn insert(
        &mut self,
        mut record: RegionRecord,
        parent: ParentRef,
        position: Option<usize>,
    ) -> Result<(), TreeError> {
        if self.records.contains_key(&record.id) {
            return Err(TreeError::DuplicateId(record.id.clone()));
        }
        if let Some(parent_id) = parent.as_region() {
            if !self.records.contains_key(parent_id) {
                return Err(TreeError::UnknownParent(parent_id.to_string()));
            }
        }

        let id = record.id.clone();
        record.parent = parent.clone();
        let siblings = self.children.entry(parent).or_default();
        let at = position.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(at, id.clone());
        self.records.insert(id.clone(), record);

        tracing::debug!(id = %id, position = at, "inserted region");
        self.check_subtree(&id)
    }

    /// Remove a region. Children are promoted into its place or removed
    /// with it according to `policy`. Returns the snapshot needed to
    /// restore everything exactly.
    pub fn remove(&mut self, id: &str, policy: OrphanPolicy) -> Result<Removal, TreeError> {
        let record = self.require(id)?.clone();
        let parent = record.parent.clone();
        let position = self
            .position_in_parent(id)
            .expect("record's parent list must contain it");

        let removal = match policy {
            OrphanPolicy::Promote => {
                let child_ids = self
                    .children
                    .remove(&ParentRef::Region(id.to_string()))
                    .unwrap_or_default();

                // Children take the removed node's slot, in order.
                let siblings = self
                    .children
                    .get_mut(&parent)
                    .expect("parent list must exist");
                siblings.remove(position);
                for (offset, child) in child_ids.iter().enumerate() {
                    siblings.insert(position + offset, child.clone());
                }
                for child in &child_ids {
                    if let Some(child_record) = self.records.get_mut(child) {
                        child_record.parent = parent.clone();
                    }
                }
                self.drop_if_empty(&parent);
                self.records.remove(id);

                Removal {
                    removed: vec![RemovedRegion {
                        record,
                        parent: parent.clone(),
                        position,
                    }],
                    promoted: child_ids,
                }
            }
            OrphanPolicy::Cascade => {
                let mut removed = Vec::new();
                self.collect_subtree(id, &mut removed);
                let siblings = self
                    .children
                    .get_mut(&parent)
                    .expect("parent list must exist");
                siblings.remove(position);
                self.drop_if_empty(&parent);
                for gone in &removed {
                    self.records.remove(&gone.record.id);
                    self.children
                        .remove(&ParentRef::Region(gone.record.id.clone()));
                }
                Removal {
                    removed,
                    promoted: Vec::new(),
                }
            }
        };

        tracing::debug!(id = %id, ?policy, count = removal.removed.len(), "removed region");
        if let ParentRef::Region(parent_id) = &parent {
            self.check_subtree(parent_id)?;
        }
        Ok(removal)
    }

    /// Move a region under a new parent at `position`. Fails with
    /// `CycleDetected` when the new parent is the region itself or one
    /// of its descendants. Returns the former (parent, position).
    pub fn reparent(
        &mut self,
        id: &str,
        new_parent: ParentRef,
        position: Option<usize>,
    ) -> Result<(ParentRef, usize), TreeError> {
        self.require(id)?;
        if let Some(parent_id) = new_parent.as_region() {
            if !self.records.contains_key(parent_id) {
                return Err(TreeError::UnknownParent(parent_id.to_string()));
            }
            if parent_id == id || self.is_descendant(parent_id, id) {
                return Err(TreeError::CycleDetected {
                    id: id.to_string(),
                    new_parent: parent_id.to_string(),
                });
            }
        }

        let old_parent = self.records[id].parent.clone();
        let old_position = self
            .position_in_parent(id)
            .expect("record's parent list must contain it");

        let old_siblings = self
            .children
            .get_mut(&old_parent)
            .expect("parent list must exist");
        old_siblings.remove(old_position);
        self.drop_if_empty(&old_parent);

        let siblings = self.children.entry(new_parent.clone()).or_default();
        let at = position.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(at, id.to_string());
        self.records
            .get_mut(id)
            .expect("checked above")
            .parent = new_parent;

        tracing::debug!(id = %id, position = at, "reparented region");
        self.check_subtree(id)?;
        Ok((old_parent, old_position))
    }

    /// Reorder a region within its current parent's sibling order.
    /// Positions past the end clamp to the end. Returns the former
    /// position.
    pub fn move_child(&mut self, id: &str, new_position: usize) -> Result<usize, TreeError> {
        self.require(id)?;
        let parent = self.records[id].parent.clone();
        let old_position = self
            .position_in_parent(id)
            .expect("record's parent list must contain it");

        let siblings = self
            .children
            .get_mut(&parent)
            .expect("parent list must exist");
        siblings.remove(old_position);
        let at = new_position.min(siblings.len());
        siblings.insert(at, id.to_string());

        tracing::debug!(id = %id, from = old_position, to = at, "moved region");
        self.check_subtree(id)?;
        Ok(old_position)
    }

    /// Apply a metadata patch. Returns a patch holding the previous
    /// values of exactly the fields that were touched, so the edit can
    /// be inverted.
    pub fn update(&mut self, id: &str, patch: &FieldPatch) -> Result<FieldPatch, TreeError> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| TreeError::UnknownId(id.to_string()))?;

        let mut previous = FieldPatch::default();
        if let Some(text) = &patch.text {
            previous.text = Some(std::mem::replace(&mut record.text, text.clone()));
        }
        if let Some(category) = &patch.category {
            previous.category = Some(std::mem::replace(&mut record.category, category.clone()));
        }
        if let Some(image_data) = &patch.image_data {
            previous.image_data =
                Some(std::mem::replace(&mut record.image_data, image_data.clone()));
        }
        if let Some(description) = &patch.description {
            previous.description = Some(std::mem::replace(
                &mut record.description,
                description.clone(),
            ));
        }
        Ok(previous)
    }

    // ---- consistency ----------------------------------------------------

    /// Re-validate the subtree around `id` after a structural write:
    /// bidirectional agreement for the node and its children, plus an
    /// acyclicity walk to the root. O(depth + fan-out), not O(n).
    pub fn check_subtree(&self, id: &str) -> Result<(), TreeError> {
        let record = self.require(id)?;
        self.check_link(record)?;
        for child in self.children_of(&ParentRef::Region(id.to_string())) {
            let child_record = self.require(child)?;
            self.check_link(child_record)?;
        }

        // Walk ancestors; more steps than records means a cycle.
        let mut steps = 0usize;
        let mut cursor = record.parent.clone();
        while let ParentRef::Region(ancestor) = cursor {
            steps += 1;
            if ancestor == id || steps > self.records.len() {
                return Err(TreeError::CycleDetected {
                    id: id.to_string(),
                    new_parent: ancestor,
                });
            }
            cursor = self.require(&ancestor)?.parent.clone();
        }
        Ok(())
    }

    /// Full consistency check: every parent reference resolves, both
    /// maps agree in both directions, and no cycles exist anywhere.
    /// Used by the codec after a load; incremental writes rely on
    /// [`check_subtree`](Self::check_subtree).
    pub fn validate(&self) -> Result<(), TreeError> {
        for record in self.records.values() {
            if let Some(parent_id) = record.parent.as_region() {
                if !self.records.contains_key(parent_id) {
                    return Err(TreeError::DanglingParent {
                        id: record.id.clone(),
                        parent: parent_id.to_string(),
                    });
                }
            }
            self.check_link(record)?;
        }
        for (parent, child_ids) in &self.children {
            for child in child_ids {
                let child_record =
                    self.records
                        .get(child)
                        .ok_or_else(|| TreeError::DanglingParent {
                            id: child.clone(),
                            parent: match parent {
                                ParentRef::Root => "ROOT".to_string(),
                                ParentRef::Region(p) => p.clone(),
                            },
                        })?;
                if child_record.parent != *parent {
                    return Err(TreeError::DanglingParent {
                        id: child.clone(),
                        parent: match parent {
                            ParentRef::Root => "ROOT".to_string(),
                            ParentRef::Region(p) => p.clone(),
                        },
                    });
                }
            }
        }
        for id in self.records.keys() {
            self.check_subtree(id)?;
        }
        Ok(())
    }

    /// One record's membership in its parent's child list: present
    /// exactly once, nowhere else.
    fn check_link(&self, record: &RegionRecord) -> Result<(), TreeError> {
        let hits = self
            .children_of(&record.parent)
            .iter()
            .filter(|c| **c == record.id)
            .count();
        if hits != 1 {
            return Err(TreeError::DanglingParent {
                id: record.id.clone(),
                parent: match &record.parent {
                    ParentRef::Root => "ROOT".to_string(),
                    ParentRef::Region(p) => p.clone(),
                },
            });
        }
        Ok(())
    }

    /// Would putting `id` under `new_parent` close a cycle? True when the
    /// new parent is `id` itself or one of its descendants.
    pub fn would_create_cycle(&self, id: &str, new_parent: &ParentRef) -> bool {
        match new_parent.as_region() {
            None => false,
            Some(parent_id) => parent_id == id || self.is_descendant(parent_id, id),
        }
    }

    /// A region's position within its parent's sibling order.
    pub fn position_in_parent(&self, id: &str) -> Option<usize> {
        let parent = &self.records.get(id)?.parent;
        self.children_of(parent).iter().position(|c| c == id)
    }

    fn is_descendant(&self, candidate: &str, ancestor: &str) -> bool {
        let mut cursor = self.records.get(candidate).map(|r| &r.parent);
        while let Some(ParentRef::Region(parent_id)) = cursor {
            if parent_id == ancestor {
                return true;
            }
            cursor = self.records.get(parent_id).map(|r| &r.parent);
        }
        false
    }

    fn collect_subtree(&self, id: &str, out: &mut Vec<RemovedRegion>) {
        if let Some(record) = self.records.get(id) {
            out.push(RemovedRegion {
                record: record.clone(),
                parent: record.parent.clone(),
                position: self.position_in_parent(id).unwrap_or(0),
            });
        }
        for child in self.children_of(&ParentRef::Region(id.to_string())) {
            self.collect_subtree(child, out);
        }
    }

    fn drop_if_empty(&mut self, parent: &ParentRef) {
        if self.children.get(parent).is_some_and(Vec::is_empty) {
            self.children.remove(parent);
        }
    }
}
