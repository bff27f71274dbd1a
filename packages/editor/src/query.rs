//! # Query/Filter Layer
//!
//! Read-only predicate retrieval over the tree index, used by search
//! and by the augmentation pass to pick its targets. Everything here is
//! a pure read: results are plain borrows and every call re-evaluates
//! from scratch, so iterators are restartable by calling again.

use crate::errors::TreeError;
use crate::tree::TreeIndex;
use pagemark_model::{Category, RegionRecord};
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Constraint on the `description` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionFilter {
    Empty,
    NonEmpty,
}

/// A composable region predicate. Clauses AND together; an empty filter
/// matches everything.
#[derive(Debug, Clone, Default)]
pub struct RegionFilter {
    pub categories: Option<HashSet<Category>>,
    pub text_contains: Option<String>,
    pub description: Option<DescriptionFilter>,
}

impl RegionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a set of categories (repeated calls extend the set).
    pub fn with_category(mut self, category: Category) -> Self {
        self.categories.get_or_insert_with(HashSet::new).insert(category);
        self
    }

    /// Restrict to regions whose text contains `needle`,
    /// case-insensitively.
    pub fn with_text_contains(mut self, needle: impl Into<String>) -> Self {
        self.text_contains = Some(needle.into());
        self
    }

    pub fn with_description(mut self, description: DescriptionFilter) -> Self {
        self.description = Some(description);
        self
    }

    pub fn matches(&self, record: &RegionRecord) -> bool {
        if let Some(categories) = &self.categories {
            if !categories.contains(&record.category) {
                return false;
            }
        }
        if let Some(needle) = &self.text_contains {
            if !record
                .text
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        match self.description {
            Some(DescriptionFilter::Empty) if !record.description.is_empty() => return false,
            Some(DescriptionFilter::NonEmpty) if record.description.is_empty() => return false,
            _ => {}
        }
        true
    }
}

/// Regions matching `filter`, in reading order, optionally restricted to
/// a page range.
pub fn find<'a>(
    tree: &'a TreeIndex,
    filter: &'a RegionFilter,
    pages: Option<RangeInclusive<u32>>,
) -> impl Iterator<Item = &'a RegionRecord> + 'a {
    tree.reading_order()
        .into_iter()
        .filter(move |r| pages.as_ref().map_or(true, |range| range.contains(&r.page)))
        .filter(|r| filter.matches(r))
}

/// Up to `n` siblings of `id`, nearest by sibling-order distance first,
/// ties going to the earlier sibling. The region itself is never
/// included. Used to build contextual prompts for augmentation.
pub fn sibling_context<'a>(
    tree: &'a TreeIndex,
    id: &str,
    n: usize,
) -> Result<Vec<&'a RegionRecord>, TreeError> {
    let record = tree.require(id)?;
    let siblings = tree.children_of(&record.parent);
    let position = siblings
        .iter()
        .position(|s| s == id)
        .expect("record's parent list must contain it");

    let mut ranked: Vec<(usize, usize)> = siblings
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != position)
        .map(|(i, _)| (position.abs_diff(i), i))
        .collect();
    ranked.sort_unstable();

    ranked
        .into_iter()
        .take(n)
        .map(|(_, i)| tree.require(&siblings[i]))
        .collect()
}

/// The chain of ancestors of `id`, root first, excluding the region
/// itself. Used for path-style prompt context ("Chapter 2 > Results").
pub fn ancestor_path<'a>(tree: &'a TreeIndex, id: &str) -> Result<Vec<&'a RegionRecord>, TreeError> {
    let mut chain = Vec::new();
    let mut cursor = tree.require(id)?.parent.clone();
    while let Some(parent_id) = cursor.as_region() {
        let parent = tree.require(parent_id)?;
        chain.push(parent);
        cursor = parent.parent.clone();
    }
    chain.reverse();
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_model::{rect_coords, ParentRef, Point, RegionDraft};

    fn insert(tree: &mut TreeIndex, id: &str, page: u32, category: Category, text: &str) {
        let index = tree.next_index(page);
        let record = RegionDraft::new(
            "doc.pdf",
            page,
            rect_coords(Point::new(0.0, 0.0), Point::new(1.0, 1.0)),
        )
        .with_category(category)
        .with_text(text)
        .into_record(id.to_string(), index, ParentRef::Root)
        .unwrap();
        tree.insert(record, ParentRef::Root, None).unwrap();
    }

    fn sample() -> TreeIndex {
        let mut tree = TreeIndex::new();
        insert(&mut tree, "t1", 1, Category::Title, "Introduction");
        insert(&mut tree, "x1", 1, Category::Text, "Some Narrative");
        insert(&mut tree, "i1", 1, Category::Image, "");
        insert(&mut tree, "x2", 2, Category::Text, "more narrative here");
        insert(&mut tree, "i2", 2, Category::Image, "");
        tree
    }

    #[test]
    fn empty_filter_matches_everything() {
        let tree = sample();
        assert_eq!(find(&tree, &RegionFilter::new(), None).count(), 5);
    }

    #[test]
    fn category_filter() {
        let tree = sample();
        let filter = RegionFilter::new().with_category(Category::Image);
        let ids: Vec<_> = find(&tree, &filter, None).map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["i1", "i2"]);
    }

    #[test]
    fn text_filter_is_case_insensitive() {
        let tree = sample();
        let filter = RegionFilter::new().with_text_contains("NARRATIVE");
        let ids: Vec<_> = find(&tree, &filter, None).map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["x1", "x2"]);
    }

    #[test]
    fn description_filter() {
        let mut tree = sample();
        tree.update(
            "x1",
            &crate::tree::FieldPatch {
                description: Some("already described".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let described = RegionFilter::new().with_description(DescriptionFilter::NonEmpty);
        let ids: Vec<_> = find(&tree, &described, None).map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["x1"]);

        let pending = RegionFilter::new().with_description(DescriptionFilter::Empty);
        assert_eq!(find(&tree, &pending, None).count(), 4);
    }

    #[test]
    fn page_range_restricts_results() {
        let tree = sample();
        let filter = RegionFilter::new();
        let ids: Vec<_> = find(&tree, &filter, Some(2..=2)).map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["x2", "i2"]);
    }

    #[test]
    fn clauses_compose_with_and() {
        let tree = sample();
        let filter = RegionFilter::new()
            .with_category(Category::Text)
            .with_text_contains("narrative");
        let ids: Vec<_> = find(&tree, &filter, Some(1..=1)).map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["x1"]);
    }

    #[test]
    fn find_is_restartable() {
        let tree = sample();
        let filter = RegionFilter::new().with_category(Category::Image);
        assert_eq!(find(&tree, &filter, None).count(), 2);
        assert_eq!(find(&tree, &filter, None).count(), 2); // fresh evaluation
    }

    #[test]
    fn sibling_context_prefers_nearest_then_earlier() {
        // Root order: t1, x1, i1, x2, i2; target i1 at position 2.
        let tree = sample();
        let context = sibling_context(&tree, "i1", 2).unwrap();
        let ids: Vec<_> = context.iter().map(|r| r.id.as_str()).collect();
        // Distance 1 both sides; earlier sibling (x1) wins first place.
        assert_eq!(ids, vec!["x1", "x2"]);
    }

    #[test]
    fn sibling_context_excludes_target_and_caps_at_n() {
        let tree = sample();
        let context = sibling_context(&tree, "i1", 10).unwrap();
        assert_eq!(context.len(), 4);
        assert!(context.iter().all(|r| r.id != "i1"));
    }

    #[test]
    fn sibling_context_unknown_id_fails() {
        let tree = sample();
        assert_eq!(
            sibling_context(&tree, "ghost", 3).unwrap_err(),
            TreeError::UnknownId("ghost".to_string())
        );
    }

    #[test]
    fn find_then_sibling_context_property() {
        let tree = sample();
        let filter = RegionFilter::new().with_category(Category::Image);
        let first = find(&tree, &filter, None).next().unwrap();
        let context = sibling_context(&tree, &first.id, 2).unwrap();
        assert!(context.len() <= 2);
        assert!(context.iter().all(|r| r.id != first.id));
    }

    #[test]
    fn ancestor_path_is_root_first() {
        let mut tree = TreeIndex::new();
        insert(&mut tree, "a", 1, Category::Container, "chapter");
        let b = RegionDraft::new("doc.pdf", 1, rect_coords(Point::new(0.0, 0.0), Point::new(1.0, 1.0)))
            .with_text("section")
            .into_record("b".to_string(), 1, ParentRef::Root)
            .unwrap();
        tree.insert(b, ParentRef::Region("a".to_string()), None).unwrap();
        let c = RegionDraft::new("doc.pdf", 1, rect_coords(Point::new(0.0, 0.0), Point::new(1.0, 1.0)))
            .with_text("figure")
            .into_record("c".to_string(), 2, ParentRef::Root)
            .unwrap();
        tree.insert(c, ParentRef::Region("b".to_string()), None).unwrap();

        let path: Vec<_> = ancestor_path(&tree, "c")
            .unwrap()
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(path, vec!["a", "b"]);
        assert!(ancestor_path(&tree, "a").unwrap().is_empty());
    }
}
