//! # Augmentation Pass
//!
//! Fills region descriptions from an external language-model service.
//! The service itself is behind the [`DescriptionProvider`] trait; this
//! module only selects targets through the query layer, assembles the
//! contextual request for each, and writes results back as ordinary
//! `Edit` mutations, so every augmentation is undoable and the tree
//! never waits on the provider inside a mutation.
//!
//! Callers run the provider wherever they like (worker thread, async
//! task); cancelling an in-flight request is simply not submitting the
//! edit.

use crate::document::AnnotationDocument;
use crate::query::{self, DescriptionFilter, RegionFilter};
use crate::tree::FieldPatch;
use pagemark_model::Category;
use std::ops::RangeInclusive;

/// Everything a provider gets to describe one region.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionRequest {
    pub region_id: String,
    pub page: u32,
    pub category: Category,

    /// The region's own extracted text.
    pub text: String,

    /// Ancestor texts, root first ("Chapter 2" > "Results").
    pub path: Vec<String>,

    /// Texts (or existing descriptions) of nearby siblings, nearest
    /// first. Siblings with neither are left out.
    pub context: Vec<String>,
}

/// The language-model seam. Implementations call whatever service they
/// like; errors are reported per region and never abort the pass.
pub trait DescriptionProvider {
    fn describe(
        &self,
        request: &DescriptionRequest,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// Tuning for an augmentation pass.
#[derive(Debug, Clone)]
pub struct AugmentOptions {
    /// How many sibling texts to include in each request.
    pub context_size: usize,

    /// Re-describe regions that already have a description. Off by
    /// default: the pass normally targets only undescribed regions.
    pub overwrite: bool,
}

impl Default for AugmentOptions {
    fn default() -> Self {
        Self {
            context_size: 4,
            overwrite: false,
        }
    }
}

/// What an augmentation pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AugmentReport {
    /// Regions whose description was written, in pass order.
    pub updated: Vec<String>,

    /// Regions the provider failed on, with the error text.
    pub failed: Vec<(String, String)>,
}

/// Run one augmentation pass: select targets with `filter` (restricted
/// to undescribed regions unless `overwrite` is set), ask the provider
/// for each, and apply every answer as an `Edit` mutation.
pub fn augment(
    doc: &mut AnnotationDocument,
    filter: &RegionFilter,
    pages: Option<RangeInclusive<u32>>,
    provider: &dyn DescriptionProvider,
    options: &AugmentOptions,
) -> AugmentReport {
    let mut filter = filter.clone();
    if !options.overwrite && filter.description.is_none() {
        filter.description = Some(DescriptionFilter::Empty);
    }

    // Select and snapshot the requests first; the provider and the edits
    // come after, so reads never interleave with writes.
    let requests: Vec<DescriptionRequest> = query::find(doc.tree(), &filter, pages)
        .map(|record| build_request(doc, &record.id, options.context_size))
        .collect();

    let mut report = AugmentReport::default();
    for request in requests {
        match provider.describe(&request) {
            Ok(description) => {
                let patch = FieldPatch {
                    description: Some(description),
                    ..Default::default()
                };
                match doc.edit_region(&request.region_id, patch) {
                    Ok(()) => report.updated.push(request.region_id),
                    Err(error) => {
                        report.failed.push((request.region_id, error.to_string()));
                    }
                }
            }
            Err(error) => {
                tracing::warn!(region = %request.region_id, %error, "description provider failed");
                report.failed.push((request.region_id, error.to_string()));
            }
        }
    }
    tracing::info!(
        updated = report.updated.len(),
        failed = report.failed.len(),
        "augmentation pass finished"
    );
    report
}

fn build_request(doc: &AnnotationDocument, id: &str, context_size: usize) -> DescriptionRequest {
    let tree = doc.tree();
    let record = tree.get(id).expect("target was just selected");

    let path = query::ancestor_path(tree, id)
        .unwrap_or_default()
        .iter()
        .map(|r| r.text.clone())
        .filter(|t| !t.trim().is_empty())
        .collect();

    let context = query::sibling_context(tree, id, context_size)
        .unwrap_or_default()
        .iter()
        .filter_map(|sibling| {
            if !sibling.text.trim().is_empty() {
                Some(sibling.text.clone())
            } else if !sibling.description.trim().is_empty() {
                Some(sibling.description.clone())
            } else {
                None
            }
        })
        .collect();

    DescriptionRequest {
        region_id: record.id.clone(),
        page: record.page,
        category: record.category.clone(),
        text: record.text.clone(),
        path,
        context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_model::{rect_coords, ParentRef, Point, RegionDraft};

    struct EchoProvider;

    impl DescriptionProvider for EchoProvider {
        fn describe(
            &self,
            request: &DescriptionRequest,
        ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
            Ok(format!("{} on page {}", request.category, request.page))
        }
    }

    struct FailingProvider;

    impl DescriptionProvider for FailingProvider {
        fn describe(
            &self,
            _request: &DescriptionRequest,
        ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
            Err("service unavailable".into())
        }
    }

    fn doc_with_images() -> (AnnotationDocument, Vec<String>) {
        let mut doc = AnnotationDocument::new("paper.pdf");
        let mut ids = Vec::new();
        for (category, text) in [
            (Category::Text, "before the figure"),
            (Category::Image, ""),
            (Category::Image, ""),
        ] {
            let draft = RegionDraft::new(
                "paper.pdf",
                1,
                rect_coords(Point::new(0.0, 0.0), Point::new(1.0, 1.0)),
            )
            .with_category(category)
            .with_text(text);
            ids.push(doc.create_region(draft, ParentRef::Root, None).unwrap());
        }
        (doc, ids)
    }

    #[test]
    fn augment_writes_descriptions_through_edits() {
        let (mut doc, ids) = doc_with_images();
        let filter = RegionFilter::new().with_category(Category::Image);

        let report = augment(&mut doc, &filter, None, &EchoProvider, &AugmentOptions::default());
        assert_eq!(report.updated, vec![ids[1].clone(), ids[2].clone()]);
        assert!(report.failed.is_empty());
        assert_eq!(
            doc.tree().get(&ids[1]).unwrap().description,
            "image on page 1"
        );
    }

    #[test]
    fn augmentation_is_undoable() {
        let (mut doc, ids) = doc_with_images();
        let filter = RegionFilter::new().with_category(Category::Image);
        augment(&mut doc, &filter, None, &EchoProvider, &AugmentOptions::default());

        doc.undo().unwrap();
        doc.undo().unwrap();
        assert_eq!(doc.tree().get(&ids[1]).unwrap().description, "");
        assert_eq!(doc.tree().get(&ids[2]).unwrap().description, "");
    }

    #[test]
    fn described_regions_skipped_unless_overwrite() {
        let (mut doc, ids) = doc_with_images();
        doc.edit_region(
            &ids[1],
            FieldPatch {
                description: Some("already done".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let filter = RegionFilter::new().with_category(Category::Image);
        let report = augment(&mut doc, &filter, None, &EchoProvider, &AugmentOptions::default());
        assert_eq!(report.updated, vec![ids[2].clone()]);
        assert_eq!(doc.tree().get(&ids[1]).unwrap().description, "already done");

        let overwrite = AugmentOptions {
            overwrite: true,
            ..Default::default()
        };
        let report = augment(&mut doc, &filter, None, &EchoProvider, &overwrite);
        assert_eq!(report.updated.len(), 2);
    }

    #[test]
    fn provider_failure_is_reported_not_applied() {
        let (mut doc, ids) = doc_with_images();
        let filter = RegionFilter::new().with_category(Category::Image);

        let report = augment(&mut doc, &filter, None, &FailingProvider, &AugmentOptions::default());
        assert!(report.updated.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert_eq!(doc.tree().get(&ids[1]).unwrap().description, "");
        assert_eq!(doc.history().undo_depth(), 3); // only the creates
    }

    #[test]
    fn request_carries_sibling_context() {
        let (mut doc, ids) = doc_with_images();
        let request = build_request(&doc, &ids[1], 4);
        assert_eq!(request.context, vec!["before the figure"]);
        assert!(request.path.is_empty());

        // Describe one sibling; its description becomes usable context.
        doc.edit_region(
            &ids[2],
            FieldPatch {
                description: Some("a bar chart".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        let request = build_request(&doc, &ids[1], 4);
        assert_eq!(request.context, vec!["before the figure", "a bar chart"]);
    }
}
