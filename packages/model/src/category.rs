//! # Category Legend
//!
//! Region categories are an open-ended but centrally legended set of
//! strings. The known legend covers everything the partition service can
//! emit; strings outside the legend survive as [`Category::Other`] so a
//! file produced by another tool round-trips byte-for-byte.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of an annotated region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Caption,
    Text,
    ListItem,
    Title,
    Contact,
    Table,
    Image,
    Header,
    Footer,
    Formula,
    Container,
    Unknown,
    /// A category string outside the known legend, preserved as-is.
    Other(String),
}

/// Every legend member, in legend order. `Other` is excluded by
/// construction.
pub const KNOWN_CATEGORIES: [Category; 12] = [
    Category::Caption,
    Category::Text,
    Category::ListItem,
    Category::Title,
    Category::Contact,
    Category::Table,
    Category::Image,
    Category::Header,
    Category::Footer,
    Category::Formula,
    Category::Container,
    Category::Unknown,
];

impl Category {
    /// The canonical legend name.
    pub fn name(&self) -> &str {
        match self {
            Category::Caption => "caption",
            Category::Text => "text",
            Category::ListItem => "listItem",
            Category::Title => "title",
            Category::Contact => "contact",
            Category::Table => "table",
            Category::Image => "image",
            Category::Header => "header",
            Category::Footer => "footer",
            Category::Formula => "formula",
            Category::Container => "container",
            Category::Unknown => "unknown",
            Category::Other(name) => name,
        }
    }

    /// The display color associated with this category (hex).
    pub fn color(&self) -> &'static str {
        match self {
            Category::Caption => "#1f77b4",
            Category::Text => "#2ca02c",
            Category::ListItem => "#ff7f0e",
            Category::Title => "#9467bd",
            Category::Contact => "#8c564b",
            Category::Table => "#e377c2",
            Category::Image => "#17becf",
            Category::Header => "#ffbb78",
            Category::Footer => "#bcbd22",
            Category::Formula => "#550A21",
            Category::Container => "#aec7e8",
            Category::Unknown | Category::Other(_) => "#7f7f7f",
        }
    }

    /// Parse a category string. Known legend names map to their variant;
    /// anything else is preserved under `Other`.
    pub fn parse(s: &str) -> Category {
        for known in KNOWN_CATEGORIES {
            if known.name() == s {
                return known;
            }
        }
        Category::Other(s.to_string())
    }

    /// Map a partition-service element label onto the legend.
    ///
    /// Labels the service does not document map to `Unknown` (not
    /// `Other`): they are service noise, not user vocabulary.
    pub fn from_partition_label(label: &str) -> Category {
        match label {
            "FigureCaption" => Category::Caption,
            "NarrativeText" => Category::Text,
            "ListItem" => Category::ListItem,
            "Title" => Category::Title,
            "Address" => Category::Contact,
            "Table" => Category::Table,
            "Image" => Category::Image,
            "Header" => Category::Header,
            "Footer" => Category::Footer,
            "Formula" => Category::Formula,
            "CompositeElement" => Category::Container,
            _ => Category::Unknown,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::parse(&s)
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_round_trip() {
        for c in KNOWN_CATEGORIES {
            assert_eq!(Category::parse(c.name()), c);
        }
    }

    #[test]
    fn unknown_string_preserved() {
        let c = Category::parse("sidebar");
        assert_eq!(c, Category::Other("sidebar".to_string()));
        assert_eq!(c.name(), "sidebar");
    }

    #[test]
    fn partition_labels_map_to_legend() {
        assert_eq!(
            Category::from_partition_label("NarrativeText"),
            Category::Text
        );
        assert_eq!(
            Category::from_partition_label("CompositeElement"),
            Category::Container
        );
        assert_eq!(
            Category::from_partition_label("PageBreak"),
            Category::Unknown
        );
    }

    #[test]
    fn serde_uses_legend_names() {
        let json = serde_json::to_string(&Category::ListItem).unwrap();
        assert_eq!(json, "\"listItem\"");
        let back: Category = serde_json::from_str("\"table\"").unwrap();
        assert_eq!(back, Category::Table);
        let odd: Category = serde_json::from_str("\"margin-note\"").unwrap();
        assert_eq!(odd, Category::Other("margin-note".to_string()));
    }
}
