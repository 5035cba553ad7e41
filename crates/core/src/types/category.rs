//! The fixed product category set.
//!
//! The marketplace recognises exactly six categories. Serialized forms
//! match the API's wire strings (note the `&` in "Home & Garden").

use serde::{Deserialize, Serialize};

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Clothing,
    #[serde(rename = "Home & Garden")]
    HomeGarden,
    Books,
    Sports,
    Other,
}

impl Category {
    /// All categories, in display order (used for filter dropdowns and
    /// the listing form).
    pub const ALL: [Self; 6] = [
        Self::Electronics,
        Self::Clothing,
        Self::HomeGarden,
        Self::Books,
        Self::Sports,
        Self::Other,
    ];

    /// Wire/display name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Electronics => "Electronics",
            Self::Clothing => "Clothing",
            Self::HomeGarden => "Home & Garden",
            Self::Books => "Books",
            Self::Sports => "Sports",
            Self::Other => "Other",
        }
    }

    /// Parse a wire/display name back into a category.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_names() {
        assert_eq!(Category::HomeGarden.as_str(), "Home & Garden");
        assert_eq!(Category::Electronics.as_str(), "Electronics");
    }

    #[test]
    fn test_category_serde_matches_wire() {
        let json = serde_json::to_string(&Category::HomeGarden).unwrap();
        assert_eq!(json, "\"Home & Garden\"");

        let parsed: Category = serde_json::from_str("\"Books\"").unwrap();
        assert_eq!(parsed, Category::Books);
    }

    #[test]
    fn test_category_parse_roundtrip() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
        assert_eq!(Category::parse("Groceries"), None);
    }

    #[test]
    fn test_all_has_six_categories() {
        assert_eq!(Category::ALL.len(), 6);
    }
}
