use serde::{Deserialize, Serialize};
use std::fmt;

/// A cleaned search hit: title and snippet with markup removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    /// 1-based position in the result list
    pub index: usize,
    pub title: String,
    pub snippet: String,
    pub link: Option<String>,
}

impl SearchDocument {
    pub fn new(index: usize, title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            snippet: snippet.into(),
            link: None,
        }
    }

    /// Title and snippet concatenated, the text every scorer inspects.
    pub fn combined_text(&self) -> String {
        format!("{}{}", self.title, self.snippet)
    }
}

/// A product listing scraped from a marketplace search page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub name: String,
    pub price: u64,
    pub site: String,
}

/// One period of a trend or click-share series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: String,
    pub ratio: f64,
    #[serde(rename = "clickCount", default)]
    pub click_count: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceCategory {
    Demand,
    Popularity,
    Competition,
    Rarity,
    Listing,
    Estimate,
}

impl EvidenceCategory {
    pub fn label(&self) -> &'static str {
        match self {
            EvidenceCategory::Demand => "Demand",
            EvidenceCategory::Popularity => "Popularity / trend",
            EvidenceCategory::Competition => "Competition",
            EvidenceCategory::Rarity => "Rarity / raw material",
            EvidenceCategory::Listing => "Listings",
            EvidenceCategory::Estimate => "Estimated",
        }
    }
}

/// A human-readable justification for one score component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub category: EvidenceCategory,
    pub text: String,
}

impl Evidence {
    pub fn new(category: EvidenceCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
        }
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category.label(), self.text)
    }
}
