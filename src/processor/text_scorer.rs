use regex::Regex;
use std::sync::LazyLock;

use crate::models::{Evidence, EvidenceCategory, SearchDocument};

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<]+?>").unwrap());
static WON_PRICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d,]+)원").unwrap());

/// Strips HTML tags and the entities search APIs embed in titles.
pub fn clean_markup(text: &str) -> String {
    TAG_PATTERN
        .replace_all(text, "")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Output of a text scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextScore {
    /// Points on the scorer's 0..=10 scale.
    pub points: f64,
    /// Number of keyword hits that contributed points.
    pub matches: usize,
    pub evidence: Vec<Evidence>,
}

impl TextScore {
    /// Points mapped onto [0, 1].
    pub fn normalized(&self) -> f64 {
        (self.points / 10.0).clamp(0.0, 1.0)
    }
}

/// Any strategy turning a corpus of search results into a score.
pub trait TextScorer: Send + Sync {
    fn name(&self) -> &str;
    fn score(&self, corpus: &[SearchDocument]) -> TextScore;
}

/// Builds a scorer whose keywords depend on the product being analysed.
pub trait ScorerFactory: Send + Sync {
    fn for_query(&self, query: &str) -> Box<dyn TextScorer>;
}

fn cap_points(points: f64) -> f64 {
    points.clamp(0.0, 10.0)
}

/// +1 point per keyword found in each document, starting from 1.
pub struct KeywordFrequencyScorer {
    keywords: Vec<String>,
    category: EvidenceCategory,
    max_evidence: usize,
}

impl KeywordFrequencyScorer {
    pub fn new(keywords: Vec<String>, category: EvidenceCategory, max_evidence: usize) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
            category,
            max_evidence,
        }
    }
}

impl TextScorer for KeywordFrequencyScorer {
    fn name(&self) -> &str {
        "keyword-frequency"
    }

    fn score(&self, corpus: &[SearchDocument]) -> TextScore {
        let mut matches = 0;
        let mut evidence = Vec::new();

        for doc in corpus {
            let text = doc.combined_text().to_lowercase();
            for keyword in &self.keywords {
                if text.contains(keyword.as_str()) {
                    matches += 1;
                    if evidence.len() < self.max_evidence {
                        let text = format!(
                            "'{}' mentioned: {} [result {}]",
                            keyword, doc.title, doc.index
                        );
                        evidence.push(Evidence::new(self.category, text));
                    }
                }
            }
        }

        TextScore {
            points: cap_points(1.0 + matches as f64),
            matches,
            evidence,
        }
    }
}

/// Quoted prices outside these exclusive bounds are treated as noise.
const MIN_QUOTED_PRICE: u64 = 100;
const MAX_QUOTED_PRICE: u64 = 1_000_000;

fn mentions_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}

/// Plausible won prices quoted in documents that mention a sale keyword.
pub fn quoted_prices(corpus: &[SearchDocument], sale_keywords: &[String]) -> Vec<u64> {
    corpus
        .iter()
        .map(SearchDocument::combined_text)
        .filter(|text| mentions_any(text, sale_keywords))
        .flat_map(|text| {
            WON_PRICE_PATTERN
                .captures_iter(&text)
                .filter_map(|caps| caps.get(1)?.as_str().replace(',', "").parse::<u64>().ok())
                .collect::<Vec<_>>()
        })
        .filter(|p| *p > MIN_QUOTED_PRICE && *p < MAX_QUOTED_PRICE)
        .collect()
}

/// Truncated mean of [`quoted_prices`].
pub fn average_quoted_price(corpus: &[SearchDocument], sale_keywords: &[String]) -> Option<f64> {
    let prices = quoted_prices(corpus, sale_keywords);
    if prices.is_empty() {
        return None;
    }
    Some((prices.iter().sum::<u64>() as f64 / prices.len() as f64).trunc())
}

/// Counts documents that look like someone selling the product.
pub struct CompetitorMentionScorer {
    keywords: Vec<String>,
    points_per_mention: f64,
    max_evidence: usize,
}

impl CompetitorMentionScorer {
    pub fn new(keywords: Vec<String>, points_per_mention: f64, max_evidence: usize) -> Self {
        Self {
            keywords,
            points_per_mention,
            max_evidence,
        }
    }
}

impl TextScorer for CompetitorMentionScorer {
    fn name(&self) -> &str {
        "competitor-mentions"
    }

    fn score(&self, corpus: &[SearchDocument]) -> TextScore {
        let mut matches = 0;
        let mut evidence = Vec::new();

        for doc in corpus {
            if mentions_any(&doc.combined_text(), &self.keywords) {
                matches += 1;
                if evidence.len() < self.max_evidence {
                    evidence.push(Evidence::new(
                        EvidenceCategory::Competition,
                        format!("Likely competitor: {} [result {}]", doc.title, doc.index),
                    ));
                }
            }
        }

        TextScore {
            points: cap_points(matches as f64 * self.points_per_mention),
            matches,
            evidence,
        }
    }
}

/// +2 points per document that names a raw material together with a
/// supply-risk keyword, starting from 1.
pub struct SupplyRiskScorer {
    materials: Vec<String>,
    risk_keywords: Vec<String>,
    max_evidence: usize,
}

impl SupplyRiskScorer {
    pub fn new(materials: Vec<String>, risk_keywords: Vec<String>, max_evidence: usize) -> Self {
        Self {
            materials,
            risk_keywords,
            max_evidence,
        }
    }
}

impl TextScorer for SupplyRiskScorer {
    fn name(&self) -> &str {
        "supply-risk"
    }

    fn score(&self, corpus: &[SearchDocument]) -> TextScore {
        let mut matches = 0;
        let mut evidence = Vec::new();

        for doc in corpus {
            let text = doc.combined_text();
            let names_material = self.materials.iter().any(|m| text.contains(m.as_str()));
            let names_risk = self.risk_keywords.iter().any(|k| text.contains(k.as_str()));
            if names_material && names_risk {
                matches += 1;
                if evidence.len() < self.max_evidence {
                    evidence.push(Evidence::new(
                        EvidenceCategory::Rarity,
                        format!("Cost pressure: {} [result {}]", doc.title, doc.index),
                    ));
                }
            }
        }

        TextScore {
            points: cap_points(1.0 + 2.0 * matches as f64),
            matches,
            evidence,
        }
    }
}
