use anyhow::{Result, anyhow};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::config::MarketplaceConfig;
use crate::engine::{CompetitionLevel, SignalSet};
use crate::models::Listing;

/// Aggregate view of the listings found for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSummary {
    pub product_count: usize,
    /// Distinct brands in first-seen order.
    pub brands: Vec<String>,
    pub avg_price: Option<f64>,
}

impl ListingSummary {
    pub fn brand_count(&self) -> usize {
        self.brands.len()
    }
}

/// Cleans scraped listing text and turns listings into competition signals.
pub struct ListingProcessor;

impl ListingProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean and normalize price text such as "12,500원" or "₩ 9,900".
    pub fn clean_price(&self, price_text: &str) -> Result<u64> {
        let numeric_part: String = price_text
            .replace("원", "")
            .replace('₩', "")
            .replace(',', "")
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();

        if numeric_part.is_empty() {
            return Err(anyhow!("No numeric value found in price: {}", price_text));
        }

        let price: u64 = numeric_part
            .parse()
            .map_err(|_| anyhow!("Failed to parse price: {}", numeric_part))?;

        if price == 0 {
            return Err(anyhow!("Invalid price value: {}", price));
        }
        Ok(price)
    }

    /// Brand as the first word of the title, without surrounding brackets.
    pub fn extract_brand(&self, name: &str) -> Option<String> {
        let first = name.split_whitespace().next()?;
        let brand = first.trim_matches(|c| matches!(c, '[' | ']' | '(' | ')' | '【' | '】'));
        if brand.is_empty() {
            return None;
        }
        Some(brand.to_string())
    }

    /// Check if a listing is an advertisement slot rather than a product
    pub fn is_excluded(&self, listing: &Listing) -> bool {
        let name_lower = listing.name.to_lowercase();
        ["광고", "sponsored", "advertisement"]
            .iter()
            .any(|keyword| name_lower.contains(keyword))
    }

    pub fn filter_listings(&self, listings: Vec<Listing>) -> Vec<Listing> {
        let before = listings.len();
        let kept: Vec<Listing> = listings
            .into_iter()
            .filter(|listing| !listing.name.trim().is_empty() && listing.price > 0)
            .filter(|listing| !self.is_excluded(listing))
            .collect();

        if kept.len() < before {
            warn!("Dropped {} listings (empty, unpriced or ads)", before - kept.len());
        }
        kept
    }

    pub fn summarize(&self, listings: &[Listing]) -> ListingSummary {
        let mut seen = HashSet::new();
        let mut brands = Vec::new();
        for listing in listings {
            if let Some(brand) = self.extract_brand(&listing.name) {
                if seen.insert(brand.clone()) {
                    brands.push(brand);
                }
            }
        }

        let avg_price = if listings.is_empty() {
            None
        } else {
            Some(listings.iter().map(|l| l.price as f64).sum::<f64>() / listings.len() as f64)
        };

        info!(
            "Summarized {} listings: {} brands, avg price {:?}",
            listings.len(),
            brands.len(),
            avg_price
        );

        ListingSummary {
            product_count: listings.len(),
            brands,
            avg_price,
        }
    }
}

impl Default for ListingProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Competition level from listing and brand counts.
pub fn classify_competition(
    product_count: usize,
    brand_count: usize,
    config: &MarketplaceConfig,
) -> CompetitionLevel {
    if product_count >= config.high_min_products && brand_count >= config.high_min_brands {
        CompetitionLevel::High
    } else if product_count >= config.medium_min_products {
        CompetitionLevel::Medium
    } else {
        CompetitionLevel::Low
    }
}

/// Competition level for a signal set: counts when present, otherwise the
/// normalized competition score split into thirds, otherwise medium.
pub fn competition_level_for(
    signals: &SignalSet,
    config: &MarketplaceConfig,
) -> CompetitionLevel {
    if let Some(count) = signals.product_count {
        return classify_competition(
            count as usize,
            signals.brand_count.unwrap_or(0) as usize,
            config,
        );
    }
    match signals.competition.value() {
        Some(score) if score < 1.0 / 3.0 => CompetitionLevel::Low,
        Some(score) if score < 2.0 / 3.0 => CompetitionLevel::Medium,
        Some(_) => CompetitionLevel::High,
        None => CompetitionLevel::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Signal;

    fn listing(name: &str, price: u64) -> Listing {
        Listing {
            name: name.to_string(),
            price,
            site: "test".to_string(),
        }
    }

    #[test]
    fn test_price_cleaning() {
        let processor = ListingProcessor::new();

        assert_eq!(processor.clean_price("12,500원").unwrap(), 12_500);
        assert_eq!(processor.clean_price("₩ 9,900").unwrap(), 9_900);
        assert_eq!(processor.clean_price("2100").unwrap(), 2_100);

        assert!(processor.clean_price("가격문의").is_err());
        assert!(processor.clean_price("0원").is_err());
        assert!(processor.clean_price("").is_err());
    }

    #[test]
    fn test_brand_extraction() {
        let processor = ListingProcessor::new();
        assert_eq!(processor.extract_brand("고래미 타코와사비 500g"), Some("고래미".to_string()));
        assert_eq!(processor.extract_brand("[씨포스트] 명란젓"), Some("씨포스트".to_string()));
        assert_eq!(processor.extract_brand("   "), None);
    }

    #[test]
    fn test_summary_counts_distinct_brands() {
        let processor = ListingProcessor::new();
        let listings = vec![
            listing("고래미 타코와사비 500g", 9_000),
            listing("고래미 타코와사비 1kg", 15_000),
            listing("바다원 타코와사비", 6_000),
        ];
        let summary = processor.summarize(&listings);

        assert_eq!(summary.product_count, 3);
        assert_eq!(summary.brands, vec!["고래미".to_string(), "바다원".to_string()]);
        assert_eq!(summary.avg_price, Some(10_000.0));
    }

    #[test]
    fn test_filter_drops_ads() {
        let processor = ListingProcessor::new();
        let kept = processor.filter_listings(vec![
            listing("광고 타코와사비", 5_000),
            listing("타코와사비", 5_000),
            listing("", 5_000),
        ]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_competition_classification() {
        let config = MarketplaceConfig::default();
        assert_eq!(classify_competition(20, 5, &config), CompetitionLevel::High);
        assert_eq!(classify_competition(20, 4, &config), CompetitionLevel::Medium);
        assert_eq!(classify_competition(10, 1, &config), CompetitionLevel::Medium);
        assert_eq!(classify_competition(9, 9, &config), CompetitionLevel::Low);
    }

    #[test]
    fn test_level_from_score_when_counts_missing() {
        let config = MarketplaceConfig::default();
        let mut signals = SignalSet::default();
        assert_eq!(competition_level_for(&signals, &config), CompetitionLevel::Medium);

        signals.competition = Signal::Observed(0.9);
        assert_eq!(competition_level_for(&signals, &config), CompetitionLevel::High);

        signals.product_count = Some(3);
        assert_eq!(competition_level_for(&signals, &config), CompetitionLevel::Low);
    }

    #[test]
    fn test_nan_competition_score_falls_back_to_medium() {
        let config = MarketplaceConfig::default();
        let signals = SignalSet {
            competition: Signal::Observed(f64::NAN),
            ..SignalSet::default()
        };
        assert_eq!(competition_level_for(&signals, &config), CompetitionLevel::Medium);
    }
}
