use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};
use wreq::Client;

use crate::config::{MarketplaceConfig, MarketplaceSite};
use crate::engine::Signal;
use crate::error::CollectionError;
use crate::fetcher::{Collection, SignalSource};
use crate::models::{Evidence, EvidenceCategory, Listing};
use crate::processor::ListingProcessor;

/// Scrapes marketplace search pages for competing listings.
pub struct MarketplaceScraper {
    client: Client,
    config: MarketplaceConfig,
    processor: ListingProcessor,
    user_agent: Option<String>,
}

impl MarketplaceScraper {
    pub fn new(client: Client, config: MarketplaceConfig, user_agent: Option<String>) -> Self {
        Self {
            client,
            config,
            processor: ListingProcessor::new(),
            user_agent,
        }
    }

    /// Fetch one site's search page and extract its listings
    pub async fn fetch_site(
        &self,
        site: &MarketplaceSite,
        query: &str,
    ) -> Result<Vec<Listing>, CollectionError> {
        info!("Scraping {} for: {}", site.name, query);

        let mut request = self
            .client
            .get(&site.search_url)
            .query(&[(site.query_param.as_str(), query)]);
        if let Some(agent) = &self.user_agent {
            request = request.header("User-Agent", agent);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CollectionError::network(&site.name, e))?;

        if !response.status().is_success() {
            return Err(CollectionError::Http {
                source_name: site.name.clone(),
                status: response.status().as_u16(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| CollectionError::network(&site.name, e))?;

        let listings = parse_listings(&html, site, self.config.max_items, &self.processor)?;
        info!("Extracted {} listings from {}", listings.len(), site.name);
        Ok(listings)
    }
}

fn selector(site: &MarketplaceSite, css: &str) -> Result<Selector, CollectionError> {
    Selector::parse(css).map_err(|e| {
        CollectionError::parse(&site.name, format!("invalid selector '{}': {:?}", css, e))
    })
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

/// Listings from a search page, at most `max_items`, ads and unpriced items
/// removed.
pub fn parse_listings(
    html: &str,
    site: &MarketplaceSite,
    max_items: usize,
    processor: &ListingProcessor,
) -> Result<Vec<Listing>, CollectionError> {
    let item_selector = selector(site, &site.item_selector)?;
    let name_selector = selector(site, &site.name_selector)?;
    let price_selector = selector(site, &site.price_selector)?;

    let document = Html::parse_document(html);
    let mut listings = Vec::new();

    for item in document.select(&item_selector).take(max_items) {
        let Some(name) = item.select(&name_selector).next().map(element_text) else {
            continue;
        };
        let Some(price_text) = item.select(&price_selector).next().map(element_text) else {
            continue;
        };

        match processor.clean_price(&price_text) {
            Ok(price) => listings.push(Listing {
                name,
                price,
                site: site.name.clone(),
            }),
            Err(e) => warn!("Skipping listing '{}' on {}: {}", name, site.name, e),
        }
    }

    Ok(processor.filter_listings(listings))
}

#[async_trait]
impl SignalSource for MarketplaceScraper {
    fn name(&self) -> &str {
        "marketplace"
    }

    async fn fetch_signals(&self, query: &str) -> Collection {
        let mut collection = Collection::new();
        let mut listings = Vec::new();
        let mut reached = 0;

        for site in self.config.sites.iter().filter(|s| s.enabled) {
            if let Some(found) = collection.record(self.fetch_site(site, query).await) {
                reached += 1;
                listings.extend(found);
            }
        }

        if reached == 0 {
            return collection;
        }
        if listings.is_empty() {
            collection.failures.push(CollectionError::no_data(self.name(), query));
        }

        let summary = self.processor.summarize(&listings);
        let signals = &mut collection.signals;
        signals.product_count = Some(summary.product_count as u32);
        signals.brand_count = Some(summary.brand_count() as u32);
        signals.avg_competitor_price = summary.avg_price;
        signals.competition = Signal::observed(
            summary.product_count as f64 / self.config.high_min_products.max(1) as f64,
        );

        collection.push_evidence(std::iter::once(Evidence::new(
            EvidenceCategory::Listing,
            format!(
                "{} listings from {} brands across {} sites",
                summary.product_count,
                summary.brand_count(),
                reached
            ),
        )));
        collection.push_evidence(listings.iter().take(5).map(|l| {
            Evidence::new(
                EvidenceCategory::Listing,
                format!("{}: {} ({}원)", l.site, l.name, l.price),
            )
        }));

        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
        <html><body><ul>
          <li class="search-product">
            <div class="name">고래미 타코와사비 500g</div>
            <strong class="price-value">9,900</strong>
          </li>
          <li class="search-product">
            <div class="name">광고 바다원 타코와사비</div>
            <strong class="price-value">7,000</strong>
          </li>
          <li class="search-product">
            <div class="name">바다원 타코와사비 1kg</div>
            <strong class="price-value">15,900원</strong>
          </li>
          <li class="search-product">
            <div class="name">품절 상품</div>
            <strong class="price-value">일시품절</strong>
          </li>
          <li class="search-product">
            <div class="name">가격 없는 상품</div>
          </li>
        </ul></body></html>
    "#;

    fn coupang() -> MarketplaceSite {
        MarketplaceConfig::default()
            .sites
            .into_iter()
            .find(|s| s.name == "coupang")
            .unwrap()
    }

    #[test]
    fn test_parse_listings_skips_ads_and_unpriced() {
        let listings =
            parse_listings(SEARCH_PAGE, &coupang(), 10, &ListingProcessor::new()).unwrap();

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].name, "고래미 타코와사비 500g");
        assert_eq!(listings[0].price, 9_900);
        assert_eq!(listings[1].price, 15_900);
        assert!(listings.iter().all(|l| l.site == "coupang"));
    }

    #[test]
    fn test_parse_listings_respects_max_items() {
        let listings =
            parse_listings(SEARCH_PAGE, &coupang(), 1, &ListingProcessor::new()).unwrap();
        assert_eq!(listings.len(), 1);
    }

    #[test]
    fn test_invalid_selector_is_parse_error() {
        let mut site = coupang();
        site.item_selector = "li[".to_string();
        let result = parse_listings(SEARCH_PAGE, &site, 10, &ListingProcessor::new());
        assert!(matches!(result, Err(CollectionError::Parse { .. })));
    }
}
