use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, info};
use wreq::Client;

use crate::config::{KeywordConfig, Profile, SourceConfig};
use crate::engine::Signal;
use crate::error::CollectionError;
use crate::fetcher::naver_api::ShopItem;
use crate::fetcher::{Collection, MarketplaceScraper, NaverApiClient, SignalSource};
use crate::models::{Evidence, EvidenceCategory, SearchDocument, TrendPoint};
use crate::processor::{
    CompetitorMentionScorer, KeywordFrequencyScorer, ScorerFactory, SupplyRiskScorer, TextScorer,
    assess_search_trend, average_quoted_price, market_size_score, mean_clicks, mean_ratio,
};

/// Listing totals at or above this count mean saturated competition.
const SHOP_SATURATION_TOTAL: f64 = 10_000.0;
const CLICK_SCALE: f64 = 100_000.0;
const TOP_LISTINGS: usize = 5;

fn scored(
    collection: &mut Collection,
    scorer: &dyn TextScorer,
    corpus: &[SearchDocument],
) -> Signal {
    let score = scorer.score(corpus);
    debug!("{} matched {} documents", scorer.name(), score.matches);
    let signal = Signal::observed(score.normalized());
    collection.push_evidence(score.evidence);
    signal
}

/// Competition score plus the average price quoted alongside sale keywords.
fn score_competition(
    collection: &mut Collection,
    scorer: &dyn TextScorer,
    sale_keywords: &[String],
    corpus: &[SearchDocument],
) {
    collection.signals.avg_competitor_price = average_quoted_price(corpus, sale_keywords);
    collection.signals.competition = scored(collection, scorer, corpus);
}

fn materials_query(keywords: &KeywordConfig, product: &str) -> String {
    keywords.raw_materials_for(product).join(" ")
}

/// Supply-risk scorer over the raw materials mapped to each product.
pub struct SupplyRiskFactory {
    keywords: KeywordConfig,
    max_evidence: usize,
}

impl SupplyRiskFactory {
    pub fn new(keywords: KeywordConfig, max_evidence: usize) -> Self {
        Self {
            keywords,
            max_evidence,
        }
    }
}

impl ScorerFactory for SupplyRiskFactory {
    fn for_query(&self, query: &str) -> Box<dyn TextScorer> {
        Box::new(SupplyRiskScorer::new(
            self.keywords.raw_materials_for(query),
            self.keywords.supply_risk.clone(),
            self.max_evidence,
        ))
    }
}

/// Scores demand, competition and rarity from blog search results.
pub struct SearchCorpusSource {
    api: NaverApiClient,
    keywords: KeywordConfig,
    demand: Box<dyn TextScorer>,
    competition: Box<dyn TextScorer>,
    rarity: Box<dyn ScorerFactory>,
}

impl SearchCorpusSource {
    pub fn new(api: NaverApiClient, keywords: KeywordConfig, max_evidence: usize) -> Self {
        Self {
            demand: Box::new(KeywordFrequencyScorer::new(
                keywords.demand.clone(),
                EvidenceCategory::Demand,
                max_evidence,
            )),
            competition: Box::new(CompetitorMentionScorer::new(
                keywords.competition.clone(),
                2.0,
                max_evidence,
            )),
            rarity: Box::new(SupplyRiskFactory::new(keywords.clone(), max_evidence)),
            api,
            keywords,
        }
    }

    pub fn with_demand_scorer(mut self, scorer: Box<dyn TextScorer>) -> Self {
        self.demand = scorer;
        self
    }

    pub fn with_competition_scorer(mut self, scorer: Box<dyn TextScorer>) -> Self {
        self.competition = scorer;
        self
    }

    pub fn with_rarity_scorer(mut self, factory: Box<dyn ScorerFactory>) -> Self {
        self.rarity = factory;
        self
    }

    fn apply_competition(&self, collection: &mut Collection, corpus: &[SearchDocument]) {
        let sale_keywords = &self.keywords.competition;
        score_competition(collection, self.competition.as_ref(), sale_keywords, corpus);
    }

    fn apply_demand(&self, collection: &mut Collection, corpus: &[SearchDocument]) {
        collection.signals.demand = scored(collection, self.demand.as_ref(), corpus);
    }

    fn apply_rarity(&self, collection: &mut Collection, query: &str, corpus: &[SearchDocument]) {
        let scorer = self.rarity.for_query(query);
        collection.signals.rarity = scored(collection, scorer.as_ref(), corpus);
    }
}

#[async_trait]
impl SignalSource for SearchCorpusSource {
    fn name(&self) -> &str {
        "web-search"
    }

    async fn fetch_signals(&self, query: &str) -> Collection {
        let mut collection = Collection::new();

        let price_query = format!("\"{}\" 가격", query);
        if let Some(corpus) = collection.record(self.api.search_blog(&price_query).await) {
            self.apply_competition(&mut collection, &corpus);
        }

        let review_query = format!("\"{}\" 후기", query);
        if let Some(corpus) = collection.record(self.api.search_blog(&review_query).await) {
            self.apply_demand(&mut collection, &corpus);
        }

        let supply_query = format!("{} 가격 동향", materials_query(&self.keywords, query));
        if let Some(corpus) = collection.record(self.api.search_blog(&supply_query).await) {
            self.apply_rarity(&mut collection, query, &corpus);
        }

        collection
    }
}

/// Trend and shopping-insight APIs plus targeted blog searches.
pub struct DatalabSource {
    api: NaverApiClient,
    keywords: KeywordConfig,
    competition: Box<dyn TextScorer>,
    rarity: Box<dyn ScorerFactory>,
}

impl DatalabSource {
    pub fn new(api: NaverApiClient, keywords: KeywordConfig, max_evidence: usize) -> Self {
        Self {
            competition: Box::new(CompetitorMentionScorer::new(
                keywords.competition.clone(),
                1.0,
                max_evidence,
            )),
            rarity: Box::new(SupplyRiskFactory::new(keywords.clone(), max_evidence)),
            api,
            keywords,
        }
    }

    pub fn with_competition_scorer(mut self, scorer: Box<dyn TextScorer>) -> Self {
        self.competition = scorer;
        self
    }

    pub fn with_rarity_scorer(mut self, factory: Box<dyn ScorerFactory>) -> Self {
        self.rarity = factory;
        self
    }

    fn demand_from_trend(
        &self,
        collection: &mut Collection,
        query: &str,
        points: &[TrendPoint],
    ) -> Result<(), CollectionError> {
        let trend = assess_search_trend(points)
            .ok_or_else(|| CollectionError::no_data("datalab-trend", query))?;
        collection.signals.demand = Signal::from_ten_point(trend.score);
        collection.push_evidence([Evidence::new(
            EvidenceCategory::Demand,
            format!(
                "Search trend {}: last 3 months {:.1} vs previous 3 months {:.1}",
                trend.direction.label(),
                trend.recent_avg,
                trend.past_avg
            ),
        )]);
        Ok(())
    }

    fn apply_competition(&self, collection: &mut Collection, corpus: &[SearchDocument]) {
        let sale_keywords = &self.keywords.competition;
        score_competition(collection, self.competition.as_ref(), sale_keywords, corpus);
    }

    fn apply_rarity(&self, collection: &mut Collection, query: &str, corpus: &[SearchDocument]) {
        let scorer = self.rarity.for_query(query);
        collection.signals.rarity = scored(collection, scorer.as_ref(), corpus);
    }
}

#[async_trait]
impl SignalSource for DatalabSource {
    fn name(&self) -> &str {
        "datalab"
    }

    async fn fetch_signals(&self, query: &str) -> Collection {
        let mut collection = Collection::new();

        if let Some(points) = collection.record(self.api.search_trend(query).await) {
            let result = self.demand_from_trend(&mut collection, query, &points);
            collection.record(result);
        }

        if let Some(points) = collection.record(self.api.keyword_click_share(query).await) {
            if let Some(size) = market_size_score(&points) {
                collection.signals.popularity = Signal::from_ten_point(size);
                collection.push_evidence([Evidence::new(
                    EvidenceCategory::Popularity,
                    format!(
                        "Shopping click share over {} days, market size {:.1}/10",
                        points.len(),
                        size
                    ),
                )]);
            }
        }

        let sales_query = format!("\"{}\" 판매 가격", query);
        if let Some(corpus) = collection.record(self.api.search_blog(&sales_query).await) {
            self.apply_competition(&mut collection, &corpus);
        }

        let supply_query = format!("{} 가격 급등 수급", materials_query(&self.keywords, query));
        if let Some(corpus) = collection.record(self.api.search_blog(&supply_query).await) {
            self.apply_rarity(&mut collection, query, &corpus);
        }

        collection
    }
}

/// Shop search totals, trend ratios and category click counts.
pub struct ShopApiSource {
    api: NaverApiClient,
    own_brands: Vec<String>,
}

impl ShopApiSource {
    pub fn new(api: NaverApiClient, own_brands: Vec<String>) -> Self {
        Self { api, own_brands }
    }

    fn is_own_brand(&self, brand: &str, title: &str) -> bool {
        self.own_brands
            .iter()
            .any(|own| brand.contains(own.as_str()) || title.contains(own.as_str()))
    }

    /// One labelled line per top listing, with its store link when present.
    fn listing_evidence(&self, items: &[ShopItem]) -> Vec<Evidence> {
        items
            .iter()
            .take(TOP_LISTINGS)
            .map(|item| {
                let label = if self.is_own_brand(&item.brand, &item.title) {
                    "own brand"
                } else {
                    "competitor"
                };
                let mut text = format!("[{}] {} ({}원)", label, item.title, item.lprice);
                if !item.link.is_empty() {
                    text.push_str(&format!(" {}", item.link));
                }
                Evidence::new(EvidenceCategory::Listing, text)
            })
            .collect()
    }
}

#[async_trait]
impl SignalSource for ShopApiSource {
    fn name(&self) -> &str {
        "shop-api"
    }

    async fn fetch_signals(&self, query: &str) -> Collection {
        let mut collection = Collection::new();

        if let Some(search) = collection.record(self.api.search_shop(query).await) {
            let competition = (search.total as f64 / SHOP_SATURATION_TOTAL).min(1.0);
            collection.signals.competition = Signal::observed(competition);
            collection.signals.rarity = Signal::observed(1.0 - competition);
            collection.signals.product_count = Some(search.total.min(u32::MAX as u64) as u32);

            let brands: HashSet<&str> = search
                .items
                .iter()
                .map(|item| item.brand.trim())
                .filter(|brand| !brand.is_empty())
                .collect();
            collection.signals.brand_count = Some(brands.len() as u32);

            let prices: Vec<u64> = search.items.iter().filter_map(|i| i.lowest_price()).collect();
            if !prices.is_empty() {
                collection.signals.avg_competitor_price =
                    Some(prices.iter().sum::<u64>() as f64 / prices.len() as f64);
            }

            collection.push_evidence([Evidence::new(
                EvidenceCategory::Competition,
                format!("{} listings in shop search", search.total),
            )]);
            collection.push_evidence(self.listing_evidence(&search.items));
        }

        if let Some(points) = collection.record(self.api.search_trend(query).await) {
            if let Some(mean) = mean_ratio(&points) {
                collection.signals.popularity = Signal::observed(mean / 100.0);
            }
            let recent: Vec<Evidence> = points
                .iter()
                .rev()
                .take(3)
                .map(|p| {
                    Evidence::new(
                        EvidenceCategory::Popularity,
                        format!("{}: search ratio {:.1}", p.period, p.ratio),
                    )
                })
                .collect();
            collection.push_evidence(recent);
        }

        if let Some(points) = collection.record(self.api.category_clicks(query).await) {
            if let Some(mean) = mean_clicks(&points) {
                collection.signals.demand = Signal::observed(mean / CLICK_SCALE);
            }
            let recent: Vec<Evidence> = points
                .iter()
                .rev()
                .take(2)
                .map(|p| {
                    Evidence::new(
                        EvidenceCategory::Demand,
                        format!(
                            "{}: {} clicks",
                            p.period,
                            p.click_count.map_or(0, |c| c as u64)
                        ),
                    )
                })
                .collect();
            collection.push_evidence(recent);
        }

        collection
    }
}

/// The live source a profile collects from.
pub fn build_source(
    profile: Profile,
    config: &SourceConfig,
    client: Client,
) -> Box<dyn SignalSource> {
    let max_evidence = config.report.max_evidence_per_scorer;
    info!("Building {} signal source", profile.as_str());

    match profile {
        Profile::Marketplace => Box::new(MarketplaceScraper::new(
            client,
            config.marketplace.clone(),
            config.http.user_agent.clone(),
        )),
        Profile::WebSearch => Box::new(SearchCorpusSource::new(
            NaverApiClient::new(client, config.naver.clone()),
            config.keywords.clone(),
            max_evidence,
        )),
        Profile::Datalab => Box::new(DatalabSource::new(
            NaverApiClient::new(client, config.naver.clone()),
            config.keywords.clone(),
            max_evidence,
        )),
        Profile::ShopApi => Box::new(ShopApiSource::new(
            NaverApiClient::new(client, config.naver.clone()),
            config.keywords.own_brands.clone(),
        )),
    }
}
