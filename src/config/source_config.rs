use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;

/// Configuration for every signal source the collector can call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub http: HttpConfig,
    pub marketplace: MarketplaceConfig,
    pub naver: NaverApiConfig,
    pub keywords: KeywordConfig,
    pub estimated: EstimatedDefaults,
    pub fallback: FallbackConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 5,
            user_agent: Some("Mozilla/5.0".to_string()),
        }
    }
}

/// One marketplace search page and the selectors used to read its listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceSite {
    pub name: String,
    pub search_url: String,
    /// Query-string parameter that carries the product name.
    pub query_param: String,
    pub item_selector: String,
    pub name_selector: String,
    pub price_selector: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    pub max_items: usize,
    /// At least this many listings and `high_min_brands` brands means high competition.
    pub high_min_products: usize,
    pub high_min_brands: usize,
    pub medium_min_products: usize,
    pub sites: Vec<MarketplaceSite>,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            max_items: 10,
            high_min_products: 20,
            high_min_brands: 5,
            medium_min_products: 10,
            sites: vec![
                MarketplaceSite {
                    name: "naver-shopping".to_string(),
                    search_url: "https://search.shopping.naver.com/search/all".to_string(),
                    query_param: "query".to_string(),
                    item_selector: "li[class*='basicList_item']".to_string(),
                    name_selector: "a[class*='basicList_link']".to_string(),
                    price_selector: "span[class*='price_num']".to_string(),
                    enabled: true,
                },
                MarketplaceSite {
                    name: "coupang".to_string(),
                    search_url: "https://www.coupang.com/np/search".to_string(),
                    query_param: "q".to_string(),
                    item_selector: "li.search-product".to_string(),
                    name_selector: "div.name".to_string(),
                    price_selector: "strong.price-value".to_string(),
                    enabled: true,
                },
            ],
        }
    }
}

/// Endpoints and request parameters for the Naver open APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NaverApiConfig {
    pub blog_search_url: String,
    pub shop_search_url: String,
    pub trend_url: String,
    pub keyword_insight_url: String,
    pub category_insight_url: String,
    pub blog_display: u32,
    pub shop_display: u32,
    /// Shopping category used by the keyword click-share query (food).
    pub keyword_category: String,
    pub category_param: String,
    pub env_client_id: Option<String>,
    pub env_client_secret: Option<String>,
}

impl Default for NaverApiConfig {
    fn default() -> Self {
        Self {
            blog_search_url: "https://openapi.naver.com/v1/search/blog.json".to_string(),
            shop_search_url: "https://openapi.naver.com/v1/search/shop.json".to_string(),
            trend_url: "https://openapi.naver.com/v1/datalab/search".to_string(),
            keyword_insight_url:
                "https://openapi.naver.com/v1/datalab/shopping/category/keywords".to_string(),
            category_insight_url: "https://openapi.naver.com/v1/datalab/shopping/categories"
                .to_string(),
            blog_display: 20,
            shop_display: 100,
            keyword_category: "50000006".to_string(),
            category_param: "50000000".to_string(),
            env_client_id: None,
            env_client_secret: None,
        }
    }
}

/// API client credentials, loaded from the environment and never serialized.
#[derive(Clone)]
pub struct NaverCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for NaverCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NaverCredentials")
            .field("client_id", &"***")
            .field("client_secret", &"***")
            .finish()
    }
}

impl NaverApiConfig {
    pub fn load_credentials(&self) -> Result<NaverCredentials> {
        let id_var = self.env_client_id.as_deref().unwrap_or("NAVER_CLIENT_ID");
        let secret_var = self
            .env_client_secret
            .as_deref()
            .unwrap_or("NAVER_CLIENT_SECRET");

        let client_id = env::var(id_var)
            .with_context(|| format!("Missing environment variable: {}", id_var))?;
        let client_secret = env::var(secret_var)
            .with_context(|| format!("Missing environment variable: {}", secret_var))?;

        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            anyhow::bail!("Naver API credentials are empty");
        }

        Ok(NaverCredentials {
            client_id,
            client_secret,
        })
    }
}

/// Keyword lists behind the text scorers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub demand: Vec<String>,
    pub competition: Vec<String>,
    pub supply_risk: Vec<String>,
    /// product keyword -> raw materials searched for supply news
    pub raw_materials: BTreeMap<String, Vec<String>>,
    /// Brands treated as our own when labelling listings.
    pub own_brands: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for KeywordConfig {
    fn default() -> Self {
        let mut raw_materials = BTreeMap::new();
        raw_materials.insert("타코와사비".to_string(), strings(&["문어", "고추냉이"]));

        Self {
            demand: strings(&["후기", "리뷰", "레시피", "만들기", "맛집", "추천", "인기"]),
            competition: strings(&["판매", "구매", "쇼핑", "마켓", "가격"]),
            supply_risk: strings(&["급등", "인상", "부족", "어획량 감소", "수급 불안"]),
            raw_materials,
            own_brands: strings(&["고래미", "씨포스트", "설래담"]),
        }
    }
}

impl KeywordConfig {
    /// Raw materials for a product, falling back to the product name itself.
    pub fn raw_materials_for(&self, product_name: &str) -> Vec<String> {
        self.raw_materials
            .iter()
            .find(|(key, _)| product_name.contains(key.as_str()))
            .map(|(_, materials)| materials.clone())
            .unwrap_or_else(|| vec![product_name.to_string()])
    }
}

/// Scores used when live collection is skipped or has failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatedDefaults {
    pub rarity: f64,
    pub popularity: f64,
    pub demand: f64,
    pub competition: f64,
}

impl Default for EstimatedDefaults {
    fn default() -> Self {
        Self {
            rarity: 0.7,
            popularity: 0.4,
            demand: 0.6,
            competition: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackTrigger {
    /// Only when no score at all could be observed.
    #[default]
    Total,
    /// As soon as any sub-signal failed.
    Any,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub enabled: bool,
    pub trigger: FallbackTrigger,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger: FallbackTrigger::Total,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub max_evidence: usize,
    /// Cap applied by each text scorer before the report cap.
    pub max_evidence_per_scorer: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_evidence: 10,
            max_evidence_per_scorer: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = SourceConfig::default();
        assert_eq!(config.http.timeout_seconds, 5);
        assert_eq!(config.marketplace.max_items, 10);
        assert_eq!(config.marketplace.sites.len(), 2);
        assert_eq!(config.report.max_evidence, 10);
        assert!(config.fallback.enabled);
    }

    #[test]
    fn test_raw_materials_lookup() {
        let keywords = KeywordConfig::default();
        assert_eq!(
            keywords.raw_materials_for("매운 타코와사비 500g"),
            vec!["문어".to_string(), "고추냉이".to_string()]
        );
        assert_eq!(keywords.raw_materials_for("명란젓"), vec!["명란젓".to_string()]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: SourceConfig = toml::from_str(
            r#"
            [http]
            timeout_seconds = 3

            [fallback]
            trigger = "any"
            "#,
        )
        .unwrap();

        assert_eq!(config.http.timeout_seconds, 3);
        assert_eq!(config.fallback.trigger, FallbackTrigger::Any);
        assert_eq!(config.naver.blog_display, 20);
        assert!(!config.keywords.demand.is_empty());
    }

    #[test]
    fn test_credentials_loading() {
        unsafe {
            env::set_var("TEST_NAVER_ID", "id");
            env::set_var("TEST_NAVER_SECRET", "secret");
        }

        let mut config = NaverApiConfig::default();
        config.env_client_id = Some("TEST_NAVER_ID".to_string());
        config.env_client_secret = Some("TEST_NAVER_SECRET".to_string());

        let credentials = config.load_credentials().unwrap();
        assert_eq!(credentials.client_id, "id");
        assert_eq!(credentials.client_secret, "secret");
        assert!(!format!("{:?}", credentials).contains("\"secret\""));

        config.env_client_secret = Some("TEST_NAVER_SECRET_MISSING".to_string());
        assert!(config.load_credentials().is_err());

        unsafe {
            env::remove_var("TEST_NAVER_ID");
            env::remove_var("TEST_NAVER_SECRET");
        }
    }
}
