use chrono::{Duration as ChronoDuration, Local, Months, NaiveDate};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use wreq::{Client, RequestBuilder, Response};

use crate::config::{NaverApiConfig, NaverCredentials};
use crate::error::CollectionError;
use crate::models::{SearchDocument, TrendPoint};
use crate::processor::clean_markup;

/// A shop-search hit, prices as the API sends them (strings of digits).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShopItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub lprice: String,
    #[serde(default)]
    pub brand: String,
}

impl ShopItem {
    pub fn lowest_price(&self) -> Option<u64> {
        self.lprice.trim().parse::<u64>().ok().filter(|p| *p > 0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShopSearch {
    pub total: u64,
    pub items: Vec<ShopItem>,
}

#[derive(Deserialize)]
struct ShopResponse {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    items: Vec<ShopItem>,
}

#[derive(Deserialize)]
struct BlogItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    link: Option<String>,
}

#[derive(Deserialize)]
struct BlogResponse {
    #[serde(default)]
    items: Vec<BlogItem>,
}

/// Client for the Naver search and datalab APIs.
///
/// Missing credentials are not an error at construction time; every call then
/// reports `CollectionError::MissingCredentials` so the run can degrade.
pub struct NaverApiClient {
    client: Client,
    config: NaverApiConfig,
    credentials: Option<NaverCredentials>,
}

const SOURCE: &str = "naver-api";

impl NaverApiClient {
    pub fn new(client: Client, config: NaverApiConfig) -> Self {
        let credentials = match config.load_credentials() {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                warn!("Naver API disabled: {}", e);
                None
            }
        };
        Self {
            client,
            config,
            credentials,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, CollectionError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| CollectionError::MissingCredentials {
                source_name: SOURCE.to_string(),
            })?;
        Ok(request
            .header("X-Naver-Client-Id", &credentials.client_id)
            .header("X-Naver-Client-Secret", &credentials.client_secret))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, CollectionError> {
        let response: Response = request
            .send()
            .await
            .map_err(|e| CollectionError::network(SOURCE, e))?;

        if !response.status().is_success() {
            return Err(CollectionError::Http {
                source_name: SOURCE.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CollectionError::parse(SOURCE, e))
    }

    /// Blog search, cleaned into scorer documents.
    pub async fn search_blog(&self, query: &str) -> Result<Vec<SearchDocument>, CollectionError> {
        info!("Searching blogs for: {}", query);
        let display = self.config.blog_display.to_string();
        let request = self
            .client
            .get(&self.config.blog_search_url)
            .query(&[("query", query), ("display", display.as_str())]);
        let body = self.send(self.authorize(request)?).await?;

        let documents = parse_blog_documents(body)?;
        if documents.is_empty() {
            return Err(CollectionError::no_data(SOURCE, query));
        }
        info!("Found {} blog documents for {}", documents.len(), query);
        Ok(documents)
    }

    pub async fn search_shop(&self, query: &str) -> Result<ShopSearch, CollectionError> {
        info!("Searching shop listings for: {}", query);
        let display = self.config.shop_display.to_string();
        let request = self
            .client
            .get(&self.config.shop_search_url)
            .query(&[("query", query), ("display", display.as_str())]);
        let body = self.send(self.authorize(request)?).await?;

        let search = parse_shop_search(body)?;
        info!("Shop search for {}: {} total listings", query, search.total);
        Ok(search)
    }

    /// Monthly search-trend ratios over the last twelve months.
    pub async fn search_trend(&self, keyword: &str) -> Result<Vec<TrendPoint>, CollectionError> {
        let (start, end) = months_back(12);
        let payload = json!({
            "startDate": start,
            "endDate": end,
            "timeUnit": "month",
            "keywordGroups": [{ "groupName": keyword, "keywords": [keyword] }],
        });
        self.datalab(&self.config.trend_url, keyword, payload).await
    }

    /// Daily click share of the keyword within the configured shopping
    /// category over the last thirty days.
    pub async fn keyword_click_share(
        &self,
        keyword: &str,
    ) -> Result<Vec<TrendPoint>, CollectionError> {
        let (start, end) = days_back(30);
        let payload = json!({
            "startDate": start,
            "endDate": end,
            "timeUnit": "date",
            "category": self.config.keyword_category,
            "keyword": [{ "name": keyword, "param": [keyword] }],
        });
        self.datalab(&self.config.keyword_insight_url, keyword, payload)
            .await
    }

    /// Monthly shopping clicks for the configured category over twelve months.
    pub async fn category_clicks(&self, keyword: &str) -> Result<Vec<TrendPoint>, CollectionError> {
        let (start, end) = months_back(12);
        let payload = json!({
            "startDate": start,
            "endDate": end,
            "timeUnit": "month",
            "category": [{ "name": keyword, "param": [self.config.category_param] }],
        });
        self.datalab(&self.config.category_insight_url, keyword, payload)
            .await
    }

    async fn datalab(
        &self,
        url: &str,
        keyword: &str,
        payload: Value,
    ) -> Result<Vec<TrendPoint>, CollectionError> {
        info!("Requesting datalab series from {} for {}", url, keyword);
        let request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(&payload);
        let body = self.send(self.authorize(request)?).await?;

        let points = parse_datalab_series(&body)?;
        if points.is_empty() {
            return Err(CollectionError::no_data(SOURCE, keyword));
        }
        Ok(points)
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn months_back(months: u32) -> (String, String) {
    let end = Local::now().date_naive();
    let start = end.checked_sub_months(Months::new(months)).unwrap_or(end);
    (format_date(start), format_date(end))
}

fn days_back(days: i64) -> (String, String) {
    let end = Local::now().date_naive();
    (format_date(end - ChronoDuration::days(days)), format_date(end))
}

pub fn parse_blog_documents(body: Value) -> Result<Vec<SearchDocument>, CollectionError> {
    let response: BlogResponse =
        serde_json::from_value(body).map_err(|e| CollectionError::parse(SOURCE, e))?;

    Ok(response
        .items
        .into_iter()
        .enumerate()
        .map(|(i, item)| SearchDocument {
            index: i + 1,
            title: clean_markup(&item.title),
            snippet: clean_markup(&item.description),
            link: item.link,
        })
        .collect())
}

pub fn parse_shop_search(body: Value) -> Result<ShopSearch, CollectionError> {
    let response: ShopResponse =
        serde_json::from_value(body).map_err(|e| CollectionError::parse(SOURCE, e))?;

    Ok(ShopSearch {
        total: response.total,
        items: response
            .items
            .into_iter()
            .map(|item| ShopItem {
                title: clean_markup(&item.title),
                ..item
            })
            .collect(),
    })
}

/// The `data` array of the first result group.
pub fn parse_datalab_series(body: &Value) -> Result<Vec<TrendPoint>, CollectionError> {
    let data = body
        .get("results")
        .and_then(|r| r.as_array())
        .and_then(|groups| groups.first())
        .and_then(|group| group.get("data"))
        .ok_or_else(|| CollectionError::parse(SOURCE, "missing results[0].data"))?;

    serde_json::from_value(data.clone()).map_err(|e| CollectionError::parse(SOURCE, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_documents_are_cleaned_and_indexed() {
        let body = json!({
            "total": 2,
            "items": [
                {
                    "title": "<b>타코와사비</b> 후기",
                    "description": "맛있는 &quot;안주&quot;",
                    "link": "https://blog/1"
                },
                { "title": "레시피", "description": "" }
            ]
        });
        let docs = parse_blog_documents(body).unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].index, 1);
        assert_eq!(docs[0].title, "타코와사비 후기");
        assert_eq!(docs[0].snippet, "맛있는 \"안주\"");
        assert_eq!(docs[1].link, None);
    }

    #[test]
    fn test_shop_search_parsing() {
        let body = json!({
            "total": 5321,
            "items": [
                {
                    "title": "<b>고래미</b> 타코와사비",
                    "link": "https://smartstore.naver.com/goraemi/1",
                    "lprice": "8900",
                    "brand": "고래미",
                    "mallName": "네이버"
                },
                { "title": "타코와사비 1kg", "lprice": "", "brand": "" }
            ]
        });
        let search = parse_shop_search(body).unwrap();

        assert_eq!(search.total, 5321);
        assert_eq!(search.items[0].title, "고래미 타코와사비");
        assert_eq!(search.items[0].link, "https://smartstore.naver.com/goraemi/1");
        assert_eq!(search.items[0].lowest_price(), Some(8_900));
        assert_eq!(search.items[1].link, "");
        assert_eq!(search.items[1].lowest_price(), None);
    }

    #[test]
    fn test_datalab_series() {
        let body = json!({
            "startDate": "2025-10-15",
            "results": [{
                "title": "타코와사비",
                "data": [
                    { "period": "2025-10-01", "ratio": 42.5 },
                    { "period": "2025-11-01", "ratio": 50.0, "clickCount": 1200 }
                ]
            }]
        });
        let points = parse_datalab_series(&body).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].click_count, None);
        assert_eq!(points[1].click_count, Some(1200.0));
    }

    #[test]
    fn test_datalab_error_body_is_parse_failure() {
        let body = json!({ "errorMessage": "Authentication failed", "errorCode": "024" });
        assert!(matches!(
            parse_datalab_series(&body),
            Err(CollectionError::Parse { .. })
        ));
    }

    #[test]
    fn test_date_ranges() {
        let (start, end) = months_back(12);
        assert_eq!(start.len(), 10);
        assert!(start < end);
        let (start, end) = days_back(30);
        assert!(start < end);
    }
}
