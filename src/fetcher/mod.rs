pub mod marketplace_fetcher;
pub mod naver_api;
pub mod signal_collector;
pub mod sources;

pub use marketplace_fetcher::MarketplaceScraper;
pub use naver_api::NaverApiClient;
pub use signal_collector::*;
pub use sources::*;

use anyhow::Result;
use std::time::Duration;
use wreq::Client;
use wreq_util::Emulation;

use crate::config::HttpConfig;

/// HTTP client shared by all sources of one run. Every request is bounded by
/// the configured timeout and is never retried.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .emulation(Emulation::Firefox136)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()?;
    Ok(client)
}
