use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{EstimatedDefaults, FallbackConfig, FallbackTrigger};
use crate::engine::{Signal, SignalSet};
use crate::error::CollectionError;
use crate::models::{Evidence, EvidenceCategory};

/// Everything one source produced for a query. Partial results are normal.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub signals: SignalSet,
    pub evidence: Vec<Evidence>,
    pub failures: Vec<CollectionError>,
    /// True when the scores come from the estimated defaults.
    pub estimated: bool,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unwraps a sub-signal result, recording the failure if there is one.
    pub fn record<T>(&mut self, result: Result<T, CollectionError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("⚠️ {}", e);
                self.failures.push(e);
                None
            }
        }
    }

    pub fn push_evidence(&mut self, evidence: impl IntoIterator<Item = Evidence>) {
        self.evidence.extend(evidence);
    }
}

/// A provider of market signals for a product name.
#[async_trait]
pub trait SignalSource: Send + Sync {
    fn name(&self) -> &str;

    /// Never fails as a whole: per-signal failures land in `Collection::failures`.
    async fn fetch_signals(&self, query: &str) -> Collection;
}

/// Fixed neutral-leaning scores used when live data is missing.
pub struct EstimatedSource {
    defaults: EstimatedDefaults,
}

impl EstimatedSource {
    pub fn new(defaults: EstimatedDefaults) -> Self {
        Self { defaults }
    }

    pub fn estimate(&self) -> Collection {
        let d = &self.defaults;
        let signals = SignalSet {
            rarity: Signal::observed(d.rarity),
            popularity: Signal::observed(d.popularity),
            demand: Signal::observed(d.demand),
            competition: Signal::observed(d.competition),
            ..SignalSet::default()
        };
        let evidence = vec![
            Evidence::new(
                EvidenceCategory::Estimate,
                format!("Estimated mode: assumed new product, rarity {:.2}", d.rarity),
            ),
            Evidence::new(
                EvidenceCategory::Estimate,
                format!("Estimated mode: early popularity {:.2}", d.popularity),
            ),
            Evidence::new(
                EvidenceCategory::Estimate,
                format!("Estimated mode: expected demand growth {:.2}", d.demand),
            ),
            Evidence::new(
                EvidenceCategory::Estimate,
                format!("Estimated mode: moderate competition {:.2}", d.competition),
            ),
        ];

        Collection {
            signals,
            evidence,
            failures: Vec::new(),
            estimated: true,
        }
    }
}

#[async_trait]
impl SignalSource for EstimatedSource {
    fn name(&self) -> &str {
        "estimated"
    }

    async fn fetch_signals(&self, _query: &str) -> Collection {
        self.estimate()
    }
}

/// Runs one live source and falls back to estimated mode once when the
/// live run did not deliver.
pub struct SignalCollector {
    source: Box<dyn SignalSource>,
    estimated: EstimatedSource,
    fallback: FallbackConfig,
}

impl SignalCollector {
    pub fn new(
        source: Box<dyn SignalSource>,
        defaults: EstimatedDefaults,
        fallback: FallbackConfig,
    ) -> Self {
        Self {
            source,
            estimated: EstimatedSource::new(defaults),
            fallback,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn needs_fallback(&self, live: &Collection) -> bool {
        if !self.fallback.enabled {
            return false;
        }
        match self.fallback.trigger {
            FallbackTrigger::Total => live.signals.observed_scores() == 0,
            FallbackTrigger::Any => !live.failures.is_empty(),
        }
    }

    pub async fn collect(&self, query: &str) -> Collection {
        info!("🔍 Collecting signals for '{}' from {}", query, self.source.name());
        let live = self.source.fetch_signals(query).await;
        info!(
            "Collected {} of 4 scores with {} failures from {}",
            live.signals.observed_scores(),
            live.failures.len(),
            self.source.name()
        );

        if !self.needs_fallback(&live) {
            return live;
        }

        warn!("⚠️ Live data insufficient, switching to estimated mode");
        self.into_estimated(live)
    }

    /// Estimated scores, keeping whatever auxiliary counts and evidence the
    /// live run did produce.
    fn into_estimated(&self, live: Collection) -> Collection {
        let mut estimated = self.estimated.estimate();
        estimated.signals.merge_missing(&live.signals);
        estimated.evidence.extend(live.evidence);
        estimated.failures = live.failures;
        estimated
    }

    /// Skips the live source entirely.
    pub fn collect_estimated(&self) -> Collection {
        info!("Using estimated mode without live collection");
        self.estimated.estimate()
    }
}
