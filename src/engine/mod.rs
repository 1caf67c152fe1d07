//! Pure margin and price computation.
//!
//! Nothing in this module performs I/O. Every entry point takes the signals
//! and configuration explicitly and returns a fresh result.

pub mod categorical;
pub mod continuous;
pub mod pricing;
pub mod signals;
pub mod tiers;

pub use categorical::*;
pub use continuous::*;
pub use pricing::*;
pub use signals::*;
pub use tiers::*;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::{MarginConfig, StrategyConfig};
use crate::error::InputResult;

/// How the suggested margin was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MarginScore {
    Continuous(ContinuousBreakdown),
    Categorical(CategoricalBreakdown),
    Manual(f64),
}

impl MarginScore {
    pub fn suggested_margin(&self) -> f64 {
        match self {
            MarginScore::Continuous(b) => b.suggested_margin,
            MarginScore::Categorical(b) => b.suggested_margin,
            MarginScore::Manual(m) => *m,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginResult {
    pub score: MarginScore,
    /// Clamped margin as a fraction.
    pub suggested_margin: f64,
    pub prices: Option<PriceTiers>,
}

impl MarginResult {
    pub fn suggested_margin_pct(&self) -> f64 {
        self.suggested_margin * 100.0
    }
}

/// Per-run pricing options besides the signals themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingOptions {
    pub cost: Option<CostInput>,
    pub retail_use: bool,
}

impl Default for PricingOptions {
    fn default() -> Self {
        Self {
            cost: None,
            retail_use: true,
        }
    }
}

impl PricingOptions {
    pub fn with_cost(cost: CostInput) -> Self {
        Self {
            cost: Some(cost),
            ..Self::default()
        }
    }
}

pub struct MarginEngine {
    config: MarginConfig,
}

impl MarginEngine {
    /// Rejects configurations the engine cannot evaluate, such as an
    /// inverted band or a negative weight.
    pub fn new(config: MarginConfig) -> Result<Self> {
        config.validate().context("Invalid margin configuration")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MarginConfig {
        &self.config
    }

    /// Scores the signals with the configured strategy.
    ///
    /// The continuous strategy reads the four scores and ignores `selection`;
    /// the categorical strategy reads only `selection`.
    pub fn score(
        &self,
        signals: &SignalSet,
        selection: &CategoricalSelection,
    ) -> InputResult<MarginScore> {
        match &self.config.strategy {
            StrategyConfig::Continuous(config) => {
                let scores = signals.resolve(config.neutral_score);
                Ok(MarginScore::Continuous(continuous_margin(config, &scores)))
            }
            StrategyConfig::Categorical(config) => {
                Ok(MarginScore::Categorical(categorical_margin(config, selection)?))
            }
        }
    }

    pub fn evaluate(
        &self,
        signals: &SignalSet,
        selection: &CategoricalSelection,
        options: PricingOptions,
    ) -> InputResult<MarginResult> {
        let score = self.score(signals, selection)?;
        Ok(self.finish(score, signals.competitor_price(), options))
    }

    /// Prices a user-chosen margin percentage instead of a scored one.
    pub fn evaluate_manual(
        &self,
        margin_pct: f64,
        avg_competitor_price: Option<f64>,
        options: PricingOptions,
    ) -> InputResult<MarginResult> {
        let margin = manual_margin(margin_pct)?;
        Ok(self.finish(MarginScore::Manual(margin), avg_competitor_price, options))
    }

    fn finish(
        &self,
        score: MarginScore,
        avg_competitor_price: Option<f64>,
        options: PricingOptions,
    ) -> MarginResult {
        let suggested_margin = score.suggested_margin();
        let prices = options.cost.and_then(|cost| {
            derive_prices(
                &self.config.pricing,
                suggested_margin,
                cost.value(),
                options.retail_use,
                avg_competitor_price,
            )
        });

        MarginResult {
            score,
            suggested_margin,
            prices,
        }
    }
}
