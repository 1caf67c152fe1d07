use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named parameterizations of the margin engine, one per collection flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    /// Listing counts scraped from marketplace search pages.
    Marketplace,
    /// Keyword scoring over web search results.
    WebSearch,
    /// Search-trend and shopping-insight APIs plus web search.
    #[default]
    Datalab,
    /// Shop search API totals with trend and click ratios.
    ShopApi,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Marketplace => "marketplace",
            Profile::WebSearch => "web-search",
            Profile::Datalab => "datalab",
            Profile::ShopApi => "shop-api",
        }
    }
}

impl std::str::FromStr for Profile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "marketplace" => Ok(Profile::Marketplace),
            "web-search" | "websearch" => Ok(Profile::WebSearch),
            "datalab" => Ok(Profile::Datalab),
            "shop-api" | "shopapi" => Ok(Profile::ShopApi),
            other => Err(anyhow!("Unknown profile: {}", other)),
        }
    }
}

/// Floor and ceiling applied to every suggested margin (fractions).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginBand {
    pub min: f64,
    pub max: f64,
}

impl MarginBand {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Never panics: inverted bounds are reordered and a NaN bound is ignored.
    pub fn clamp(&self, margin: f64) -> f64 {
        let lo = self.min.min(self.max);
        let hi = self.max.max(self.min);
        if margin.is_nan() {
            return lo;
        }
        margin.max(lo).min(hi)
    }

    pub fn contains(&self, margin: f64) -> bool {
        margin >= self.min && margin <= self.max
    }

    fn validate(&self) -> Result<()> {
        if !(self.min.is_finite() && self.max.is_finite()) {
            return Err(anyhow!("Margin band bounds must be finite"));
        }
        if self.min < 0.0 || self.max > 1.0 || self.min > self.max {
            return Err(anyhow!(
                "Margin band must satisfy 0 <= min <= max <= 1, got [{}, {}]",
                self.min,
                self.max
            ));
        }
        Ok(())
    }
}

/// Per-axis weights for continuous scoring, in margin fraction per scale unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisWeights {
    pub demand: f64,
    pub popularity: f64,
    pub rarity: f64,
    pub competition: f64,
}

/// Weighted-sum scoring over four normalized scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousConfig {
    pub base_margin: f64,
    /// Normalized scores are multiplied by this before the midpoint is subtracted.
    pub scale: f64,
    pub midpoint: f64,
    pub weights: AxisWeights,
    pub band: MarginBand,
    /// Substituted for any unavailable score, on the normalized [0,1] scale.
    #[serde(default = "default_neutral_score")]
    pub neutral_score: f64,
}

fn default_neutral_score() -> f64 {
    0.5
}

impl ContinuousConfig {
    /// 0–10 keyword scores over web search results.
    pub fn web_search() -> Self {
        Self {
            base_margin: 0.30,
            scale: 10.0,
            midpoint: 5.0,
            weights: AxisWeights {
                demand: 0.01,
                popularity: 0.0,
                rarity: 0.01,
                competition: 0.01,
            },
            band: MarginBand::new(0.10, 0.70),
            neutral_score: default_neutral_score(),
        }
    }

    /// Trend-weighted scoring with a market-size term.
    pub fn datalab() -> Self {
        Self {
            base_margin: 0.35,
            scale: 10.0,
            midpoint: 5.0,
            weights: AxisWeights {
                demand: 0.015,
                popularity: 0.01,
                rarity: 0.01,
                competition: 0.015,
            },
            band: MarginBand::new(0.15, 0.70),
            neutral_score: default_neutral_score(),
        }
    }

    /// `(rarity + popularity + demand - competition) / 4 * 50%` on raw 0–1 scores.
    pub fn shop_api() -> Self {
        Self {
            base_margin: 0.0,
            scale: 1.0,
            midpoint: 0.0,
            weights: AxisWeights {
                demand: 0.125,
                popularity: 0.125,
                rarity: 0.125,
                competition: 0.125,
            },
            band: MarginBand::new(0.10, 0.40),
            neutral_score: default_neutral_score(),
        }
    }

    fn validate(&self) -> Result<()> {
        self.band.validate()?;
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(anyhow!("Continuous scale must be positive, got {}", self.scale));
        }
        let w = &self.weights;
        for (axis, weight) in [
            ("demand", w.demand),
            ("popularity", w.popularity),
            ("rarity", w.rarity),
            ("competition", w.competition),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(anyhow!("Weight for {} must be non-negative, got {}", axis, weight));
            }
        }
        if !(0.0..=1.0).contains(&self.neutral_score) {
            return Err(anyhow!("Neutral score must lie in [0, 1], got {}", self.neutral_score));
        }
        Ok(())
    }
}

impl Default for ContinuousConfig {
    fn default() -> Self {
        Self::datalab()
    }
}

/// Base margin plus one delta per selected axis choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalConfig {
    pub base_margin: f64,
    pub band: MarginBand,
    /// axis name -> choice -> margin delta
    pub axes: BTreeMap<String, BTreeMap<String, f64>>,
}

fn table(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

impl CategoricalConfig {
    /// The six situational axes of the new-product margin simulator.
    pub fn situational_axes() -> BTreeMap<String, BTreeMap<String, f64>> {
        let mut axes = BTreeMap::new();
        axes.insert(
            "competition".to_string(),
            table(&[("low", 0.04), ("medium", 0.02), ("high", -0.02)]),
        );
        axes.insert(
            "demand".to_string(),
            table(&[("high", 0.04), ("medium", 0.02), ("low", -0.02)]),
        );
        axes.insert(
            "scale".to_string(),
            table(&[("small", 0.04), ("medium", 0.02), ("large", -0.02)]),
        );
        axes.insert(
            "production".to_string(),
            table(&[("low", 0.04), ("medium", 0.02), ("high", -0.01)]),
        );
        axes.insert("ingredient".to_string(), table(&[("yes", -0.03), ("no", 0.0)]));
        axes.insert("retail".to_string(), table(&[("yes", 0.04), ("no", 0.0)]));
        axes
    }

    /// Sum of deltas only, bounded to [0, 1].
    pub fn simulator() -> Self {
        Self {
            base_margin: 0.0,
            band: MarginBand::new(0.0, 1.0),
            axes: Self::situational_axes(),
        }
    }

    /// Competition level from listing counts mapped straight to 55/40/30%.
    pub fn marketplace() -> Self {
        let mut axes = BTreeMap::new();
        axes.insert(
            "competition".to_string(),
            table(&[("low", 0.15), ("medium", 0.0), ("high", -0.10)]),
        );
        Self {
            base_margin: 0.40,
            band: MarginBand::new(0.20, 0.70),
            axes,
        }
    }

    fn validate(&self) -> Result<()> {
        self.band.validate()?;
        if !self.base_margin.is_finite() {
            return Err(anyhow!("Categorical base margin must be finite"));
        }
        for (axis, choices) in &self.axes {
            if choices.is_empty() {
                return Err(anyhow!("Axis {} has no choices", axis));
            }
            if let Some((choice, _)) = choices.iter().find(|(_, d)| !d.is_finite()) {
                return Err(anyhow!("Delta for {}={} must be finite", axis, choice));
            }
        }
        Ok(())
    }
}

impl Default for CategoricalConfig {
    fn default() -> Self {
        Self {
            base_margin: 0.30,
            band: MarginBand::new(0.20, 0.70),
            axes: Self::situational_axes(),
        }
    }
}

/// Scoring strategy selected for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum StrategyConfig {
    Continuous(ContinuousConfig),
    Categorical(CategoricalConfig),
}

/// Optional cap that keeps the retail price near the observed competitor average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CeilingPolicy {
    pub enabled: bool,
    /// Retail above `trigger_ratio * avg` triggers the override.
    pub trigger_ratio: f64,
    /// Retail is reset to `target_ratio * avg`.
    pub target_ratio: f64,
}

impl CeilingPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for CeilingPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_ratio: 1.3,
            target_ratio: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Prices are rounded half away from zero to a multiple of this unit.
    pub rounding_unit: u64,
    pub retail_multiplier: f64,
    /// Used instead of `retail_multiplier` when the product is not sold at retail.
    pub non_retail_multiplier: f64,
    pub ceiling: CeilingPolicy,
}

impl PricingConfig {
    /// Wholesale and retail tiers, rounded to 10.
    pub fn tiered() -> Self {
        Self {
            rounding_unit: 10,
            retail_multiplier: 1.5,
            non_retail_multiplier: 1.2,
            ceiling: CeilingPolicy::disabled(),
        }
    }

    /// One selling price rounded to 100, capped against competitors.
    pub fn single_price() -> Self {
        Self {
            rounding_unit: 100,
            retail_multiplier: 1.0,
            non_retail_multiplier: 1.0,
            ceiling: CeilingPolicy::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.rounding_unit == 0 {
            return Err(anyhow!("Rounding unit must be at least 1"));
        }
        for (name, value) in [
            ("retail_multiplier", self.retail_multiplier),
            ("non_retail_multiplier", self.non_retail_multiplier),
            ("ceiling.trigger_ratio", self.ceiling.trigger_ratio),
            ("ceiling.target_ratio", self.ceiling.target_ratio),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(anyhow!("{} must be positive, got {}", name, value));
            }
        }
        Ok(())
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self::tiered()
    }
}

/// Ratios of the unit price sheet, all relative to the selling price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    pub business: f64,
    pub wholesale: f64,
    pub box_general: f64,
    pub box_business: f64,
    pub box_wholesale: f64,
    pub pickup_general: f64,
    pub pickup_business: f64,
    pub pickup_wholesale: f64,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            business: 0.76,
            wholesale: 0.58,
            box_general: 0.70,
            box_business: 0.60,
            box_wholesale: 0.52,
            pickup_general: 0.60,
            pickup_business: 0.50,
            pickup_wholesale: 0.42,
        }
    }
}

/// Everything the margin engine needs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginConfig {
    pub strategy: StrategyConfig,
    pub pricing: PricingConfig,
}

impl MarginConfig {
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Marketplace => Self {
                strategy: StrategyConfig::Categorical(CategoricalConfig::marketplace()),
                pricing: PricingConfig::tiered(),
            },
            Profile::WebSearch => Self {
                strategy: StrategyConfig::Continuous(ContinuousConfig::web_search()),
                pricing: PricingConfig::single_price(),
            },
            Profile::Datalab => Self {
                strategy: StrategyConfig::Continuous(ContinuousConfig::datalab()),
                pricing: PricingConfig::single_price(),
            },
            Profile::ShopApi => Self {
                strategy: StrategyConfig::Continuous(ContinuousConfig::shop_api()),
                pricing: PricingConfig::tiered(),
            },
        }
    }

    pub fn simulator() -> Self {
        Self {
            strategy: StrategyConfig::Categorical(CategoricalConfig::simulator()),
            pricing: PricingConfig::tiered(),
        }
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MarginConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match &self.strategy {
            StrategyConfig::Continuous(c) => c.validate()?,
            StrategyConfig::Categorical(c) => c.validate()?,
        }
        self.pricing.validate()
    }
}
