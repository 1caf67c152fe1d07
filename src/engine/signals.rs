use serde::{Deserialize, Serialize};

/// A normalized score in [0, 1], or an explicit marker that it could not be
/// collected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Signal {
    Observed(f64),
    #[default]
    Unavailable,
}

impl Signal {
    /// Wraps a raw value; non-finite values are treated as unavailable.
    pub fn observed(value: f64) -> Self {
        if value.is_finite() {
            Signal::Observed(value)
        } else {
            Signal::Unavailable
        }
    }

    /// Wraps a value on a 0..=10 scale.
    pub fn from_ten_point(score: f64) -> Self {
        Self::observed(score / 10.0)
    }

    pub fn is_observed(&self) -> bool {
        self.value().is_some()
    }

    /// Clamped value, if observed. A NaN built directly through the variant
    /// counts as unavailable.
    pub fn value(&self) -> Option<f64> {
        match self {
            Signal::Observed(v) if !v.is_nan() => Some(v.clamp(0.0, 1.0)),
            _ => None,
        }
    }

    /// Clamped value, or `neutral` when unavailable.
    pub fn resolve(&self, neutral: f64) -> f64 {
        self.value().unwrap_or(neutral.clamp(0.0, 1.0))
    }
}

/// All signals gathered for one query. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    pub rarity: Signal,
    pub popularity: Signal,
    pub demand: Signal,
    pub competition: Signal,
    pub product_count: Option<u32>,
    pub brand_count: Option<u32>,
    pub avg_competitor_price: Option<f64>,
}

impl SignalSet {
    pub fn observed_scores(&self) -> usize {
        [self.rarity, self.popularity, self.demand, self.competition]
            .iter()
            .filter(|s| s.is_observed())
            .count()
    }

    /// Competitor average only when it is usable as a price reference.
    pub fn competitor_price(&self) -> Option<f64> {
        self.avg_competitor_price
            .filter(|p| p.is_finite() && *p > 0.0)
    }

    /// Fills fields that are still missing here from `other`.
    pub fn merge_missing(&mut self, other: &SignalSet) {
        fn pick(mine: &mut Signal, theirs: Signal) {
            if !mine.is_observed() {
                *mine = theirs;
            }
        }
        pick(&mut self.rarity, other.rarity);
        pick(&mut self.popularity, other.popularity);
        pick(&mut self.demand, other.demand);
        pick(&mut self.competition, other.competition);
        self.product_count = self.product_count.or(other.product_count);
        self.brand_count = self.brand_count.or(other.brand_count);
        self.avg_competitor_price = self.avg_competitor_price.or(other.avg_competitor_price);
    }

    pub fn resolve(&self, neutral: f64) -> ResolvedScores {
        ResolvedScores {
            rarity: self.rarity.resolve(neutral),
            popularity: self.popularity.resolve(neutral),
            demand: self.demand.resolve(neutral),
            competition: self.competition.resolve(neutral),
        }
    }
}

/// Scores after clamping and neutral substitution; every field is in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedScores {
    pub rarity: f64,
    pub popularity: f64,
    pub demand: f64,
    pub competition: f64,
}

impl ResolvedScores {
    pub fn new(rarity: f64, popularity: f64, demand: f64, competition: f64) -> Self {
        let clamp = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self {
            rarity: clamp(rarity),
            popularity: clamp(popularity),
            demand: clamp(demand),
            competition: clamp(competition),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_resolves_to_neutral() {
        let set = SignalSet {
            demand: Signal::Observed(0.9),
            ..SignalSet::default()
        };
        let resolved = set.resolve(0.5);
        assert_eq!(resolved.demand, 0.9);
        assert_eq!(resolved.rarity, 0.5);
        assert_eq!(resolved.competition, 0.5);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        assert_eq!(Signal::Observed(1.7).resolve(0.5), 1.0);
        assert_eq!(Signal::Observed(-0.2).resolve(0.5), 0.0);
        assert_eq!(Signal::observed(f64::NAN), Signal::Unavailable);
        assert_eq!(Signal::from_ten_point(8.0), Signal::Observed(0.8));
    }

    #[test]
    fn test_zero_is_not_unavailable() {
        let signal = Signal::observed(0.0);
        assert!(signal.is_observed());
        assert_eq!(signal.resolve(0.5), 0.0);
    }

    #[test]
    fn test_raw_nan_variant_reads_as_unavailable() {
        let signal = Signal::Observed(f64::NAN);
        assert_eq!(signal.value(), None);
        assert!(!signal.is_observed());
        assert_eq!(signal.resolve(0.5), 0.5);

        let set = SignalSet {
            competition: signal,
            demand: Signal::Observed(0.4),
            ..SignalSet::default()
        };
        assert_eq!(set.observed_scores(), 1);
        assert_eq!(set.resolve(0.5).competition, 0.5);

        let mut merged = set.clone();
        merged.merge_missing(&SignalSet {
            competition: Signal::Observed(0.7),
            ..SignalSet::default()
        });
        assert_eq!(merged.competition, Signal::Observed(0.7));
    }

    #[test]
    fn test_merge_missing_keeps_observed_values() {
        let mut live = SignalSet {
            competition: Signal::Observed(0.2),
            product_count: Some(12),
            ..SignalSet::default()
        };
        let estimate = SignalSet {
            competition: Signal::Observed(0.5),
            demand: Signal::Observed(0.6),
            ..SignalSet::default()
        };
        live.merge_missing(&estimate);

        assert_eq!(live.competition, Signal::Observed(0.2));
        assert_eq!(live.demand, Signal::Observed(0.6));
        assert_eq!(live.product_count, Some(12));
        assert_eq!(live.observed_scores(), 2);
    }

    #[test]
    fn test_competitor_price_requires_positive_value() {
        let mut set = SignalSet::default();
        assert_eq!(set.competitor_price(), None);
        set.avg_competitor_price = Some(0.0);
        assert_eq!(set.competitor_price(), None);
        set.avg_competitor_price = Some(12_500.0);
        assert_eq!(set.competitor_price(), Some(12_500.0));
    }
}
