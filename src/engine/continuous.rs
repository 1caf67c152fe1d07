use serde::Serialize;

use super::signals::ResolvedScores;
use crate::config::ContinuousConfig;

/// Per-axis terms of a continuous margin computation, all as fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContinuousBreakdown {
    pub base_margin: f64,
    pub demand_bonus: f64,
    pub popularity_bonus: f64,
    pub rarity_bonus: f64,
    pub competition_penalty: f64,
    pub raw_margin: f64,
    pub suggested_margin: f64,
}

/// Weighted sum of midpoint-centred scores, clamped to the configured band.
///
/// Scores are expected in [0, 1]; they are clamped again here so an
/// out-of-range value can never leak into the sum.
pub fn continuous_margin(
    config: &ContinuousConfig,
    scores: &ResolvedScores,
) -> ContinuousBreakdown {
    let centred = |score: f64| score.clamp(0.0, 1.0) * config.scale - config.midpoint;
    let w = &config.weights;

    let demand_bonus = w.demand * centred(scores.demand);
    let popularity_bonus = w.popularity * centred(scores.popularity);
    let rarity_bonus = w.rarity * centred(scores.rarity);
    let competition_penalty = w.competition * centred(scores.competition);

    let raw_margin =
        config.base_margin + demand_bonus + popularity_bonus + rarity_bonus - competition_penalty;

    ContinuousBreakdown {
        base_margin: config.base_margin,
        demand_bonus,
        popularity_bonus,
        rarity_bonus,
        competition_penalty,
        raw_margin,
        suggested_margin: config.band.clamp(raw_margin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AxisWeights, MarginBand};

    fn unit_weight_config() -> ContinuousConfig {
        ContinuousConfig {
            base_margin: 0.30,
            scale: 1.0,
            midpoint: 0.5,
            weights: AxisWeights {
                demand: 1.0,
                popularity: 1.0,
                rarity: 1.0,
                competition: 1.0,
            },
            band: MarginBand::new(0.20, 0.70),
            neutral_score: 0.5,
        }
    }

    #[test]
    fn test_strong_signals_hit_ceiling() {
        let scores = ResolvedScores::new(0.8, 0.8, 0.8, 0.2);
        let result = continuous_margin(&unit_weight_config(), &scores);

        assert!((result.raw_margin - 1.5).abs() < 1e-9);
        assert_eq!(result.suggested_margin, 0.70);
    }

    #[test]
    fn test_neutral_scores_give_base_margin() {
        let scores = ResolvedScores::new(0.5, 0.5, 0.5, 0.5);
        let result = continuous_margin(&ContinuousConfig::datalab(), &scores);
        assert!((result.suggested_margin - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_datalab_trend_bonus() {
        // Rising trend scores 8/10: +4.5 points over the 35% base.
        let scores = ResolvedScores::new(0.5, 0.5, 0.8, 0.5);
        let result = continuous_margin(&ContinuousConfig::datalab(), &scores);
        assert!((result.demand_bonus - 0.045).abs() < 1e-9);
        assert!((result.suggested_margin - 0.395).abs() < 1e-9);
    }

    #[test]
    fn test_shop_api_average_formula() {
        // (0.7 + 0.4 + 0.6 - 0.5) / 4 * 50% = 15%
        let scores = ResolvedScores::new(0.7, 0.4, 0.6, 0.5);
        let result = continuous_margin(&ContinuousConfig::shop_api(), &scores);
        assert!((result.suggested_margin - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_floor_applies() {
        let scores = ResolvedScores::new(0.0, 0.0, 0.0, 1.0);
        let result = continuous_margin(&ContinuousConfig::shop_api(), &scores);
        assert!((result.raw_margin + 0.125).abs() < 1e-9);
        assert_eq!(result.suggested_margin, 0.10);
    }
}
