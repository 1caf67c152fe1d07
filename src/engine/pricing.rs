use serde::Serialize;

use crate::config::PricingConfig;
use crate::error::{InputError, InputResult};

/// Margins are capped here before being used as a divisor.
pub const MAX_PRICEABLE_MARGIN: f64 = 0.99;

/// Manufacturing cost per unit, VAT exclusive. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostInput(f64);

impl CostInput {
    pub fn new(base_cost: f64) -> InputResult<Self> {
        if !base_cost.is_finite() || base_cost <= 0.0 {
            return Err(InputError::NonPositiveCost(base_cost));
        }
        Ok(Self(base_cost))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Validates a user-entered margin percentage and returns it as a fraction.
pub fn manual_margin(margin_pct: f64) -> InputResult<f64> {
    if !margin_pct.is_finite() || margin_pct <= 0.0 || margin_pct >= 100.0 {
        return Err(InputError::MarginOutOfRange(margin_pct));
    }
    Ok(margin_pct / 100.0)
}

/// Rounds to the nearest multiple of `unit`, halves away from zero.
/// Negative and non-finite inputs yield 0.
pub fn round_to_unit(value: f64, unit: u64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let unit = unit.max(1) as f64;
    ((value / unit).round() * unit) as u64
}

/// `1 - cost / price`, or 0 when there is no price.
pub fn margin_from_price(base_cost: f64, price: u64) -> f64 {
    if price == 0 {
        return 0.0;
    }
    1.0 - base_cost / price as f64
}

/// Prices derived from one margin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceTiers {
    pub wholesale: u64,
    pub retail: u64,
    /// Margin realised by the final retail price.
    pub effective_margin: f64,
    pub ceiling_applied: bool,
}

impl PriceTiers {
    pub fn effective_margin_pct(&self) -> f64 {
        self.effective_margin * 100.0
    }
}

/// Clamp-then-divide-then-round price derivation.
///
/// Returns `None` when `base_cost` is not a positive number: no price is
/// produced rather than a zero price.
pub fn derive_prices(
    config: &PricingConfig,
    margin: f64,
    base_cost: f64,
    retail_use: bool,
    avg_competitor_price: Option<f64>,
) -> Option<PriceTiers> {
    if !base_cost.is_finite() || base_cost <= 0.0 {
        return None;
    }

    let margin = if margin.is_nan() {
        0.0
    } else {
        margin.clamp(0.0, MAX_PRICEABLE_MARGIN)
    };
    let unit = config.rounding_unit;
    let multiplier = if retail_use {
        config.retail_multiplier
    } else {
        config.non_retail_multiplier
    };

    // The ceiling compares against the listed price, so round first.
    let mut wholesale = round_to_unit(base_cost / (1.0 - margin), unit);
    let mut retail = round_to_unit(wholesale as f64 * multiplier, unit);
    let mut ceiling_applied = false;

    let policy = &config.ceiling;
    if let Some(avg) = avg_competitor_price.filter(|p| p.is_finite() && *p > 0.0) {
        if policy.enabled && retail as f64 > avg * policy.trigger_ratio {
            retail = round_to_unit(avg * policy.target_ratio, unit);
            wholesale = wholesale.min(retail);
            ceiling_applied = true;
        }
    }

    Some(PriceTiers {
        wholesale,
        retail,
        effective_margin: margin_from_price(base_cost, retail),
        ceiling_applied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CeilingPolicy;

    #[test]
    fn test_round_to_unit() {
        assert_eq!(round_to_unit(4285.7, 10), 4290);
        assert_eq!(round_to_unit(4285.0, 10), 4290);
        assert_eq!(round_to_unit(4249.9, 100), 4200);
        assert_eq!(round_to_unit(4250.0, 100), 4300);
        assert_eq!(round_to_unit(-5.0, 10), 0);
        assert_eq!(round_to_unit(f64::INFINITY, 10), 0);
        assert_eq!(round_to_unit(17.0, 0), 17);
    }

    #[test]
    fn test_tiered_prices() {
        // 3000 / (1 - 0.30) = 4285.7 -> 4290; 4290 * 1.5 = 6435 -> 6440
        let tiers = derive_prices(&PricingConfig::tiered(), 0.30, 3000.0, true, None).unwrap();
        assert_eq!(tiers.wholesale, 4290);
        assert_eq!(tiers.retail, 6440);
        assert!(!tiers.ceiling_applied);

        // Not for retail: 4290 * 1.2 = 5148 -> 5150
        let tiers = derive_prices(&PricingConfig::tiered(), 0.30, 3000.0, false, None).unwrap();
        assert_eq!(tiers.retail, 5150);
    }

    #[test]
    fn test_non_positive_cost_produces_no_prices() {
        let config = PricingConfig::tiered();
        assert!(derive_prices(&config, 0.3, 0.0, true, None).is_none());
        assert!(derive_prices(&config, 0.3, -100.0, true, None).is_none());
        assert!(derive_prices(&config, 0.3, f64::NAN, true, None).is_none());
    }

    #[test]
    fn test_full_margin_does_not_divide_by_zero() {
        let tiers = derive_prices(&PricingConfig::tiered(), 1.0, 3000.0, true, None).unwrap();
        assert_eq!(tiers.wholesale, 300_000);
    }

    #[test]
    fn test_competitor_ceiling() {
        // 3000 / 0.6 = 5000 > 1.3 * 3500 = 4550 -> 1.2 * 3500 = 4200
        let config = PricingConfig::single_price();
        let tiers = derive_prices(&config, 0.40, 3000.0, true, Some(3500.0)).unwrap();

        assert!(tiers.ceiling_applied);
        assert_eq!(tiers.retail, 4200);
        assert_eq!(tiers.wholesale, 4200);
        assert!((tiers.effective_margin - (1.0 - 3000.0 / 4200.0)).abs() < 1e-12);
    }

    #[test]
    fn test_ceiling_not_triggered_within_band() {
        let config = PricingConfig::single_price();
        let tiers = derive_prices(&config, 0.40, 3000.0, true, Some(4000.0)).unwrap();
        assert!(!tiers.ceiling_applied);
        assert_eq!(tiers.retail, 5000);
    }

    #[test]
    fn test_ceiling_compares_the_rounded_retail_price() {
        let config = PricingConfig::single_price();
        let cost = 3000.0;

        // exact 4530 is over 1.3 * avg = 4520, but the listed 4500 is not
        let margin = 1.0 - cost / 4530.0;
        let tiers = derive_prices(&config, margin, cost, true, Some(4520.0 / 1.3)).unwrap();
        assert!(!tiers.ceiling_applied);
        assert_eq!(tiers.retail, 4500);

        // exact 4460 is under 1.3 * avg = 4480, but the listed 4500 is over
        let margin = 1.0 - cost / 4460.0;
        let tiers = derive_prices(&config, margin, cost, true, Some(4480.0 / 1.3)).unwrap();
        assert!(tiers.ceiling_applied);
        assert_eq!(tiers.retail, 4100);
    }

    #[test]
    fn test_disabled_ceiling_is_ignored() {
        let mut config = PricingConfig::single_price();
        config.ceiling = CeilingPolicy::disabled();
        let tiers = derive_prices(&config, 0.40, 3000.0, true, Some(1000.0)).unwrap();
        assert!(!tiers.ceiling_applied);
        assert_eq!(tiers.retail, 5000);
    }

    #[test]
    fn test_ceiling_can_produce_a_loss() {
        let config = PricingConfig::single_price();
        let tiers = derive_prices(&config, 0.40, 3000.0, true, Some(1000.0)).unwrap();
        assert_eq!(tiers.retail, 1200);
        assert!(tiers.effective_margin < 0.0);
    }

    #[test]
    fn test_manual_margin_bounds() {
        assert_eq!(manual_margin(35.0), Ok(0.35));
        assert!(manual_margin(0.0).is_err());
        assert!(manual_margin(100.0).is_err());
        assert!(manual_margin(f64::NAN).is_err());
    }

    #[test]
    fn test_cost_input() {
        assert_eq!(CostInput::new(3000.0).map(|c| c.value()), Ok(3000.0));
        assert_eq!(CostInput::new(0.0), Err(InputError::NonPositiveCost(0.0)));
    }
}
