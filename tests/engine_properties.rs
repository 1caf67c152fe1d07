use margin_advisor::config::{
    AxisWeights, CategoricalConfig, ContinuousConfig, MarginBand, MarginConfig, PricingConfig,
    Profile, StrategyConfig,
};
use margin_advisor::engine::{
    CategoricalSelection, CompetitionLevel, CostInput, DemandLevel, MarginEngine, PricingOptions,
    ProductionScale, ProductionVolume, ResolvedScores, Signal, SignalSet, SituationalChoices,
    categorical_margin, continuous_margin, derive_prices, margin_from_price,
};

const GRID: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

fn continuous_presets() -> Vec<ContinuousConfig> {
    vec![
        ContinuousConfig::web_search(),
        ContinuousConfig::datalab(),
        ContinuousConfig::shop_api(),
    ]
}

#[test]
fn continuous_margin_stays_in_band() {
    for config in continuous_presets() {
        for &r in &GRID {
            for &p in &GRID {
                for &d in &GRID {
                    for &c in &GRID {
                        let scores = ResolvedScores::new(r, p, d, c);
                        let margin = continuous_margin(&config, &scores).suggested_margin;
                        assert!(
                            config.band.contains(margin),
                            "margin {} outside band for {:?}",
                            margin,
                            (r, p, d, c)
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn continuous_margin_is_monotonic_per_axis() {
    for config in continuous_presets() {
        for &other in &GRID {
            for pair in GRID.windows(2) {
                let (lo, hi) = (pair[0], pair[1]);
                let margin = |r, p, d, c| {
                    continuous_margin(&config, &ResolvedScores::new(r, p, d, c)).suggested_margin
                };

                assert!(margin(hi, other, other, other) >= margin(lo, other, other, other));
                assert!(margin(other, hi, other, other) >= margin(other, lo, other, other));
                assert!(margin(other, other, hi, other) >= margin(other, other, lo, other));
                assert!(margin(other, other, other, hi) <= margin(other, other, other, lo));
            }
        }
    }
}

#[test]
fn every_situational_combination_stays_in_band() {
    let config = CategoricalConfig::simulator();
    let mut combinations = 0;

    for &competition in CompetitionLevel::ALL {
        for &demand in DemandLevel::ALL {
            for &scale in ProductionScale::ALL {
                for &production in ProductionVolume::ALL {
                    for ingredient_use in [false, true] {
                        for retail_use in [false, true] {
                            let choices = SituationalChoices {
                                competition,
                                demand,
                                scale,
                                production,
                                ingredient_use,
                                retail_use,
                            };
                            let breakdown =
                                categorical_margin(&config, &choices.to_selection()).unwrap();
                            assert!(config.band.contains(breakdown.suggested_margin));
                            combinations += 1;
                        }
                    }
                }
            }
        }
    }

    assert_eq!(combinations, 324);
}

#[test]
fn marketplace_levels_map_to_fixed_margins() {
    let config = CategoricalConfig::marketplace();
    let margin = |level: &str| {
        categorical_margin(&config, &CategoricalSelection::new().with("competition", level))
            .unwrap()
            .suggested_margin
    };

    assert!((margin("low") - 0.55).abs() < 1e-9);
    assert!((margin("medium") - 0.40).abs() < 1e-9);
    assert!((margin("high") - 0.30).abs() < 1e-9);
}

#[test]
fn derived_prices_round_trip_within_rounding() {
    let cost = 3_000.0;
    for pricing in [PricingConfig::tiered(), PricingConfig::single_price()] {
        let half_unit = pricing.rounding_unit as f64 / 2.0;
        for pct in [5.0, 12.5, 30.0, 45.0, 70.0, 95.0] {
            let margin = pct / 100.0;
            let tiers = derive_prices(&pricing, margin, cost, true, None).unwrap();

            let exact = cost / (1.0 - margin);
            assert!((tiers.wholesale as f64 - exact).abs() <= half_unit);
            let recovered = margin_from_price(cost, tiers.wholesale);
            assert!(recovered <= 1.0 - cost / (exact + half_unit) + 1e-12);
            assert!(recovered >= 1.0 - cost / (exact - half_unit) - 1e-12);
        }
    }
}

#[test]
fn competitor_ceiling_resets_retail() {
    let pricing = PricingConfig::single_price();
    let tiers = derive_prices(&pricing, 0.40, 3_000.0, true, Some(3_500.0)).unwrap();

    // 3000 / 0.6 = 5000 > 1.3 * 3500, so retail becomes 1.2 * 3500
    assert!(tiers.ceiling_applied);
    assert_eq!(tiers.retail, 4_200);
    assert!(tiers.wholesale <= tiers.retail);
    assert!((tiers.effective_margin - (1.0 - 3_000.0 / 4_200.0)).abs() < 1e-12);

    let untouched = derive_prices(&pricing, 0.40, 3_000.0, true, Some(4_000.0)).unwrap();
    assert!(!untouched.ceiling_applied);
    assert_eq!(untouched.retail, 5_000);
}

#[test]
fn non_positive_cost_yields_no_prices() {
    for cost in [0.0, -100.0, f64::NAN] {
        assert!(derive_prices(&PricingConfig::tiered(), 0.3, cost, true, None).is_none());
        assert!(CostInput::new(cost).is_err());
    }
}

#[test]
fn worked_example_hits_band_maximum() {
    let config = MarginConfig {
        strategy: StrategyConfig::Continuous(ContinuousConfig {
            base_margin: 0.30,
            scale: 1.0,
            midpoint: 0.5,
            weights: AxisWeights {
                demand: 1.0,
                popularity: 1.0,
                rarity: 1.0,
                competition: 1.0,
            },
            band: MarginBand::new(0.10, 0.70),
            neutral_score: 0.5,
        }),
        pricing: PricingConfig::tiered(),
    };
    let signals = SignalSet {
        rarity: Signal::Observed(0.8),
        popularity: Signal::Observed(0.8),
        demand: Signal::Observed(0.8),
        competition: Signal::Observed(0.2),
        ..SignalSet::default()
    };

    let engine = MarginEngine::new(config).unwrap();
    let result = engine
        .evaluate(
            &signals,
            &CategoricalSelection::new(),
            PricingOptions::with_cost(CostInput::new(3_000.0).unwrap()),
        )
        .unwrap();

    assert!((result.suggested_margin - 0.70).abs() < 1e-9);
    let prices = result.prices.unwrap();
    assert_eq!(prices.wholesale, 10_000);
    assert_eq!(prices.retail, 15_000);
}

#[test]
fn every_profile_handles_missing_signals() {
    for profile in [
        Profile::Marketplace,
        Profile::WebSearch,
        Profile::Datalab,
        Profile::ShopApi,
    ] {
        let engine = MarginEngine::new(MarginConfig::for_profile(profile)).unwrap();
        let selection = match profile {
            Profile::Marketplace => CategoricalSelection::new().with("competition", "medium"),
            _ => CategoricalSelection::new(),
        };
        let result = engine
            .evaluate(&SignalSet::default(), &selection, PricingOptions::default())
            .unwrap();
        assert!(result.suggested_margin > 0.0 && result.suggested_margin < 1.0);
    }
}
