use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::{info, warn};

use margin_advisor::config::{AdvisorConfig, MarketplaceConfig, Profile, StrategyConfig};
use margin_advisor::engine::{
    CategoricalSelection, CostInput, MarginEngine, PricingOptions, SignalSet, manual_margin,
};
use margin_advisor::error::validate_product_name;
use margin_advisor::fetcher::{SignalCollector, build_client, build_source};
use margin_advisor::processor::competition_level_for;
use margin_advisor::report::AnalysisReport;

const DEFAULT_CONFIG: &str = "src/configs/advisor.toml";

#[derive(Parser, Debug)]
#[command(
    name = "margin-advisor",
    version = env!("CARGO_PKG_VERSION"),
    about = "Suggest a margin and prices for a grocery product from market signals"
)]
struct Args {
    /// Product name to analyse
    product: String,

    /// Manufacturing cost per unit in won
    #[arg(long)]
    cost: Option<f64>,

    /// Signal profile (marketplace, web-search, datalab, shop-api)
    #[arg(long)]
    profile: Option<Profile>,

    /// Configuration file
    #[arg(long)]
    config: Option<String>,

    /// Skip live collection and use the estimated scores
    #[arg(long)]
    estimated: bool,

    /// Use this margin percentage instead of the scored one
    #[arg(long)]
    margin: Option<f64>,

    /// Price for wholesale partners instead of retail shelves
    #[arg(long)]
    not_retail: bool,
}

fn load_config(path: Option<&str>) -> Result<AdvisorConfig> {
    match path {
        Some(path) => AdvisorConfig::from_file(path),
        None if Path::new(DEFAULT_CONFIG).exists() => AdvisorConfig::from_file(DEFAULT_CONFIG),
        None => {
            info!("No configuration file found, using built-in defaults");
            Ok(AdvisorConfig::default())
        }
    }
}

/// Axis choices the categorical strategy reads from collected signals.
fn selection_for(
    strategy: &StrategyConfig,
    signals: &SignalSet,
    marketplace: &MarketplaceConfig,
) -> CategoricalSelection {
    match strategy {
        StrategyConfig::Categorical(config) if config.axes.contains_key("competition") => {
            let level = competition_level_for(signals, marketplace);
            info!("Competition level: {}", level);
            CategoricalSelection::new().with("competition", level.as_choice())
        }
        _ => CategoricalSelection::new(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let args = Args::parse();

    let product = validate_product_name(&args.product)?.to_string();
    let cost = args.cost.map(CostInput::new).transpose()?;
    if let Some(pct) = args.margin {
        manual_margin(pct)?;
    }

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    let profile = args.profile.unwrap_or(config.profile);
    let engine = MarginEngine::new(config.margin_config(profile))?;

    info!("🚀 Analysing '{}' with the {} profile", product, profile.as_str());

    let client = build_client(&config.sources.http).context("Failed to build HTTP client")?;
    let source = build_source(profile, &config.sources, client);
    let collector = SignalCollector::new(
        source,
        config.sources.estimated,
        config.sources.fallback,
    );

    let collection = if args.estimated {
        collector.collect_estimated()
    } else {
        collector.collect(&product).await
    };

    if !collection.failures.is_empty() {
        warn!(
            "{} sub-signals from {} were unavailable",
            collection.failures.len(),
            collector.source_name()
        );
    }

    let options = PricingOptions {
        cost,
        retail_use: !args.not_retail,
    };
    let result = match args.margin {
        Some(pct) => {
            engine.evaluate_manual(pct, collection.signals.competitor_price(), options)?
        }
        None => {
            let selection = selection_for(
                &engine.config().strategy,
                &collection.signals,
                &config.sources.marketplace,
            );
            engine.evaluate(&collection.signals, &selection, options)?
        }
    };

    info!("✅ Suggested margin {:.1}%", result.suggested_margin_pct());

    let report = AnalysisReport::new(
        &product,
        profile,
        collection,
        result,
        config.sources.report.max_evidence,
    );
    println!("{}", report);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_come_only_from_the_command_line() {
        let args = Args::try_parse_from([
            "margin-advisor",
            "타코와사비",
            "--cost",
            "3000",
            "--profile",
            "shop-api",
            "--not-retail",
        ])
        .unwrap();

        assert_eq!(args.product, "타코와사비");
        assert_eq!(args.cost, Some(3_000.0));
        assert_eq!(args.profile, Some(Profile::ShopApi));
        assert!(args.not_retail);
        assert!(!args.estimated);
        assert_eq!(args.margin, None);
        assert_eq!(args.config, None);
    }
}
