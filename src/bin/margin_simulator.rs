//! margin_simulator: margin for a new product from six situational choices
use anyhow::Result;
use clap::Parser;
use tracing::info;

use margin_advisor::config::MarginConfig;
use margin_advisor::engine::{
    CompetitionLevel, CostInput, DemandLevel, MarginEngine, MarginScore, PricingOptions,
    ProductionScale, ProductionVolume, SignalSet, SituationalChoices,
};
use margin_advisor::report::thousands;

#[derive(Parser, Debug)]
#[command(
    name = "margin_simulator",
    version = env!("CARGO_PKG_VERSION"),
    about = "Simulate the margin of a new product from its market situation"
)]
struct Args {
    /// Competition in the market (low, medium, high)
    #[arg(long)]
    competition: CompetitionLevel,

    /// Expected demand (high, medium, low)
    #[arg(long)]
    demand: DemandLevel,

    /// Production run size (small, medium, large)
    #[arg(long)]
    scale: ProductionScale,

    /// Daily production volume (low, medium, high)
    #[arg(long)]
    production: ProductionVolume,

    /// The product is also sold as an ingredient to other producers
    #[arg(long)]
    ingredient: bool,

    /// The product goes to retail shelves
    #[arg(long)]
    retail: bool,

    /// Manufacturing cost per unit in won
    #[arg(long)]
    cost: Option<f64>,

    /// Use this margin percentage instead of the simulated one
    #[arg(long)]
    margin: Option<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let cost = args.cost.map(CostInput::new).transpose()?;
    let choices = SituationalChoices {
        competition: args.competition,
        demand: args.demand,
        scale: args.scale,
        production: args.production,
        ingredient_use: args.ingredient,
        retail_use: args.retail,
    };
    let options = PricingOptions {
        cost,
        retail_use: args.retail,
    };

    let engine = MarginEngine::new(MarginConfig::simulator())?;
    let result = match args.margin {
        Some(pct) => engine.evaluate_manual(pct, None, options)?,
        None => engine.evaluate(&SignalSet::default(), &choices.to_selection(), options)?,
    };
    info!("✅ Simulated margin {:.1}%", result.suggested_margin_pct());

    println!("=== New product margin simulation ===");
    if let MarginScore::Categorical(breakdown) = &result.score {
        for delta in &breakdown.deltas {
            println!(
                "  {:<24} {:+.1}%",
                format!("{} = {}", delta.axis, delta.choice),
                delta.delta * 100.0
            );
        }
    }
    println!("Suggested margin: {:.1}%", result.suggested_margin_pct());

    match &result.prices {
        Some(prices) => {
            println!("Wholesale price: {}원", thousands(prices.wholesale));
            println!("Retail price:    {}원", thousands(prices.retail));
        }
        None => println!("Pass --cost to derive prices."),
    }

    Ok(())
}
