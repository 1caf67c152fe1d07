//! price_tiers: full unit price sheet from a selling or wholesale price
use anyhow::Result;
use clap::{ArgGroup, Parser};

use margin_advisor::config::TierConfig;
use margin_advisor::engine::{BasePrice, price_sheet};
use margin_advisor::report::thousands;

#[derive(Parser, Debug)]
#[command(
    name = "price_tiers",
    version = env!("CARGO_PKG_VERSION"),
    about = "Print business, box and pickup prices for one product"
)]
#[command(group(ArgGroup::new("base").required(true).args(["selling", "wholesale"])))]
struct Args {
    /// Consumer selling price in won
    #[arg(long)]
    selling: Option<f64>,

    /// Wholesale price in won
    #[arg(long)]
    wholesale: Option<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let base = match (args.selling, args.wholesale) {
        (Some(selling), _) => BasePrice::Selling(selling),
        (None, Some(wholesale)) => BasePrice::Wholesale(wholesale),
        (None, None) => anyhow::bail!("Either --selling or --wholesale is required"),
    };

    let sheet = price_sheet(&TierConfig::default(), base)?;

    println!("=== Unit price sheet ===");
    for (label, price) in sheet.rows() {
        println!("  {:<26} {:>10}원", label, thousands(price));
    }

    Ok(())
}
