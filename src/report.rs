//! Plain-text rendering of one analysis run.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::Profile;
use crate::engine::{MarginResult, MarginScore, Signal, SignalSet};
use crate::error::CollectionError;
use crate::fetcher::Collection;
use crate::models::{Evidence, EvidenceCategory};

/// Formats an integer with comma thousands separators.
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn score_line(label: &str, signal: &Signal) -> String {
    match signal.value() {
        Some(v) => format!("  {:<12} {:>4.1} / 10", label, v * 10.0),
        None => format!("  {:<12}  n/a (neutral)", label),
    }
}

pub struct AnalysisReport {
    pub product: String,
    pub profile: Profile,
    pub signals: SignalSet,
    pub evidence: Vec<Evidence>,
    pub failures: Vec<CollectionError>,
    pub estimated: bool,
    pub result: MarginResult,
    pub max_evidence: usize,
}

impl AnalysisReport {
    pub fn new(
        product: &str,
        profile: Profile,
        collection: Collection,
        result: MarginResult,
        max_evidence: usize,
    ) -> Self {
        Self {
            product: product.to_string(),
            profile,
            signals: collection.signals,
            evidence: collection.evidence,
            failures: collection.failures,
            estimated: collection.estimated,
            result,
            max_evidence,
        }
    }

    /// Evidence kept under the cap, grouped by category in display order.
    pub fn grouped_evidence(&self) -> BTreeMap<EvidenceCategory, Vec<&Evidence>> {
        let mut grouped: BTreeMap<EvidenceCategory, Vec<&Evidence>> = BTreeMap::new();
        for evidence in self.evidence.iter().take(self.max_evidence) {
            grouped.entry(evidence.category).or_default().push(evidence);
        }
        grouped
    }

    fn write_breakdown(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result.score {
            MarginScore::Continuous(b) => {
                writeln!(f, "  base margin          {:+.1}%", b.base_margin * 100.0)?;
                writeln!(f, "  demand bonus         {:+.1}%", b.demand_bonus * 100.0)?;
                writeln!(f, "  popularity bonus     {:+.1}%", b.popularity_bonus * 100.0)?;
                writeln!(f, "  rarity bonus         {:+.1}%", b.rarity_bonus * 100.0)?;
                writeln!(f, "  competition penalty  {:+.1}%", -b.competition_penalty * 100.0)?;
            }
            MarginScore::Categorical(b) => {
                writeln!(f, "  base margin          {:+.1}%", b.base_margin * 100.0)?;
                for delta in &b.deltas {
                    writeln!(
                        f,
                        "  {:<20} {:+.1}%",
                        format!("{}={}", delta.axis, delta.choice),
                        delta.delta * 100.0
                    )?;
                }
            }
            MarginScore::Manual(_) => writeln!(f, "  margin set manually")?,
        }
        Ok(())
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Margin analysis: {} ({}) ===", self.product, self.profile.as_str())?;
        if self.estimated {
            writeln!(f, "Mode: estimated (live data unavailable or skipped)")?;
        }
        writeln!(f)?;

        writeln!(f, "Scores:")?;
        writeln!(f, "{}", score_line("rarity", &self.signals.rarity))?;
        writeln!(f, "{}", score_line("popularity", &self.signals.popularity))?;
        writeln!(f, "{}", score_line("demand", &self.signals.demand))?;
        writeln!(f, "{}", score_line("competition", &self.signals.competition))?;
        if let Some(count) = self.signals.product_count {
            writeln!(
                f,
                "  listings     {} ({} brands)",
                thousands(count as u64),
                self.signals.brand_count.unwrap_or(0)
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Suggested margin: {:.1}%", self.result.suggested_margin_pct())?;
        self.write_breakdown(f)?;

        if let Some(prices) = &self.result.prices {
            writeln!(f)?;
            writeln!(f, "Prices:")?;
            writeln!(f, "  wholesale  {}원", thousands(prices.wholesale))?;
            writeln!(f, "  retail     {}원", thousands(prices.retail))?;
            writeln!(f, "  effective margin {:.1}%", prices.effective_margin_pct())?;
            if prices.ceiling_applied {
                let avg = self.signals.competitor_price().unwrap_or(0.0);
                writeln!(
                    f,
                    "  retail capped by competitor average {}원",
                    thousands(avg.round() as u64)
                )?;
            }
        }

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings:")?;
            for failure in &self.failures {
                writeln!(f, "  ⚠️ {}", failure)?;
            }
        }

        let grouped = self.grouped_evidence();
        if !grouped.is_empty() {
            writeln!(f)?;
            writeln!(f, "Evidence:")?;
            for (category, items) in grouped {
                writeln!(f, "  [{}]", category.label())?;
                for evidence in items {
                    writeln!(f, "    - {}", evidence.text)?;
                }
            }
            if self.evidence.len() > self.max_evidence {
                writeln!(
                    f,
                    "  ... {} more not shown",
                    self.evidence.len() - self.max_evidence
                )?;
            }
        }

        Ok(())
    }
}
