use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::config::CategoricalConfig;
use crate::error::{InputError, InputResult};

/// Selected choice per axis, keyed by axis name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoricalSelection {
    choices: BTreeMap<String, String>,
}

impl CategoricalSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, axis: impl Into<String>, choice: impl Into<String>) -> Self {
        self.choices.insert(axis.into(), choice.into());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.choices.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }
}

/// Delta contributed by one selected choice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisDelta {
    pub axis: String,
    pub choice: String,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalBreakdown {
    pub base_margin: f64,
    pub deltas: Vec<AxisDelta>,
    pub raw_margin: f64,
    pub suggested_margin: f64,
}

/// Base margin plus the table delta of every selected choice, clamped.
pub fn categorical_margin(
    config: &CategoricalConfig,
    selection: &CategoricalSelection,
) -> InputResult<CategoricalBreakdown> {
    let mut deltas = Vec::with_capacity(selection.choices.len());

    for (axis, choice) in selection.iter() {
        let table = config
            .axes
            .get(axis)
            .ok_or_else(|| InputError::UnknownAxis(axis.to_string()))?;
        let delta = table.get(choice).ok_or_else(|| InputError::UnknownChoice {
            axis: axis.to_string(),
            choice: choice.to_string(),
        })?;
        deltas.push(AxisDelta {
            axis: axis.to_string(),
            choice: choice.to_string(),
            delta: *delta,
        });
    }

    let raw_margin = config.base_margin + deltas.iter().map(|d| d.delta).sum::<f64>();

    Ok(CategoricalBreakdown {
        base_margin: config.base_margin,
        deltas,
        raw_margin,
        suggested_margin: config.band.clamp(raw_margin),
    })
}

macro_rules! level_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_choice(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("invalid {}: {}", stringify!($name), other)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_choice())
            }
        }
    };
}

level_enum!(
    /// How crowded the market already is.
    CompetitionLevel { Low => "low", Medium => "medium", High => "high" }
);
level_enum!(
    /// Expected consumer demand.
    DemandLevel { High => "high", Medium => "medium", Low => "low" }
);
level_enum!(
    /// Size of the production run.
    ProductionScale { Small => "small", Medium => "medium", Large => "large" }
);
level_enum!(
    /// Daily production volume.
    ProductionVolume { Low => "low", Medium => "medium", High => "high" }
);

/// The six situational inputs of the new-product simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SituationalChoices {
    pub competition: CompetitionLevel,
    pub demand: DemandLevel,
    pub scale: ProductionScale,
    pub production: ProductionVolume,
    pub ingredient_use: bool,
    pub retail_use: bool,
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

impl SituationalChoices {
    pub fn to_selection(&self) -> CategoricalSelection {
        CategoricalSelection::new()
            .with("competition", self.competition.as_choice())
            .with("demand", self.demand.as_choice())
            .with("scale", self.scale.as_choice())
            .with("production", self.production.as_choice())
            .with("ingredient", yes_no(self.ingredient_use))
            .with("retail", yes_no(self.retail_use))
    }
}
