use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::engine_config::{MarginConfig, Profile};
use super::source_config::SourceConfig;

/// Top-level configuration file: the default profile, optional engine
/// overrides and the collector settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub profile: Profile,
    /// Replaces the profile preset when present.
    pub margin: Option<MarginConfig>,
    pub sources: SourceConfig,
}

impl AdvisorConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read advisor config file: {}", path))?;

        let config: AdvisorConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse advisor config file: {}", path))?;

        if let Some(ref margin) = config.margin {
            margin
                .validate()
                .with_context(|| format!("Invalid margin section in {}", path))?;
        }

        Ok(config)
    }

    /// Engine configuration for a run, honouring an explicit override.
    pub fn margin_config(&self, profile: Profile) -> MarginConfig {
        match &self.margin {
            Some(margin) if profile == self.profile => margin.clone(),
            _ => MarginConfig::for_profile(profile),
        }
    }
}
