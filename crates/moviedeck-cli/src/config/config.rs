//! `AppConfig` struct and TOML read/write.

use std::path::Path;

use anyhow::{Context, Result};
use moviedeck_api::tmdb::Locale;
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// TMDB settings.
    #[serde(default)]
    pub tmdb: TmdbConfig,
}

/// TMDB configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TmdbConfig {
    /// Response language (e.g. "en-US").
    pub language: String,
    /// Region used for release dates and theatre listings (e.g. "US").
    pub region: String,
    /// API key. `TMDB_API_KEY` takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        let locale = Locale::default();
        Self {
            language: locale.language,
            region: locale.region,
            api_key: None,
        }
    }
}

impl TmdbConfig {
    /// Locale to send with every request.
    pub fn locale(&self) -> Locale {
        Locale::new(self.language.as_str(), self.region.as_str())
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// API key from the environment override, else from the file.
    ///
    /// Blank values count as unset.
    pub fn resolve_api_key(&self, env_override: Option<String>) -> Option<String> {
        env_override
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                self.tmdb
                    .api_key
                    .clone()
                    .filter(|k| !k.trim().is_empty())
            })
    }
}
