//! Configuration module for marketlens.
//!
//! Settings are read from environment variables (optionally seeded from a
//! `.env` file by the binary) and grouped by concern: exchange access and
//! analyzer parameters. Unset variables fall back to defaults; values that
//! do not parse are hard errors.

mod analysis_config;
mod exchange_config;

pub use analysis_config::{AnalysisEnvConfig, parse_timeframe_list};
pub use exchange_config::ExchangeEnvConfig;

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub exchange: ExchangeEnvConfig,
    pub analysis: AnalysisEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` uses the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let reader = EnvReader::new(&lookup);
        Ok(Self {
            exchange: ExchangeEnvConfig::from_reader(&reader)
                .context("Failed to load exchange config")?,
            analysis: AnalysisEnvConfig::from_reader(&reader)
                .context("Failed to load analysis config")?,
        })
    }
}

/// Typed access to configuration variables. Empty values count as unset.
pub(crate) struct EnvReader<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> EnvReader<'a> {
    pub(crate) fn new(lookup: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self { lookup }
    }

    pub(crate) fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub(crate) fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.string(key) {
            Some(raw) => raw
                .parse::<T>()
                .map_err(|e| anyhow!("Failed to parse {}={:?}: {}", key, raw, e)),
            None => Ok(default),
        }
    }
}
