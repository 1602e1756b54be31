//! Analyzer parameters parsed from environment variables.

use super::EnvReader;
use crate::application::analysis::level_cluster::ClusterConfig;
use crate::application::analysis::order_flow::OrderFlowConfig;
use crate::application::cycles::swing_points::SwingConfig;
use crate::application::indicators::bollinger::BandConfig;
use crate::domain::market::timeframe::Timeframe;
use anyhow::{Context, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisEnvConfig {
    /// Resolution fetched from the exchange; every band timeframe is built from it
    pub base_timeframe: Timeframe,
    pub band_timeframes: Vec<Timeframe>,
    pub bands: BandConfig,
    pub cluster: ClusterConfig,
    pub order_flow: OrderFlowConfig,
    /// Timeframe whose lower/upper band bounds the order-flow buckets
    pub order_flow_range_timeframe: Timeframe,
    /// Candle interval fetched for swing and cycle detection
    pub cycle_timeframe: Timeframe,
    pub swing: SwingConfig,
}

impl Default for AnalysisEnvConfig {
    fn default() -> Self {
        Self {
            base_timeframe: Timeframe::FifteenMin,
            band_timeframes: Timeframe::all(),
            bands: BandConfig::default(),
            cluster: ClusterConfig::default(),
            order_flow: OrderFlowConfig::default(),
            order_flow_range_timeframe: Timeframe::FifteenMin,
            cycle_timeframe: Timeframe::OneMonth,
            swing: SwingConfig::default(),
        }
    }
}

impl AnalysisEnvConfig {
    pub(crate) fn from_reader(env: &EnvReader<'_>) -> Result<Self> {
        let defaults = Self::default();

        let base_timeframe = env.parse("BASE_TIMEFRAME", defaults.base_timeframe)?;
        let band_timeframes = match env.string("BAND_TIMEFRAMES") {
            Some(raw) => parse_timeframe_list(&raw).context("Failed to parse BAND_TIMEFRAMES")?,
            None => defaults.band_timeframes,
        };

        let bands = BandConfig {
            period: env.parse("BB_PERIOD", defaults.bands.period)?,
            std_dev_multiplier: env.parse("BB_STD_DEV", defaults.bands.std_dev_multiplier)?,
        };
        if bands.period == 0 {
            anyhow::bail!("BB_PERIOD must be at least 1");
        }
        if bands.std_dev_multiplier < 0.0 {
            anyhow::bail!("BB_STD_DEV must not be negative");
        }

        let cluster = ClusterConfig {
            threshold_pct: env.parse("CLUSTER_THRESHOLD_PCT", defaults.cluster.threshold_pct)?,
            ..defaults.cluster
        };

        let order_flow = OrderFlowConfig {
            price_steps: env.parse("ORDER_FLOW_PRICE_STEPS", defaults.order_flow.price_steps)?,
            significant_levels_limit: env.parse(
                "ORDER_FLOW_LEVELS_LIMIT",
                defaults.order_flow.significant_levels_limit,
            )?,
            ..defaults.order_flow
        };
        if order_flow.price_steps == 0 {
            anyhow::bail!("ORDER_FLOW_PRICE_STEPS must be at least 1");
        }

        let swing = SwingConfig {
            lookback: env.parse("SWING_LOOKBACK", defaults.swing.lookback)?,
            min_swing_strength: env.parse("SWING_MIN_STRENGTH", defaults.swing.min_swing_strength)?,
            significance_multiplier: env.parse(
                "SWING_SIGNIFICANCE_MULTIPLIER",
                defaults.swing.significance_multiplier,
            )?,
        };
        if swing.lookback == 0 {
            anyhow::bail!("SWING_LOOKBACK must be at least 1");
        }

        Ok(Self {
            base_timeframe,
            band_timeframes,
            bands,
            cluster,
            order_flow,
            order_flow_range_timeframe: env.parse("ORDER_FLOW_RANGE_TIMEFRAME", base_timeframe)?,
            cycle_timeframe: env.parse("CYCLE_TIMEFRAME", defaults.cycle_timeframe)?,
            swing,
        })
    }
}

/// Comma separated labels, e.g. `15m,1h,1d`. Duplicates are dropped and the
/// result is ordered by duration.
pub fn parse_timeframe_list(raw: &str) -> Result<Vec<Timeframe>> {
    let mut timeframes = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<Timeframe>)
        .collect::<Result<Vec<_>>>()?;
    timeframes.sort();
    timeframes.dedup();

    if timeframes.is_empty() {
        anyhow::bail!("timeframe list is empty");
    }
    Ok(timeframes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn read(vars: &[(&str, &str)]) -> Result<AnalysisEnvConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let lookup = |key: &str| vars.get(key).cloned();
        AnalysisEnvConfig::from_reader(&EnvReader::new(&lookup))
    }

    #[test]
    fn test_analysis_config_defaults() {
        let config = read(&[]).unwrap();
        assert_eq!(config, AnalysisEnvConfig::default());
        assert_eq!(config.band_timeframes.len(), 23);
        assert_eq!(config.bands.period, 20);
        assert_eq!(config.swing, SwingConfig::long_horizon());
    }

    #[test]
    fn test_range_timeframe_follows_base() {
        let config = read(&[("BASE_TIMEFRAME", "1h")]).unwrap();
        assert_eq!(config.base_timeframe, Timeframe::OneHour);
        assert_eq!(config.order_flow_range_timeframe, Timeframe::OneHour);
    }

    #[test]
    fn test_overrides() {
        let config = read(&[
            ("BAND_TIMEFRAMES", "1d, 15m,1h,15m"),
            ("BB_PERIOD", "14"),
            ("BB_STD_DEV", "2.5"),
            ("CLUSTER_THRESHOLD_PCT", "0.002"),
            ("ORDER_FLOW_PRICE_STEPS", "20"),
            ("CYCLE_TIMEFRAME", "1w"),
            ("SWING_LOOKBACK", "2"),
        ])
        .unwrap();

        assert_eq!(
            config.band_timeframes,
            vec![Timeframe::FifteenMin, Timeframe::OneHour, Timeframe::OneDay]
        );
        assert_eq!(config.bands.period, 14);
        assert_eq!(config.bands.std_dev_multiplier, 2.5);
        assert_eq!(config.cluster.threshold_pct, 0.002);
        assert_eq!(config.cluster.long_min_risk_reward, 2.0);
        assert_eq!(config.order_flow.price_steps, 20);
        assert_eq!(config.order_flow.significant_levels_limit, 5);
        assert_eq!(config.cycle_timeframe, Timeframe::OneWeek);
        assert_eq!(config.swing.lookback, 2);
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(read(&[("BASE_TIMEFRAME", "1m")]).is_err());
        assert!(read(&[("BAND_TIMEFRAMES", ",")]).is_err());
        assert!(read(&[("BB_PERIOD", "0")]).is_err());
        assert!(read(&[("BB_STD_DEV", "wide")]).is_err());
        assert!(read(&[("ORDER_FLOW_PRICE_STEPS", "0")]).is_err());
        assert!(read(&[("SWING_LOOKBACK", "0")]).is_err());
    }
}
