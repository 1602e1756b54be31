//! Bollinger bands over plain candle series and across timeframes.
//!
//! Window statistics use population standard deviation (divide by `period`).

use crate::application::market_data::timeframe_aggregator::TimeframeAggregator;
use crate::domain::errors::AnalysisError;
use crate::domain::market::candle::Candle;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::signals::bands::{BandMap, BandSet};
use rayon::prelude::*;
use statrs::statistics::Statistics;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandConfig {
    /// Trailing window length in candles
    pub period: usize,
    /// Standard deviations between the middle and the outer bands
    pub std_dev_multiplier: f64,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

/// Per-candle band values. Every vector has the input length and the first
/// `period - 1` entries are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandSeries {
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Simple moving average of `values` over `period`
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |window| window.iter().mean())
}

/// Population standard deviation of `values` over `period`
pub fn rolling_std_dev(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |window| window.iter().population_std_dev())
}

fn rolling(values: &[f64], period: usize, stat: impl Fn(&[f64]) -> f64) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                let value = stat(&values[i + 1 - period..=i]);
                value.is_finite().then_some(value)
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct BandCalculator {
    config: BandConfig,
    aggregator: TimeframeAggregator,
}

impl BandCalculator {
    pub fn new(config: BandConfig, base: Timeframe) -> Self {
        Self {
            config,
            aggregator: TimeframeAggregator::new(base),
        }
    }

    pub fn config(&self) -> &BandConfig {
        &self.config
    }

    /// Band values for every candle of `candles`
    pub fn bands(&self, candles: &[Candle]) -> BandSeries {
        let closes: Vec<f64> = candles.iter().map(Candle::close_f64).collect();
        let period = self.config.period;
        let k = self.config.std_dev_multiplier;

        let middle = sma(&closes, period);
        let std_dev = rolling_std_dev(&closes, period);

        let (upper, lower) = middle
            .iter()
            .zip(&std_dev)
            .map(|(m, sd)| match (m, sd) {
                (Some(m), Some(sd)) => (Some(m + k * sd), Some(m - k * sd)),
                _ => (None, None),
            })
            .unzip();

        BandSeries {
            middle,
            upper,
            lower,
        }
    }

    /// Latest band triple of an already-aggregated series
    pub fn latest(&self, candles: &[Candle], timeframe: Timeframe) -> Result<BandSet, AnalysisError> {
        let period = self.config.period;
        if period == 0 {
            return Err(AnalysisError::DegenerateInput {
                reason: "band period must be at least 1".to_string(),
            });
        }
        let last = match candles.last() {
            Some(last) if candles.len() >= period => last,
            _ => {
                return Err(AnalysisError::InsufficientHistory {
                    what: format!("{} bands", timeframe),
                    required: period,
                    available: candles.len(),
                });
            }
        };

        // Only the trailing window matters for the latest value
        let window = &candles[candles.len() - period..];
        let series = self.bands(window);
        let idx = window.len() - 1;

        Ok(BandSet::new(
            timeframe,
            series.middle[idx],
            series.upper[idx],
            series.lower[idx],
            last.close_f64(),
            last.open_time,
        ))
    }

    /// Aggregate the base series into every timeframe and keep the latest
    /// bands of each. Timeframes without `period` aggregated candles are omitted.
    pub fn multi_timeframe(&self, base_candles: &[Candle], timeframes: &[Timeframe]) -> BandMap {
        timeframes
            .par_iter()
            .filter_map(|&timeframe| {
                let candles = self.aggregator.aggregate(base_candles, timeframe);
                match self.latest(&candles, timeframe) {
                    Ok(set) => Some((timeframe, set)),
                    Err(e) => {
                        debug!("BandCalculator: Omitting {}: {}", timeframe, e);
                        None
                    }
                }
            })
            .collect()
    }
}

impl Default for BandCalculator {
    fn default() -> Self {
        Self::new(BandConfig::default(), Timeframe::FifteenMin)
    }
}
