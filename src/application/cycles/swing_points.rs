use crate::domain::market::candle::Candle;
use crate::domain::signals::cycles::{SwingKind, SwingPoint, relative_excursion};
use tracing::debug;

/// Swing detection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingConfig {
    /// Candles compared on each side of a candidate
    pub lookback: usize,
    /// Minimum relative excursion for a swing to be kept
    pub min_swing_strength: f64,
    /// Excursion between consecutive kept swings must reach
    /// `min_swing_strength * significance_multiplier`
    pub significance_multiplier: f64,
}

impl SwingConfig {
    /// Short lookback with a high strength bar, suited to intraday candles
    pub fn standard() -> Self {
        Self {
            lookback: 2,
            min_swing_strength: 0.08,
            significance_multiplier: 1.5,
        }
    }

    /// Wide lookback with a low strength bar, used on monthly candles
    pub fn long_horizon() -> Self {
        Self {
            lookback: 5,
            min_swing_strength: 0.02,
            significance_multiplier: 2.0,
        }
    }

    pub fn significance_threshold(&self) -> f64 {
        self.min_swing_strength * self.significance_multiplier
    }
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self::long_horizon()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SwingPointFinder {
    config: SwingConfig,
}

impl SwingPointFinder {
    pub fn new(config: SwingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SwingConfig {
        &self.config
    }

    /// Significant swing points of `candles`, in time order.
    ///
    /// A candle is a swing high when its high is strictly above every high
    /// within `lookback` candles on both sides (lows mirror this). Candles
    /// without a full window on both sides are never swings.
    pub fn find(&self, candles: &[Candle]) -> Vec<SwingPoint> {
        let lookback = self.config.lookback;
        if lookback == 0 || candles.len() <= 2 * lookback {
            debug!(
                "SwingPointFinder: {} candles is too short for lookback {}",
                candles.len(),
                lookback
            );
            return Vec::new();
        }

        let mut swings = Vec::new();
        for i in lookback..candles.len() - lookback {
            let candle = &candles[i];
            let high = candle.high_f64();
            let low = candle.low_f64();
            let neighbours = (1..=lookback).flat_map(|j| [&candles[i - j], &candles[i + j]]);
            let preceding = &candles[i - lookback..i];

            let is_high = neighbours.clone().all(|c| c.high_f64() < high);
            if is_high {
                let opposite = preceding
                    .iter()
                    .map(Candle::low_f64)
                    .fold(f64::INFINITY, f64::min);
                self.push_if_strong(&mut swings, SwingKind::High, high, opposite, candle.open_time);
            }

            let is_low = neighbours.clone().all(|c| c.low_f64() > low);
            if is_low {
                let opposite = preceding
                    .iter()
                    .map(Candle::high_f64)
                    .fold(f64::NEG_INFINITY, f64::max);
                self.push_if_strong(&mut swings, SwingKind::Low, low, opposite, candle.open_time);
            }
        }

        let found = swings.len();
        let significant = self.filter_significant(swings);
        debug!(
            "SwingPointFinder: {} candidate swings, {} significant",
            found,
            significant.len()
        );
        significant
    }

    fn push_if_strong(
        &self,
        swings: &mut Vec<SwingPoint>,
        kind: SwingKind,
        price: f64,
        opposite: f64,
        time: i64,
    ) {
        let strength = relative_excursion(price.max(opposite), price.min(opposite));
        if strength >= self.config.min_swing_strength {
            swings.push(SwingPoint {
                kind,
                price,
                time,
                strength,
            });
        }
    }

    /// Sort by time, keep the first swing and then every swing that moved far
    /// enough away from the last kept one.
    pub fn filter_significant(&self, mut swings: Vec<SwingPoint>) -> Vec<SwingPoint> {
        swings.sort_by_key(|s| s.time);

        let threshold = self.config.significance_threshold();
        let mut kept: Vec<SwingPoint> = Vec::with_capacity(swings.len());
        for swing in swings {
            let keep = match kept.last() {
                None => true,
                Some(last) => {
                    let excursion = relative_excursion(
                        last.price.max(swing.price),
                        last.price.min(swing.price),
                    );
                    excursion >= threshold
                }
            };
            if keep {
                kept.push(swing);
            }
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal::prelude::FromPrimitive;

    fn candles(highs: &[f64], spread: f64) -> Vec<Candle> {
        highs
            .iter()
            .enumerate()
            .map(|(i, &high)| {
                let open_time = i as i64 * 60_000;
                let high = Decimal::from_f64(high).unwrap();
                let low = high - Decimal::from_f64(spread).unwrap();
                Candle {
                    open_time,
                    close_time: open_time + 59_999,
                    open: low,
                    high,
                    low,
                    close: high,
                    volume: Decimal::ONE,
                    quote_volume: high,
                    trade_count: 1,
                    taker_buy_base_volume: Decimal::ZERO,
                    taker_buy_quote_volume: Decimal::ZERO,
                }
            })
            .collect()
    }

    fn finder(lookback: usize, min_swing_strength: f64, multiplier: f64) -> SwingPointFinder {
        SwingPointFinder::new(SwingConfig {
            lookback,
            min_swing_strength,
            significance_multiplier: multiplier,
        })
    }

    fn swing(kind: SwingKind, price: f64, time: i64) -> SwingPoint {
        SwingPoint {
            kind,
            price,
            time,
            strength: 0.1,
        }
    }

    #[test]
    fn test_finds_peak_and_trough() {
        let series = candles(&[10.0, 11.0, 15.0, 11.0, 10.0, 9.0, 8.0, 9.0, 10.0, 11.0], 1.0);

        let swings = finder(2, 0.02, 2.0).find(&series);

        assert_eq!(swings.len(), 2);
        assert_eq!(swings[0].kind, SwingKind::High);
        assert_eq!(swings[0].price, 15.0);
        assert_eq!(swings[0].time, series[2].open_time);
        // min low of the two preceding candles is 9
        assert!((swings[0].strength - 6.0 / 15.0).abs() < 1e-12);

        assert_eq!(swings[1].kind, SwingKind::Low);
        assert_eq!(swings[1].price, 7.0);
        // max high of the two preceding candles is 10
        assert!((swings[1].strength - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_equal_neighbour_disqualifies() {
        let series = candles(&[10.0, 11.0, 15.0, 15.0, 10.0, 9.0], 1.0);
        let swings = finder(2, 0.02, 2.0).find(&series);
        assert!(swings.iter().all(|s| s.kind != SwingKind::High));
    }

    #[test]
    fn test_min_strength_filters_shallow_swings() {
        let series = candles(&[10.0, 10.1, 10.3, 10.1, 10.0], 0.1);

        assert!(finder(2, 0.05, 1.0).find(&series).is_empty());
        let swings = finder(2, 0.02, 1.0).find(&series);
        assert_eq!(swings.len(), 1);
        assert_eq!(swings[0].price, 10.3);
    }

    #[test]
    fn test_short_series_has_no_swings() {
        let series = candles(&[10.0, 12.0, 10.0, 9.0], 1.0);
        assert!(finder(2, 0.02, 2.0).find(&series).is_empty());
        assert!(finder(0, 0.02, 2.0).find(&series).is_empty());
    }

    #[test]
    fn test_filter_keeps_first_and_significant_moves() {
        let swings = vec![
            swing(SwingKind::High, 92.0, 4),
            swing(SwingKind::Low, 98.0, 2),
            swing(SwingKind::High, 100.0, 1),
            swing(SwingKind::Low, 90.0, 3),
        ];

        let kept = finder(2, 0.02, 2.0).filter_significant(swings);

        let prices: Vec<f64> = kept.iter().map(|s| s.price).collect();
        assert_eq!(prices, vec![100.0, 90.0]);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let highs: Vec<f64> = (0..120)
            .map(|i| 100.0 + ((i as f64) * 0.37).sin() * 12.0 + (i % 7) as f64)
            .collect();
        let series = candles(&highs, 3.0);
        let finder = SwingPointFinder::new(SwingConfig::standard());

        assert_eq!(finder.find(&series), finder.find(&series));
    }

    #[test]
    fn test_presets() {
        assert_eq!(SwingConfig::default(), SwingConfig::long_horizon());
        assert!((SwingConfig::standard().significance_threshold() - 0.12).abs() < 1e-12);
        assert_eq!(SwingConfig::long_horizon().lookback, 5);
    }
}
