use crate::domain::market::candle::Candle;
use crate::domain::market::timeframe::Timeframe;
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Merges base-resolution candles into coarser timeframes.
///
/// Aggregation is chunk based: every `multiplier` consecutive base candles
/// form one output candle and a trailing partial chunk is dropped, so every
/// aggregate covers the same fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct TimeframeAggregator {
    base: Timeframe,
}

impl TimeframeAggregator {
    pub fn new(base: Timeframe) -> Self {
        Self { base }
    }

    pub fn base(&self) -> Timeframe {
        self.base
    }

    /// Aggregate `candles` (at the base resolution) into `target`.
    ///
    /// # Returns
    /// - a copy of the input when `target` has no multiplier relative to the base
    /// - an empty vector when not even one full chunk is available
    pub fn aggregate(&self, candles: &[Candle], target: Timeframe) -> Vec<Candle> {
        let Some(multiplier) = target.multiplier_from(self.base) else {
            if target != self.base {
                warn!(
                    "TimeframeAggregator: {} is not a multiple of base {}, passing candles through",
                    target, self.base
                );
            }
            return candles.to_vec();
        };

        if candles.len() < multiplier {
            debug!(
                "TimeframeAggregator: {} needs {} base candles, have {}",
                target,
                multiplier,
                candles.len()
            );
            return Vec::new();
        }

        // chunks_exact leaves the trailing partial chunk in the remainder
        candles
            .chunks_exact(multiplier)
            .filter_map(merge_chunk)
            .collect()
    }
}

impl Default for TimeframeAggregator {
    fn default() -> Self {
        Self::new(Timeframe::FifteenMin)
    }
}

/// Combine consecutive candles into one. `None` for an empty slice.
pub fn merge_chunk(chunk: &[Candle]) -> Option<Candle> {
    let first = chunk.first()?;
    let last = chunk.last()?;

    let mut merged = Candle {
        open_time: first.open_time,
        close_time: last.close_time,
        open: first.open,
        high: first.high,
        low: first.low,
        close: last.close,
        volume: Decimal::ZERO,
        quote_volume: Decimal::ZERO,
        trade_count: 0,
        taker_buy_base_volume: Decimal::ZERO,
        taker_buy_quote_volume: Decimal::ZERO,
    };

    for candle in chunk {
        merged.high = merged.high.max(candle.high);
        merged.low = merged.low.min(candle.low);
        merged.volume += candle.volume;
        merged.quote_volume += candle.quote_volume;
        merged.trade_count += candle.trade_count;
        merged.taker_buy_base_volume += candle.taker_buy_base_volume;
        merged.taker_buy_quote_volume += candle.taker_buy_quote_volume;
    }

    Some(merged)
}
