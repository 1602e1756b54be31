use crate::domain::errors::AnalysisError;
use crate::domain::market::order_book::{MarketSnapshot, OrderBookEntry, Trade};
use crate::domain::signals::bands::BandSet;
use crate::domain::signals::order_flow::{
    Bucket, BucketType, FlowAction, OrderBookMetrics, OrderFlowAnalysis, Recommendation,
    RecommendationMetrics, ScoredLevel,
};
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;
use tracing::debug;

const ORDER_VOLUME_WEIGHT: f64 = 0.4;
const TRADE_VOLUME_WEIGHT: f64 = 0.3;
const ORDER_COUNT_WEIGHT: f64 = 0.2;
const TRADE_COUNT_WEIGHT: f64 = 0.1;
const DISTANCE_PENALTY: f64 = 0.5;

const STRENGTH_CONFIDENCE_WEIGHT: f64 = 0.7;
const ACTIVITY_CONFIDENCE_WEIGHT: f64 = 0.3;
const ACTIVITY_SATURATION: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderFlowConfig {
    /// Number of equal-width buckets between the lower and upper band
    pub price_steps: usize,
    /// Levels kept per bucket type after scoring
    pub significant_levels_limit: usize,
    pub min_level_confidence: f64,
    pub buy_position_max: f64,
    pub sell_position_min: f64,
    pub buy_pressure_min: f64,
    pub sell_pressure_max: f64,
}

impl Default for OrderFlowConfig {
    fn default() -> Self {
        Self {
            price_steps: 50,
            significant_levels_limit: 5,
            min_level_confidence: 0.6,
            buy_position_max: 0.3,
            sell_position_min: 0.7,
            buy_pressure_min: 0.6,
            sell_pressure_max: 0.4,
        }
    }
}

/// Buckets order-book depth and recent trades between two band values and
/// derives support/resistance levels plus a BUY/SELL/HOLD recommendation.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFlowAnalyzer {
    config: OrderFlowConfig,
}

impl OrderFlowAnalyzer {
    pub fn new(config: OrderFlowConfig) -> Self {
        Self { config }
    }

    /// Analyze with the lower/upper band of `range` as bucket bounds. Any
    /// missing or degenerate input yields the documented default analysis.
    pub fn analyze(&self, snapshot: &MarketSnapshot, range: Option<&BandSet>) -> OrderFlowAnalysis {
        let Some((lower, upper)) = range.and_then(|set| set.lower.zip(set.upper)) else {
            debug!("OrderFlowAnalyzer: No band range, returning default analysis");
            return OrderFlowAnalysis::insufficient_data();
        };

        match self.try_analyze(snapshot, lower, upper) {
            Ok(analysis) => analysis,
            Err(e) => {
                debug!("OrderFlowAnalyzer: {}, returning default analysis", e);
                OrderFlowAnalysis::insufficient_data()
            }
        }
    }

    pub fn try_analyze(
        &self,
        snapshot: &MarketSnapshot,
        lower: f64,
        upper: f64,
    ) -> Result<OrderFlowAnalysis, AnalysisError> {
        let current_price = snapshot.current_price;
        if current_price.is_nan() || current_price <= 0.0 {
            return Err(AnalysisError::DegenerateInput {
                reason: format!("current price {} is not positive", current_price),
            });
        }

        let buckets = self.combine_levels(snapshot, lower, upper)?;
        if !buckets.iter().any(|b| b.order_volume > 0.0) {
            return Err(AnalysisError::missing(format!(
                "no order-book depth between {:.2} and {:.2}",
                lower, upper
            )));
        }

        let levels = self.score_levels(&buckets, current_price);
        let buy_pressure = snapshot.buy_pressure();
        let recommendation = self.recommend(&levels, current_price, buy_pressure);

        debug!(
            "OrderFlowAnalyzer: {} buckets, {} significant levels, {:?} ({:.2})",
            buckets.len(),
            levels.len(),
            recommendation.action,
            recommendation.confidence
        );

        Ok(OrderFlowAnalysis {
            levels,
            recommendation,
            order_book_metrics: OrderBookMetrics::from_summary(&snapshot.summary(), buy_pressure),
        })
    }

    /// Accumulate in-range bids, asks and trades into price buckets.
    ///
    /// A bucket's type is decided by its first contributor, processed in the
    /// order bids, asks, buy trades, sell trades. Only buckets with activity
    /// are returned, in ascending price order.
    pub fn combine_levels(
        &self,
        snapshot: &MarketSnapshot,
        lower: f64,
        upper: f64,
    ) -> Result<Vec<Bucket>, AnalysisError> {
        let steps = self.config.price_steps;
        let width = (upper - lower) / steps as f64;
        if steps == 0 || !width.is_finite() || width <= 0.0 {
            return Err(AnalysisError::DegenerateInput {
                reason: format!("empty bucket range [{}, {}] over {} steps", lower, upper, steps),
            });
        }

        // A price exactly on the upper band lands in the last bucket
        let index_of = |price: f64| -> Option<usize> {
            (lower..=upper)
                .contains(&price)
                .then(|| (((price - lower) / width).floor() as usize).min(steps - 1))
        };

        let mut buckets: BTreeMap<usize, Bucket> = BTreeMap::new();
        let mut add = |price: f64, bucket_type: BucketType, volume: f64, is_order: bool| {
            let Some(index) = index_of(price) else {
                return;
            };
            let bucket = buckets
                .entry(index)
                .or_insert_with(|| Bucket::new(lower + index as f64 * width, bucket_type));
            if is_order {
                bucket.order_volume += volume;
                bucket.order_count += 1;
            } else {
                bucket.trade_volume += volume;
                bucket.trade_count += 1;
            }
        };

        let book = &snapshot.order_book;
        for (entries, bucket_type) in [
            (&book.bids, BucketType::Support),
            (&book.asks, BucketType::Resistance),
        ] {
            for entry in entries.iter() {
                let (price, volume) = entry_f64(entry);
                add(price, bucket_type, volume, true);
            }
        }

        let trades = &snapshot.recent_trades;
        for (trades, bucket_type) in [
            (&trades.buys, BucketType::Support),
            (&trades.sells, BucketType::Resistance),
        ] {
            for trade in trades.iter() {
                let (price, quantity) = trade_f64(trade);
                add(price, bucket_type, quantity, false);
            }
        }

        Ok(buckets.into_values().filter(Bucket::has_activity).collect())
    }

    /// Score every bucket, keep the strongest per type and order the result
    /// by distance from the current price.
    pub fn score_levels(&self, buckets: &[Bucket], current_price: f64) -> Vec<ScoredLevel> {
        let total_order_volume: f64 = buckets.iter().map(|b| b.order_volume).sum();
        let total_trade_volume: f64 = buckets.iter().map(|b| b.trade_volume).sum();
        let max_order_count = buckets.iter().map(|b| b.order_count).max().unwrap_or(0);
        let max_trade_count = buckets.iter().map(|b| b.trade_count).max().unwrap_or(0);

        let scored = buckets.iter().map(|bucket| {
            let distance = (current_price - bucket.price).abs() / current_price;
            let raw = ratio(bucket.order_volume, total_order_volume) * ORDER_VOLUME_WEIGHT
                + ratio(bucket.trade_volume, total_trade_volume) * TRADE_VOLUME_WEIGHT
                + ratio(bucket.order_count as f64, max_order_count as f64) * ORDER_COUNT_WEIGHT
                + ratio(bucket.trade_count as f64, max_trade_count as f64) * TRADE_COUNT_WEIGHT;
            // Buckets more than twice the price away score zero
            let strength = raw * (1.0 - distance * DISTANCE_PENALTY).max(0.0);

            ScoredLevel {
                price: bucket.price,
                level_type: bucket.bucket_type,
                strength,
                volume: bucket.order_volume + bucket.trade_volume,
                order_count: bucket.order_count,
                trade_count: bucket.trade_count,
                confidence: confidence(strength, bucket.order_count + bucket.trade_count),
            }
        });

        let (mut supports, mut resistances): (Vec<ScoredLevel>, Vec<ScoredLevel>) =
            scored.partition(|level| level.level_type == BucketType::Support);

        let limit = self.config.significant_levels_limit;
        for side in [&mut supports, &mut resistances] {
            side.sort_by(|a, b| b.strength.total_cmp(&a.strength));
            side.truncate(limit);
        }

        let mut levels = supports;
        levels.append(&mut resistances);
        levels.sort_by(|a, b| {
            (current_price - a.price)
                .abs()
                .total_cmp(&(current_price - b.price).abs())
        });
        levels
    }

    /// `levels` must be ordered nearest first
    pub fn recommend(
        &self,
        levels: &[ScoredLevel],
        current_price: f64,
        buy_pressure: f64,
    ) -> Recommendation {
        let support = levels
            .iter()
            .find(|l| l.level_type == BucketType::Support && l.price < current_price);
        let resistance = levels
            .iter()
            .find(|l| l.level_type == BucketType::Resistance && l.price > current_price);

        let (support, resistance) = match (support, resistance) {
            (Some(s), Some(r)) => (s, r),
            (support, resistance) => {
                let metrics = RecommendationMetrics {
                    nearest_support: support.map_or(0.0, |s| s.price),
                    nearest_resistance: resistance.map_or(0.0, |r| r.price),
                    support_strength: support.map_or(0.0, |s| s.strength),
                    resistance_strength: resistance.map_or(0.0, |r| r.strength),
                    buy_pressure,
                    ..RecommendationMetrics::default()
                };
                return Recommendation::hold("Insufficient data to make a recommendation", metrics);
            }
        };

        // Both denominators are positive: support < price < resistance
        let distance_to_support = current_price - support.price;
        let distance_to_resistance = resistance.price - current_price;
        let relative_position = distance_to_support / (resistance.price - support.price);

        let metrics = RecommendationMetrics {
            risk_reward_ratio: distance_to_resistance / distance_to_support,
            relative_position,
            nearest_support: support.price,
            nearest_resistance: resistance.price,
            support_strength: support.strength,
            resistance_strength: resistance.strength,
            buy_pressure,
        };

        let cfg = &self.config;
        if relative_position < cfg.buy_position_max
            && support.confidence > cfg.min_level_confidence
            && buy_pressure > cfg.buy_pressure_min
        {
            Recommendation {
                action: FlowAction::Buy,
                confidence: support.confidence * buy_pressure * (1.0 - relative_position),
                reason: format!(
                    "Strong support at {:.2} with high buy pressure ({:.1}%)",
                    support.price,
                    buy_pressure * 100.0
                ),
                metrics,
            }
        } else if relative_position > cfg.sell_position_min
            && resistance.confidence > cfg.min_level_confidence
            && buy_pressure < cfg.sell_pressure_max
        {
            Recommendation {
                action: FlowAction::Sell,
                confidence: resistance.confidence * (1.0 - buy_pressure) * relative_position,
                reason: format!(
                    "Strong resistance at {:.2} with high sell pressure ({:.1}%)",
                    resistance.price,
                    (1.0 - buy_pressure) * 100.0
                ),
                metrics,
            }
        } else {
            Recommendation {
                action: FlowAction::Hold,
                confidence: support.confidence.max(resistance.confidence) * 0.5,
                reason: format!(
                    "Price in neutral zone between support ({:.2}) and resistance ({:.2})",
                    support.price, resistance.price
                ),
                metrics,
            }
        }
    }
}

/// Blend of level strength and capped activity count, always in `[0, 1]`
pub fn confidence(strength: f64, activity_count: usize) -> f64 {
    let activity = (activity_count as f64 / ACTIVITY_SATURATION).min(1.0);
    let blended = strength * STRENGTH_CONFIDENCE_WEIGHT + activity * ACTIVITY_CONFIDENCE_WEIGHT;
    blended.clamp(0.0, 1.0)
}

/// `part / whole`, or 0 when the whole is not positive
fn ratio(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole } else { 0.0 }
}

fn entry_f64(entry: &OrderBookEntry) -> (f64, f64) {
    (
        entry.price.to_f64().unwrap_or(0.0),
        entry.volume.to_f64().unwrap_or(0.0),
    )
}

fn trade_f64(trade: &Trade) -> (f64, f64) {
    (
        trade.price.to_f64().unwrap_or(0.0),
        trade.quantity.to_f64().unwrap_or(0.0),
    )
}
