use crate::domain::market::order_book::OrderBookSummary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketType {
    Support,
    Resistance,
}

/// Order and trade activity accumulated over one price bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Lower edge of the bucket
    pub price: f64,
    #[serde(rename = "type")]
    pub bucket_type: BucketType,
    pub order_volume: f64,
    pub trade_volume: f64,
    pub order_count: usize,
    pub trade_count: usize,
}

impl Bucket {
    pub fn new(price: f64, bucket_type: BucketType) -> Self {
        Self {
            price,
            bucket_type,
            order_volume: 0.0,
            trade_volume: 0.0,
            order_count: 0,
            trade_count: 0,
        }
    }

    pub fn has_activity(&self) -> bool {
        self.order_volume > 0.0 || self.trade_volume > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredLevel {
    pub price: f64,
    #[serde(rename = "type")]
    pub level_type: BucketType,
    pub strength: f64,
    /// Order volume plus trade volume
    pub volume: f64,
    pub order_count: usize,
    pub trade_count: usize,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlowAction {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationMetrics {
    pub risk_reward_ratio: f64,
    pub relative_position: f64,
    pub nearest_support: f64,
    pub nearest_resistance: f64,
    pub support_strength: f64,
    pub resistance_strength: f64,
    pub buy_pressure: f64,
}

impl Default for RecommendationMetrics {
    fn default() -> Self {
        Self {
            risk_reward_ratio: 0.0,
            relative_position: 0.5,
            nearest_support: 0.0,
            nearest_resistance: 0.0,
            support_strength: 0.0,
            resistance_strength: 0.0,
            buy_pressure: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: FlowAction,
    pub confidence: f64,
    pub reason: String,
    pub metrics: RecommendationMetrics,
}

impl Recommendation {
    pub fn hold(reason: impl Into<String>, metrics: RecommendationMetrics) -> Self {
        Self {
            action: FlowAction::Hold,
            confidence: 0.0,
            reason: reason.into(),
            metrics,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookMetrics {
    pub buy_volume: f64,
    pub sell_volume: f64,
    pub buy_order_count: usize,
    pub sell_order_count: usize,
    pub recent_buy_volume: f64,
    pub recent_sell_volume: f64,
    pub buy_pressure: f64,
}

impl Default for OrderBookMetrics {
    fn default() -> Self {
        Self {
            buy_volume: 0.0,
            sell_volume: 0.0,
            buy_order_count: 0,
            sell_order_count: 0,
            recent_buy_volume: 0.0,
            recent_sell_volume: 0.0,
            buy_pressure: 0.5,
        }
    }
}

impl OrderBookMetrics {
    pub fn from_summary(summary: &OrderBookSummary, buy_pressure: f64) -> Self {
        Self {
            buy_volume: summary.total_bid_volume,
            sell_volume: summary.total_ask_volume,
            buy_order_count: summary.bid_levels,
            sell_order_count: summary.ask_levels,
            recent_buy_volume: summary.total_buy_volume,
            recent_sell_volume: summary.total_sell_volume,
            buy_pressure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFlowAnalysis {
    /// Significant levels, nearest to the current price first
    pub levels: Vec<ScoredLevel>,
    pub recommendation: Recommendation,
    pub order_book_metrics: OrderBookMetrics,
}

impl OrderFlowAnalysis {
    /// Documented "no data" result: no levels, HOLD with zero confidence
    pub fn insufficient_data() -> Self {
        Self {
            levels: Vec::new(),
            recommendation: Recommendation::hold(
                "Insufficient data for analysis",
                RecommendationMetrics::default(),
            ),
            order_book_metrics: OrderBookMetrics::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_analysis_shape() {
        let analysis = OrderFlowAnalysis::insufficient_data();
        assert!(analysis.levels.is_empty());
        assert_eq!(analysis.recommendation.action, FlowAction::Hold);
        assert_eq!(analysis.recommendation.confidence, 0.0);
        assert_eq!(analysis.recommendation.metrics.relative_position, 0.5);
        assert_eq!(analysis.order_book_metrics.buy_pressure, 0.5);

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["recommendation"]["action"], "HOLD");
        assert_eq!(json["orderBookMetrics"]["buyPressure"], 0.5);
        assert_eq!(json["recommendation"]["metrics"]["riskRewardRatio"], 0.0);
    }

    #[test]
    fn test_bucket_type_serializes_as_type() {
        let level = ScoredLevel {
            price: 1.0,
            level_type: BucketType::Resistance,
            strength: 0.1,
            volume: 2.0,
            order_count: 1,
            trade_count: 0,
            confidence: 0.07,
        };
        let json = serde_json::to_value(level).unwrap();
        assert_eq!(json["type"], "resistance");
        assert_eq!(json["orderCount"], 1);
    }
}
