use crate::domain::market::timeframe::Timeframe;
use crate::domain::signals::bands::BandType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Confluence strength of a support/resistance cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LevelStrength {
    Weak,
    Medium,
    Strong,
}

impl LevelStrength {
    /// 3+ members are Strong, 2 Medium, anything else Weak
    pub fn from_member_count(count: usize) -> Self {
        match count {
            c if c >= 3 => LevelStrength::Strong,
            2 => LevelStrength::Medium,
            _ => LevelStrength::Weak,
        }
    }
}

impl fmt::Display for LevelStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelStrength::Weak => write!(f, "weak"),
            LevelStrength::Medium => write!(f, "medium"),
            LevelStrength::Strong => write!(f, "strong"),
        }
    }
}

/// A support/resistance zone formed by band values from several timeframes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    /// Mean of the member band prices
    pub price: f64,
    pub strength: LevelStrength,
    pub member_count: usize,
    pub timeframes: BTreeSet<Timeframe>,
    pub band_types: BTreeSet<BandType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SuggestedAction {
    Long,
    Short,
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub action: SuggestedAction,
    pub reason: String,
    /// Distance to resistance over distance to support; absent when either
    /// side is missing or the support sits exactly at the current price
    pub risk_reward_ratio: Option<f64>,
    pub next_resistance: Option<f64>,
    pub next_support: Option<f64>,
    pub resistance_strength: Option<LevelStrength>,
    pub support_strength: Option<LevelStrength>,
}

impl Suggestion {
    pub fn insufficient_data() -> Self {
        Self {
            action: SuggestedAction::Hold,
            reason: "Insufficient data for analysis".to_string(),
            risk_reward_ratio: None,
            next_resistance: None,
            next_support: None,
            resistance_strength: None,
            support_strength: None,
        }
    }
}

/// Clusters split around the current price, nearest first on both sides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusteredLevels {
    /// Ascending by price
    pub resistance: Vec<Level>,
    /// Descending by price
    pub support: Vec<Level>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelClusterResult {
    pub current_price: f64,
    pub levels: ClusteredLevels,
    pub suggestion: Suggestion,
}

impl LevelClusterResult {
    /// Renderable placeholder used when the band pipeline produced nothing
    pub fn insufficient_data(current_price: f64) -> Self {
        Self {
            current_price,
            levels: ClusteredLevels::default(),
            suggestion: Suggestion::insufficient_data(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_thresholds() {
        assert_eq!(LevelStrength::from_member_count(1), LevelStrength::Weak);
        assert_eq!(LevelStrength::from_member_count(2), LevelStrength::Medium);
        assert_eq!(LevelStrength::from_member_count(3), LevelStrength::Strong);
        assert_eq!(LevelStrength::from_member_count(9), LevelStrength::Strong);
    }

    #[test]
    fn test_insufficient_data_is_hold() {
        let result = LevelClusterResult::insufficient_data(42.0);
        assert_eq!(result.suggestion.action, SuggestedAction::Hold);
        assert!(result.suggestion.risk_reward_ratio.is_none());
        assert!(result.levels.resistance.is_empty());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["suggestion"]["action"], "HOLD");
        assert_eq!(json["currentPrice"], 42.0);
    }
}
