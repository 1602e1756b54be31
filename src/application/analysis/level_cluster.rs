use crate::domain::errors::AnalysisError;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::signals::bands::{BandMap, BandType};
use crate::domain::signals::levels::{
    ClusteredLevels, Level, LevelClusterResult, LevelStrength, SuggestedAction, Suggestion,
};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterConfig {
    /// Maximum distance from a cluster's anchor, as a fraction of the current price
    pub threshold_pct: f64,
    /// Risk/reward at or above which a LONG is suggested
    pub long_min_risk_reward: f64,
    /// Risk/reward at or below which a SHORT is suggested
    pub short_max_risk_reward: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            threshold_pct: 0.001,
            long_min_risk_reward: 2.0,
            short_max_risk_reward: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct BandPoint {
    price: f64,
    timeframe: Timeframe,
    band_type: BandType,
}

/// Groups band values from all timeframes into support/resistance zones.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelClusterAnalyzer {
    config: ClusterConfig,
}

impl LevelClusterAnalyzer {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Analyze using the base timeframe's close as the current price
    pub fn analyze_from_base(
        &self,
        bands: &BandMap,
        base: Timeframe,
    ) -> Result<LevelClusterResult, AnalysisError> {
        let current_price = bands
            .get(&base)
            .map(|set| set.current_price)
            .ok_or_else(|| AnalysisError::missing(format!("no {} bands for current price", base)))?;
        Ok(self.analyze(bands, current_price))
    }

    pub fn analyze(&self, bands: &BandMap, current_price: f64) -> LevelClusterResult {
        let clusters = self.cluster(bands, current_price);
        let levels = split_around(clusters, current_price);
        let suggestion = self.suggest(&levels, current_price);

        debug!(
            "LevelClusterAnalyzer: {} resistance / {} support clusters at {:.2} -> {:?}",
            levels.resistance.len(),
            levels.support.len(),
            current_price,
            suggestion.action
        );

        LevelClusterResult {
            current_price,
            levels,
            suggestion,
        }
    }

    /// All clusters in ascending price order. Each band value belongs to
    /// exactly one cluster.
    pub fn cluster(&self, bands: &BandMap, current_price: f64) -> Vec<Level> {
        let mut points: Vec<BandPoint> = bands
            .values()
            .flat_map(|set| {
                set.levels()
                    .into_iter()
                    .map(move |(band_type, price)| BandPoint {
                        price,
                        timeframe: set.timeframe,
                        band_type,
                    })
            })
            .collect();
        points.sort_by(|a, b| a.price.total_cmp(&b.price));

        let threshold = current_price * self.config.threshold_pct;
        let mut clusters = Vec::new();
        let mut members: Vec<BandPoint> = Vec::new();

        for point in points {
            // Distance is measured from the anchor (first member), not a running mean
            match members.first() {
                Some(anchor) if (point.price - anchor.price).abs() <= threshold => {
                    members.push(point);
                }
                Some(_) => {
                    clusters.push(build_level(&members));
                    members = vec![point];
                }
                None => members.push(point),
            }
        }
        if !members.is_empty() {
            clusters.push(build_level(&members));
        }

        clusters
    }

    pub fn suggest(&self, levels: &ClusteredLevels, current_price: f64) -> Suggestion {
        let (Some(resistance), Some(support)) = (levels.resistance.first(), levels.support.first())
        else {
            return Suggestion::insufficient_data();
        };

        let mut suggestion = Suggestion {
            action: SuggestedAction::Hold,
            reason: String::new(),
            risk_reward_ratio: None,
            next_resistance: Some(resistance.price),
            next_support: Some(support.price),
            resistance_strength: Some(resistance.strength),
            support_strength: Some(support.strength),
        };

        let distance_to_resistance = resistance.price - current_price;
        let distance_to_support = current_price - support.price;
        if distance_to_support <= 0.0 {
            suggestion.reason = format!(
                "Support at {:.2} coincides with the current price, risk/reward undefined",
                support.price
            );
            return suggestion;
        }

        let risk_reward = distance_to_resistance / distance_to_support;
        suggestion.risk_reward_ratio = Some(risk_reward);

        if risk_reward >= self.config.long_min_risk_reward
            && support.strength != LevelStrength::Weak
        {
            suggestion.action = SuggestedAction::Long;
            suggestion.reason = format!(
                "Favorable risk/reward ratio ({:.2}) with {} support",
                risk_reward, support.strength
            );
        } else if risk_reward <= self.config.short_max_risk_reward
            && resistance.strength != LevelStrength::Weak
        {
            suggestion.action = SuggestedAction::Short;
            suggestion.reason = format!(
                "Unfavorable risk/reward ratio ({:.2}) with {} resistance",
                risk_reward, resistance.strength
            );
        } else {
            suggestion.reason = "Risk/reward ratio not favorable for trading".to_string();
        }

        suggestion
    }
}

fn build_level(members: &[BandPoint]) -> Level {
    let count = members.len();
    let price = members.iter().map(|m| m.price).sum::<f64>() / count as f64;

    Level {
        price,
        strength: LevelStrength::from_member_count(count),
        member_count: count,
        timeframes: members.iter().map(|m| m.timeframe).collect::<BTreeSet<_>>(),
        band_types: members.iter().map(|m| m.band_type).collect::<BTreeSet<_>>(),
    }
}

/// Resistance above the price ascending, support at or below it descending
fn split_around(clusters: Vec<Level>, current_price: f64) -> ClusteredLevels {
    let (mut resistance, mut support): (Vec<Level>, Vec<Level>) = clusters
        .into_iter()
        .partition(|level| level.price > current_price);

    resistance.sort_by(|a, b| a.price.total_cmp(&b.price));
    support.sort_by(|a, b| b.price.total_cmp(&a.price));

    ClusteredLevels {
        resistance,
        support,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signals::bands::BandSet;

    fn set(tf: Timeframe, lower: f64, middle: f64, upper: f64, price: f64) -> BandSet {
        BandSet::new(tf, Some(middle), Some(upper), Some(lower), price, 0)
    }

    fn map(sets: Vec<BandSet>) -> BandMap {
        sets.into_iter().map(|s| (s.timeframe, s)).collect()
    }

    #[test]
    fn test_two_close_levels_form_medium_cluster() {
        let bands = map(vec![BandSet::new(
            Timeframe::FifteenMin,
            None,
            Some(100.08),
            Some(100.05),
            100.0,
            0,
        )]);

        let clusters = LevelClusterAnalyzer::default().cluster(&bands, 100.0);

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].member_count, 2);
        assert_eq!(clusters[0].strength, LevelStrength::Medium);
        assert!((clusters[0].price - 100.065).abs() < 1e-9);
        assert_eq!(
            clusters[0].band_types,
            [BandType::Upper, BandType::Lower].into_iter().collect()
        );
    }

    #[test]
    fn test_anchor_prevents_drift() {
        // threshold 0.1 at price 100; 100.00, 100.08, 100.16 would chain with a running mean
        let bands = map(vec![
            set(Timeframe::FifteenMin, 100.00, 100.08, 100.16, 100.0),
        ]);

        let clusters = LevelClusterAnalyzer::default().cluster(&bands, 100.0);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].member_count, 2);
        assert_eq!(clusters[1].member_count, 1);
        assert_eq!(clusters[1].strength, LevelStrength::Weak);
    }

    #[test]
    fn test_clusters_partition_all_band_values() {
        let bands = map(vec![
            set(Timeframe::FifteenMin, 97.0, 100.0, 103.0, 100.0),
            set(Timeframe::OneHour, 96.98, 100.02, 104.0, 100.0),
            set(Timeframe::FourHour, 90.0, 99.95, 110.0, 100.0),
            set(Timeframe::OneDay, 80.0, 101.0, 120.0, 100.0),
        ]);

        let clusters = LevelClusterAnalyzer::default().cluster(&bands, 100.0);
        let total: usize = clusters.iter().map(|c| c.member_count).sum();

        assert_eq!(total, 12);
        for pair in clusters.windows(2) {
            assert!(pair[0].price < pair[1].price);
        }
    }

    #[test]
    fn test_resistance_ascending_support_descending() {
        let bands = map(vec![
            set(Timeframe::FifteenMin, 95.0, 100.5, 105.0, 100.0),
            set(Timeframe::OneHour, 90.0, 99.0, 110.0, 100.0),
        ]);

        let result = LevelClusterAnalyzer::default().analyze(&bands, 100.0);

        let r: Vec<f64> = result.levels.resistance.iter().map(|l| l.price).collect();
        let s: Vec<f64> = result.levels.support.iter().map(|l| l.price).collect();
        assert_eq!(r, vec![100.5, 105.0, 110.0]);
        assert_eq!(s, vec![99.0, 95.0, 90.0]);
    }

    #[test]
    fn test_long_suggestion() {
        // Strong support cluster at ~99.01, nearest resistance 102.5: rr = 2.5 / 0.99
        let bands = map(vec![
            set(Timeframe::FifteenMin, 99.0, 102.5, 104.0, 100.0),
            set(Timeframe::OneHour, 99.01, 103.0, 130.0, 100.0),
            set(Timeframe::FourHour, 99.02, 120.0, 140.0, 100.0),
        ]);

        let result = LevelClusterAnalyzer::default().analyze(&bands, 100.0);
        let suggestion = &result.suggestion;

        assert_eq!(suggestion.support_strength, Some(LevelStrength::Strong));
        assert_eq!(suggestion.action, SuggestedAction::Long);
        assert!((suggestion.risk_reward_ratio.unwrap() - 2.5 / 0.99).abs() < 1e-6);
        assert!(suggestion.reason.contains("strong support"));
    }

    #[test]
    fn test_weak_support_blocks_long() {
        // Medium resistance at ~100.405, weak support at 99.99: rr = 40.5
        let bands = map(vec![
            set(Timeframe::FifteenMin, 98.0, 99.99, 100.4, 100.0),
            set(Timeframe::OneHour, 60.0, 80.0, 100.41, 100.0),
        ]);

        let result = LevelClusterAnalyzer::default().analyze(&bands, 100.0);

        assert_eq!(result.levels.resistance[0].strength, LevelStrength::Medium);
        assert_eq!(result.suggestion.action, SuggestedAction::Hold);
        assert_eq!(
            result.suggestion.reason,
            "Risk/reward ratio not favorable for trading"
        );
    }

    #[test]
    fn test_short_suggestion() {
        // Medium resistance at ~100.405, support at 98: rr = 0.405 / 2
        let bands = map(vec![
            set(Timeframe::FifteenMin, 98.0, 90.0, 100.4, 100.0),
            set(Timeframe::OneHour, 60.0, 80.0, 100.41, 100.0),
        ]);

        let result = LevelClusterAnalyzer::default().analyze(&bands, 100.0);

        assert_eq!(result.suggestion.action, SuggestedAction::Short);
        assert!(result.suggestion.risk_reward_ratio.unwrap() <= 0.5);
        assert!(result.suggestion.reason.contains("medium resistance"));
    }

    #[test]
    fn test_missing_side_is_hold_insufficient() {
        let bands = map(vec![set(Timeframe::FifteenMin, 101.0, 102.0, 103.0, 100.0)]);

        let result = LevelClusterAnalyzer::default().analyze(&bands, 100.0);

        assert!(result.levels.support.is_empty());
        assert_eq!(result.suggestion.action, SuggestedAction::Hold);
        assert!(result.suggestion.risk_reward_ratio.is_none());
        assert!(result.suggestion.reason.contains("Insufficient data"));
    }

    #[test]
    fn test_support_at_price_has_undefined_ratio() {
        let bands = map(vec![set(Timeframe::FifteenMin, 90.0, 100.0, 110.0, 100.0)]);

        let result = LevelClusterAnalyzer::default().analyze(&bands, 100.0);

        assert_eq!(result.levels.support[0].price, 100.0);
        assert_eq!(result.suggestion.action, SuggestedAction::Hold);
        assert!(result.suggestion.risk_reward_ratio.is_none());
        assert_eq!(result.suggestion.next_support, Some(100.0));
    }

    #[test]
    fn test_analyze_from_base_requires_base_bands() {
        let bands = map(vec![set(Timeframe::OneHour, 90.0, 100.0, 110.0, 100.0)]);
        let analyzer = LevelClusterAnalyzer::default();

        assert!(matches!(
            analyzer.analyze_from_base(&bands, Timeframe::FifteenMin),
            Err(AnalysisError::MissingMarketData { .. })
        ));
        let result = analyzer
            .analyze_from_base(&bands, Timeframe::OneHour)
            .unwrap();
        assert_eq!(result.current_price, 100.0);
    }
}
