// Swing → cycle → Fibonacci pipeline
pub mod cycle_identifier;
pub mod fibonacci;
pub mod swing_points;

use crate::domain::market::candle::Candle;
use crate::domain::signals::cycles::CycleAnalysis;
use swing_points::{SwingConfig, SwingPointFinder};
use tracing::debug;

/// Runs swing detection, cycle pairing and Fibonacci projection over one
/// candle series.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleAnalyzer {
    finder: SwingPointFinder,
}

impl CycleAnalyzer {
    pub fn new(config: SwingConfig) -> Self {
        Self {
            finder: SwingPointFinder::new(config),
        }
    }

    /// Analyze `candles` with the last close as the reference price
    pub fn analyze(&self, candles: &[Candle]) -> CycleAnalysis {
        self.analyze_at(candles, None)
    }

    /// Analyze `candles`; context is computed against `reference_price` when
    /// given, else against the last close. An empty series yields the empty
    /// analysis.
    pub fn analyze_at(&self, candles: &[Candle], reference_price: Option<f64>) -> CycleAnalysis {
        let current_price = reference_price.or_else(|| candles.last().map(Candle::close_f64));

        let swings = self.finder.find(candles);
        let cycles = cycle_identifier::identify_cycles(&swings);
        let projections: Vec<_> = cycles.iter().map(fibonacci::project).collect();
        let context = match current_price {
            Some(price) => projections
                .iter()
                .map(|p| fibonacci::context(p, price))
                .collect(),
            None => Vec::new(),
        };

        debug!(
            "CycleAnalyzer: {} candles -> {} swings -> {} cycles",
            candles.len(),
            swings.len(),
            projections.len()
        );

        CycleAnalysis {
            current_price,
            cycles: projections,
            context,
        }
    }
}
