use serde::{Deserialize, Serialize};

/// Retracement ratios projected on every cycle, ascending
pub const FIB_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    #[serde(rename = "type")]
    pub kind: SwingKind,
    pub price: f64,
    /// Open time of the candle that formed the swing (Unix ms)
    pub time: i64,
    /// Relative price excursion that qualified the swing
    pub strength: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleDirection {
    Upward,
    Downward,
}

/// Price excursion between two alternating swing points.
/// `start.kind != end.kind`, and the direction is upward iff it starts on a low.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub start: SwingPoint,
    pub end: SwingPoint,
    #[serde(rename = "type")]
    pub direction: CycleDirection,
    pub strength: f64,
}

impl Cycle {
    /// Returns `None` when both swings are of the same kind
    pub fn between(start: SwingPoint, end: SwingPoint) -> Option<Self> {
        if start.kind == end.kind {
            return None;
        }
        let direction = match start.kind {
            SwingKind::Low => CycleDirection::Upward,
            SwingKind::High => CycleDirection::Downward,
        };
        let high = start.price.max(end.price);
        let low = start.price.min(end.price);
        Some(Self {
            start,
            end,
            direction,
            strength: relative_excursion(high, low),
        })
    }
}

/// `|high - low| / high`, zero when `high` is zero
pub fn relative_excursion(high: f64, low: f64) -> f64 {
    if high == 0.0 {
        return 0.0;
    }
    (high - low).abs() / high
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FibProjection {
    #[serde(rename = "type")]
    pub direction: CycleDirection,
    pub start_time: i64,
    pub end_time: i64,
    pub start_price: f64,
    pub end_price: f64,
    pub strength: f64,
    /// One entry per ratio in [`FIB_RATIOS`], ascending ratio
    pub levels: Vec<FibLevel>,
}

impl FibProjection {
    pub fn level(&self, ratio: f64) -> Option<f64> {
        self.levels
            .iter()
            .find(|l| (l.ratio - ratio).abs() < f64::EPSILON)
            .map(|l| l.price)
    }
}

/// Cycle header repeated in each context entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    #[serde(rename = "type")]
    pub direction: CycleDirection,
    pub start_time: i64,
    pub end_time: i64,
    pub start_price: f64,
    pub end_price: f64,
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleContext {
    pub cycle: CycleSummary,
    pub nearest_resistance: Option<FibLevel>,
    pub nearest_support: Option<FibLevel>,
}

/// Output of the swing → cycle → Fibonacci pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleAnalysis {
    pub current_price: Option<f64>,
    pub cycles: Vec<FibProjection>,
    /// Parallel to `cycles`
    pub context: Vec<CycleContext>,
}
