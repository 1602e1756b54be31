use serde::{Deserialize, Serialize};

/// Per-request context passed to every engine operation.
///
/// The symbol travels with the request; nothing about the "current" symbol
/// is kept between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub symbol: String,
    /// Overrides the last close as the reference price for cycle context
    pub reference_price: Option<f64>,
}

impl AnalysisRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into().trim().to_uppercase(),
            reference_price: None,
        }
    }

    pub fn with_reference_price(mut self, price: f64) -> Self {
        self.reference_price = Some(price);
        self
    }
}
