use thiserror::Error;

/// Failures of the analysis pipelines.
///
/// `InsufficientHistory` and `DegenerateInput` are normally recovered locally
/// (the affected timeframe or cycle is omitted); `MissingMarketData` maps to
/// the documented HOLD default; `UpstreamFetchFailure` and `TaskFailed` are
/// surfaced unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Insufficient history for {what}: need {required}, have {available}")]
    InsufficientHistory {
        what: String,
        required: usize,
        available: usize,
    },

    #[error("Missing market data: {reason}")]
    MissingMarketData { reason: String },

    #[error("Upstream fetch from {source_name} failed: {reason}")]
    UpstreamFetchFailure { source_name: String, reason: String },

    #[error("Degenerate input: {reason}")]
    DegenerateInput { reason: String },

    /// A blocking computation panicked or was cancelled
    #[error("Analysis task for {task} failed: {reason}")]
    TaskFailed { task: String, reason: String },
}

impl AnalysisError {
    pub fn upstream(source_name: impl Into<String>, err: &anyhow::Error) -> Self {
        AnalysisError::UpstreamFetchFailure {
            source_name: source_name.into(),
            reason: format!("{:#}", err),
        }
    }

    pub fn missing(reason: impl Into<String>) -> Self {
        AnalysisError::MissingMarketData {
            reason: reason.into(),
        }
    }
}
