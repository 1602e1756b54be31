// Signal objects produced by the analysis pipelines
pub mod bands;
pub mod cycles;
pub mod levels;
pub mod order_flow;
