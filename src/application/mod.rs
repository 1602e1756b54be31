// Candle aggregation across timeframes
pub mod market_data;

// Technical indicators
pub mod indicators;

// Level clustering and order-flow analysis
pub mod analysis;

// Swing, cycle and Fibonacci analysis
pub mod cycles;

// Async façade over the analyzers
pub mod engine;
