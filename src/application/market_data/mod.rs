// Market data processing modules
pub mod timeframe_aggregator;
