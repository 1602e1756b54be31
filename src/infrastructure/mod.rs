pub mod binance;
pub mod core;
pub mod kline_cache;
pub mod mock;

pub use binance::BinanceMarketDataService;
pub use kline_cache::KlineCache;
pub use mock::MockMarketDataService;
