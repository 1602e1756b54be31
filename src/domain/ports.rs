use crate::domain::market::candle::Candle;
use crate::domain::market::order_book::{OrderBook, Trade};
use crate::domain::market::timeframe::Timeframe;
use anyhow::Result;
use async_trait::async_trait;

/// Supplies ordered candles for a symbol and interval, refreshed on demand.
/// Implementations must allow at most one in-flight fetch per key.
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn get_candles(&self, symbol: &str, interval: Timeframe) -> Result<Vec<Candle>>;
}

#[async_trait]
pub trait OrderBookSource: Send + Sync {
    async fn get_depth(&self, symbol: &str, limit: usize) -> Result<OrderBook>;
}

#[async_trait]
pub trait TradeSource: Send + Sync {
    /// Most recent trades, taker side already resolved
    async fn get_recent_trades(&self, symbol: &str, limit: usize) -> Result<Vec<Trade>>;
}

#[async_trait]
impl<T: CandleSource + ?Sized> CandleSource for std::sync::Arc<T> {
    async fn get_candles(&self, symbol: &str, interval: Timeframe) -> Result<Vec<Candle>> {
        (**self).get_candles(symbol, interval).await
    }
}
