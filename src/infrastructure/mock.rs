use crate::domain::market::candle::Candle;
use crate::domain::market::order_book::{OrderBook, Trade};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::{CandleSource, OrderBookSource, TradeSource};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory market data for tests and offline runs.
///
/// Unseeded symbols return empty data. Every call bumps a per-source fetch
/// counter, and each source can be switched to fail on demand.
#[derive(Default)]
pub struct MockMarketDataService {
    candles: RwLock<HashMap<(String, Timeframe), Vec<Candle>>>,
    order_books: RwLock<HashMap<String, OrderBook>>,
    trades: RwLock<HashMap<String, Vec<Trade>>>,
    fetch_delay: Option<Duration>,
    fail_candles: AtomicBool,
    fail_depth: AtomicBool,
    fail_trades: AtomicBool,
    candle_fetches: AtomicUsize,
    depth_fetches: AtomicUsize,
    trade_fetches: AtomicUsize,
}

impl MockMarketDataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every candle fetch
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub async fn set_candles(&self, symbol: &str, interval: Timeframe, candles: Vec<Candle>) {
        self.candles
            .write()
            .await
            .insert((symbol.to_string(), interval), candles);
    }

    pub async fn set_order_book(&self, symbol: &str, book: OrderBook) {
        self.order_books
            .write()
            .await
            .insert(symbol.to_string(), book);
    }

    pub async fn set_trades(&self, symbol: &str, trades: Vec<Trade>) {
        self.trades.write().await.insert(symbol.to_string(), trades);
    }

    pub fn fail_candles(&self, fail: bool) {
        self.fail_candles.store(fail, Ordering::SeqCst);
    }

    pub fn fail_depth(&self, fail: bool) {
        self.fail_depth.store(fail, Ordering::SeqCst);
    }

    pub fn fail_trades(&self, fail: bool) {
        self.fail_trades.store(fail, Ordering::SeqCst);
    }

    pub fn candle_fetch_count(&self) -> usize {
        self.candle_fetches.load(Ordering::SeqCst)
    }

    pub fn depth_fetch_count(&self) -> usize {
        self.depth_fetches.load(Ordering::SeqCst)
    }

    pub fn trade_fetch_count(&self) -> usize {
        self.trade_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CandleSource for MockMarketDataService {
    async fn get_candles(&self, symbol: &str, interval: Timeframe) -> Result<Vec<Candle>> {
        self.candle_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_candles.load(Ordering::SeqCst) {
            anyhow::bail!("Mock klines fetch failed for {} {}", symbol, interval);
        }

        let candles = self
            .candles
            .read()
            .await
            .get(&(symbol.to_string(), interval))
            .cloned()
            .unwrap_or_default();
        debug!(
            "MockMarketDataService: Serving {} {} candles for {}",
            candles.len(),
            interval,
            symbol
        );
        Ok(candles)
    }
}

#[async_trait]
impl OrderBookSource for MockMarketDataService {
    async fn get_depth(&self, symbol: &str, limit: usize) -> Result<OrderBook> {
        self.depth_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_depth.load(Ordering::SeqCst) {
            anyhow::bail!("Mock depth fetch failed for {}", symbol);
        }

        let mut book = self
            .order_books
            .read()
            .await
            .get(symbol)
            .cloned()
            .unwrap_or_default();
        book.bids.truncate(limit);
        book.asks.truncate(limit);
        Ok(book)
    }
}

#[async_trait]
impl TradeSource for MockMarketDataService {
    async fn get_recent_trades(&self, symbol: &str, limit: usize) -> Result<Vec<Trade>> {
        self.trade_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_trades.load(Ordering::SeqCst) {
            anyhow::bail!("Mock trades fetch failed for {}", symbol);
        }

        let trades = self
            .trades
            .read()
            .await
            .get(symbol)
            .cloned()
            .unwrap_or_default();
        // Most recent trades are at the end
        let skip = trades.len().saturating_sub(limit);
        Ok(trades.into_iter().skip(skip).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::order_book::{OrderBookEntry, TakerSide};
    use rust_decimal_macros::dec;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_unseeded_symbol_is_empty() {
        let mock = MockMarketDataService::new();
        let candles = assert_ok!(mock.get_candles("NOPE", Timeframe::OneDay).await);
        assert!(candles.is_empty());
        assert_eq!(mock.candle_fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_limits_are_applied() {
        let mock = MockMarketDataService::new();
        mock.set_order_book(
            "BTCUSDT",
            OrderBook {
                bids: vec![
                    OrderBookEntry::new(dec!(99), dec!(1)),
                    OrderBookEntry::new(dec!(98), dec!(1)),
                ],
                asks: vec![OrderBookEntry::new(dec!(101), dec!(1))],
            },
        )
        .await;
        let trades: Vec<Trade> = (1..=5)
            .map(|i| Trade {
                price: dec!(100),
                quantity: rust_decimal::Decimal::from(i),
                taker_side: TakerSide::Buy,
            })
            .collect();
        mock.set_trades("BTCUSDT", trades).await;

        let book = assert_ok!(mock.get_depth("BTCUSDT", 1).await);
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.asks.len(), 1);

        let recent = assert_ok!(mock.get_recent_trades("BTCUSDT", 2).await);
        let quantities: Vec<_> = recent.iter().map(|t| t.quantity).collect();
        assert_eq!(quantities, vec![dec!(4), dec!(5)]);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let mock = MockMarketDataService::new();
        mock.fail_depth(true);
        mock.fail_trades(true);

        assert_err!(mock.get_depth("BTCUSDT", 10).await);
        assert_err!(mock.get_recent_trades("BTCUSDT", 10).await);
        assert_eq!(mock.depth_fetch_count(), 1);
        assert_eq!(mock.trade_fetch_count(), 1);
    }
}
