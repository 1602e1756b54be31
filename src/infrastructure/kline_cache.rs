use crate::domain::market::candle::Candle;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::CandleSource;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

type CacheKey = (String, Timeframe);

struct CachedCandles {
    candles: Vec<Candle>,
    fetched_at: Instant,
}

type Slot = Arc<AsyncMutex<Option<CachedCandles>>>;

/// Time-bounded candle cache in front of any [`CandleSource`].
///
/// Each `(symbol, interval)` key has its own async mutex held across the
/// upstream fetch, so concurrent callers for the same key share one request
/// while different keys proceed in parallel. Failed fetches leave the
/// previous entry untouched and are returned to the caller.
pub struct KlineCache<S> {
    inner: S,
    ttl: Duration,
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl<S: CandleSource> KlineCache<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, symbol: &str, interval: Timeframe) -> Result<Slot> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|e| anyhow!("kline cache lock poisoned: {}", e))?;
        Ok(slots
            .entry((symbol.to_string(), interval))
            .or_default()
            .clone())
    }
}

#[async_trait]
impl<S: CandleSource> CandleSource for KlineCache<S> {
    async fn get_candles(&self, symbol: &str, interval: Timeframe) -> Result<Vec<Candle>> {
        let slot = self.slot(symbol, interval)?;
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref()
            && cached.fetched_at.elapsed() < self.ttl
        {
            debug!("KlineCache: Hit for {} {}", symbol, interval);
            return Ok(cached.candles.clone());
        }

        debug!("KlineCache: Refreshing {} {}", symbol, interval);
        let candles = self.inner.get_candles(symbol, interval).await?;
        *entry = Some(CachedCandles {
            candles: candles.clone(),
            fetched_at: Instant::now(),
        });
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::MockMarketDataService;
    use rust_decimal_macros::dec;
    use tokio_test::{assert_err, assert_ok};

    fn candle(open_time: i64) -> Candle {
        Candle {
            open_time,
            close_time: open_time + 899_999,
            open: dec!(1),
            high: dec!(2),
            low: dec!(0.5),
            close: dec!(1.5),
            volume: dec!(10),
            quote_volume: dec!(15),
            trade_count: 3,
            taker_buy_base_volume: dec!(4),
            taker_buy_quote_volume: dec!(6),
        }
    }

    async fn seeded_mock() -> Arc<MockMarketDataService> {
        let mock = Arc::new(MockMarketDataService::new());
        mock.set_candles("BTCUSDT", Timeframe::FifteenMin, vec![candle(0), candle(900_000)])
            .await;
        mock
    }

    #[tokio::test]
    async fn test_fresh_entry_is_served_from_memory() {
        let mock = seeded_mock().await;
        let cache = KlineCache::new(mock.clone(), Duration::from_secs(60));

        let first = assert_ok!(cache.get_candles("BTCUSDT", Timeframe::FifteenMin).await);
        let second = assert_ok!(cache.get_candles("BTCUSDT", Timeframe::FifteenMin).await);

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(mock.candle_fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let mock = seeded_mock().await;
        let cache = KlineCache::new(mock.clone(), Duration::ZERO);

        assert_ok!(cache.get_candles("BTCUSDT", Timeframe::FifteenMin).await);
        assert_ok!(cache.get_candles("BTCUSDT", Timeframe::FifteenMin).await);

        assert_eq!(mock.candle_fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let mock = Arc::new(MockMarketDataService::new().with_fetch_delay(Duration::from_millis(50)));
        mock.set_candles("ETHUSDT", Timeframe::OneHour, vec![candle(0)])
            .await;
        let cache = KlineCache::new(mock.clone(), Duration::from_secs(60));

        let (a, b, c) = tokio::join!(
            cache.get_candles("ETHUSDT", Timeframe::OneHour),
            cache.get_candles("ETHUSDT", Timeframe::OneHour),
            cache.get_candles("ETHUSDT", Timeframe::OneHour),
        );

        assert_ok!(a);
        assert_ok!(b);
        assert_ok!(c);
        assert_eq!(mock.candle_fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let mock = seeded_mock().await;
        let cache = KlineCache::new(mock.clone(), Duration::from_secs(60));

        assert_ok!(cache.get_candles("BTCUSDT", Timeframe::FifteenMin).await);
        assert_ok!(cache.get_candles("BTCUSDT", Timeframe::OneHour).await);
        assert_ok!(cache.get_candles("ETHUSDT", Timeframe::FifteenMin).await);

        assert_eq!(mock.candle_fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_failure_propagates_without_poisoning() {
        let mock = seeded_mock().await;
        let cache = KlineCache::new(mock.clone(), Duration::from_secs(60));

        mock.fail_candles(true);
        assert_err!(cache.get_candles("BTCUSDT", Timeframe::FifteenMin).await);

        mock.fail_candles(false);
        let candles = assert_ok!(cache.get_candles("BTCUSDT", Timeframe::FifteenMin).await);
        assert_eq!(candles.len(), 2);
        assert_eq!(mock.candle_fetch_count(), 2);
    }
}
