//! Binance Market Data Service
//!
//! Public REST market data for the analysis pipelines:
//! - Historical candles (klines), paged backwards past the 1000-row limit
//! - Order-book depth snapshots
//! - Recent trades with the taker side resolved

use crate::config::ExchangeEnvConfig;
use crate::domain::market::candle::Candle;
use crate::domain::market::order_book::{OrderBook, OrderBookEntry, TakerSide, Trade};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::{CandleSource, OrderBookSource, TradeSource};
use crate::infrastructure::core::http_client_factory::{
    HttpClientFactory, HttpClientSettings, build_url_with_query,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Maximum rows Binance returns for one klines request
const KLINES_PAGE_LIMIT: usize = 1000;

pub struct BinanceMarketDataService {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
    kline_history_limit: usize,
}

impl BinanceMarketDataService {
    pub fn builder() -> BinanceMarketDataServiceBuilder {
        BinanceMarketDataServiceBuilder::default()
    }

    pub fn from_config(config: &ExchangeEnvConfig) -> Self {
        Self::builder()
            .base_url(config.base_url.clone())
            .api_key(config.api_key.clone())
            .kline_history_limit(config.kline_history_limit)
            .http_settings(HttpClientSettings::from(config))
            .build()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        what: &str,
    ) -> Result<T> {
        let url = build_url_with_query(&format!("{}{}", self.base_url, path), params);

        let mut request = self.client.get(&url);
        if let Some(api_key) = &self.api_key {
            request = request.header("X-MBX-APIKEY", api_key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to fetch {} from Binance", what))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance {} fetch failed ({}): {}", what, status, error_text);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse Binance {} response", what))
    }

    async fn fetch_klines_page(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
        end_time: Option<i64>,
    ) -> Result<Vec<Candle>> {
        let mut params = vec![
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(end_time) = end_time {
            params.push(("endTime", end_time.to_string()));
        }

        let rows: Vec<Value> = self.get_json("/api/v3/klines", &params, "klines").await?;
        let total = rows.len();
        let candles: Vec<Candle> = rows.iter().filter_map(parse_kline).collect();
        if candles.len() < total {
            warn!(
                "BinanceMarketDataService: Dropped {} malformed kline rows for {}",
                total - candles.len(),
                symbol
            );
        }
        Ok(candles)
    }
}

#[derive(Default)]
pub struct BinanceMarketDataServiceBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    kline_history_limit: Option<usize>,
    http_settings: Option<HttpClientSettings>,
}

impl BinanceMarketDataServiceBuilder {
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn kline_history_limit(mut self, limit: usize) -> Self {
        self.kline_history_limit = Some(limit);
        self
    }

    pub fn http_settings(mut self, settings: HttpClientSettings) -> Self {
        self.http_settings = Some(settings);
        self
    }

    pub fn build(self) -> BinanceMarketDataService {
        let defaults = ExchangeEnvConfig::default();
        let settings = self.http_settings.unwrap_or_default();

        BinanceMarketDataService {
            client: HttpClientFactory::create_client(&settings),
            base_url: self.base_url.unwrap_or(defaults.base_url),
            api_key: self.api_key,
            kline_history_limit: self
                .kline_history_limit
                .unwrap_or(defaults.kline_history_limit)
                .max(1),
        }
    }
}

#[async_trait]
impl CandleSource for BinanceMarketDataService {
    /// Up to `kline_history_limit` most recent candles, oldest first
    async fn get_candles(&self, symbol: &str, interval: Timeframe) -> Result<Vec<Candle>> {
        let interval_str = binance_interval(interval)
            .with_context(|| format!("{} is not a native Binance kline interval", interval))?;

        let mut pages: Vec<Vec<Candle>> = Vec::new();
        let mut remaining = self.kline_history_limit;
        let mut end_time: Option<i64> = None;

        while remaining > 0 {
            let page_size = remaining.min(KLINES_PAGE_LIMIT);
            let page = self
                .fetch_klines_page(symbol, interval_str, page_size, end_time)
                .await?;

            let Some(first) = page.first() else {
                break;
            };
            let exhausted = page.len() < page_size;
            end_time = Some(first.open_time - 1);
            remaining = remaining.saturating_sub(page.len());
            pages.push(page);

            if exhausted {
                debug!(
                    "BinanceMarketDataService: {} {} history exhausted",
                    symbol, interval
                );
                break;
            }
        }

        let mut candles: Vec<Candle> = pages.into_iter().rev().flatten().collect();
        candles.dedup_by_key(|c| c.open_time);

        info!(
            "BinanceMarketDataService: Fetched {} {} klines for {}",
            candles.len(),
            interval,
            symbol
        );
        Ok(candles)
    }
}

#[async_trait]
impl OrderBookSource for BinanceMarketDataService {
    async fn get_depth(&self, symbol: &str, limit: usize) -> Result<OrderBook> {
        #[derive(Debug, Deserialize)]
        struct DepthResponse {
            bids: Vec<[String; 2]>,
            asks: Vec<[String; 2]>,
        }

        let params = [("symbol", symbol.to_string()), ("limit", limit.to_string())];
        let depth: DepthResponse = self.get_json("/api/v3/depth", &params, "depth").await?;

        let book = OrderBook {
            bids: parse_depth_side(&depth.bids),
            asks: parse_depth_side(&depth.asks),
        };
        debug!(
            "BinanceMarketDataService: {} depth {} bids / {} asks",
            symbol,
            book.bids.len(),
            book.asks.len()
        );
        Ok(book)
    }
}

#[async_trait]
impl TradeSource for BinanceMarketDataService {
    async fn get_recent_trades(&self, symbol: &str, limit: usize) -> Result<Vec<Trade>> {
        let params = [("symbol", symbol.to_string()), ("limit", limit.to_string())];
        let raw: Vec<RawTrade> = self
            .get_json("/api/v3/trades", &params, "recent trades")
            .await?;

        Ok(raw.iter().filter_map(RawTrade::to_trade).collect())
    }
}

#[derive(Debug, Deserialize)]
struct RawTrade {
    price: String,
    qty: String,
    #[serde(rename = "isBuyerMaker")]
    is_buyer_maker: bool,
}

impl RawTrade {
    fn to_trade(&self) -> Option<Trade> {
        Some(Trade {
            price: Decimal::from_str_exact(&self.price).ok()?,
            quantity: Decimal::from_str_exact(&self.qty).ok()?,
            taker_side: TakerSide::from_buyer_maker(self.is_buyer_maker),
        })
    }
}

/// Binance interval code for timeframes the exchange serves natively
pub fn binance_interval(timeframe: Timeframe) -> Option<&'static str> {
    match timeframe {
        Timeframe::FifteenMin
        | Timeframe::ThirtyMin
        | Timeframe::OneHour
        | Timeframe::TwoHour
        | Timeframe::FourHour
        | Timeframe::EightHour
        | Timeframe::TwelveHour
        | Timeframe::OneDay
        | Timeframe::ThreeDay
        | Timeframe::OneWeek
        | Timeframe::OneMonth => Some(timeframe.as_str()),
        _ => None,
    }
}

/// One klines row: `[openTime, open, high, low, close, volume, closeTime,
/// quoteVolume, trades, takerBuyBase, takerBuyQuote, ignore]`
fn parse_kline(row: &Value) -> Option<Candle> {
    let arr = row.as_array()?;
    if arr.len() < 11 {
        return None;
    }
    let decimal = |i: usize| -> Option<Decimal> { Decimal::from_str_exact(arr[i].as_str()?).ok() };

    Some(Candle {
        open_time: arr[0].as_i64()?,
        open: decimal(1)?,
        high: decimal(2)?,
        low: decimal(3)?,
        close: decimal(4)?,
        volume: decimal(5)?,
        close_time: arr[6].as_i64()?,
        quote_volume: decimal(7)?,
        trade_count: arr[8].as_u64()?,
        taker_buy_base_volume: decimal(9)?,
        taker_buy_quote_volume: decimal(10)?,
    })
}

fn parse_depth_side(levels: &[[String; 2]]) -> Vec<OrderBookEntry> {
    levels
        .iter()
        .filter_map(|[price, qty]| {
            Some(OrderBookEntry::new(
                Decimal::from_str_exact(price).ok()?,
                Decimal::from_str_exact(qty).ok()?,
            ))
        })
        .collect()
}
