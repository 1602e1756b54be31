use crate::application::analysis::level_cluster::LevelClusterAnalyzer;
use crate::application::analysis::order_flow::OrderFlowAnalyzer;
use crate::application::cycles::CycleAnalyzer;
use crate::application::indicators::bollinger::BandCalculator;
use crate::config::{AnalysisEnvConfig, Config};
use crate::domain::context::AnalysisRequest;
use crate::domain::errors::AnalysisError;
use crate::domain::market::candle::Candle;
use crate::domain::market::order_book::{MarketSnapshot, OrderBook, RecentTrades, Trade};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::{CandleSource, OrderBookSource, TradeSource};
use crate::domain::signals::bands::{BandMap, ReferenceBands, band_reference_levels};
use crate::domain::signals::cycles::CycleAnalysis;
use crate::domain::signals::levels::LevelClusterResult;
use crate::domain::signals::order_flow::OrderFlowAnalysis;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything the renderer needs for one symbol. Failed pipelines are
/// replaced by their default result and listed in `errors`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalReport {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    /// Last close of the base timeframe
    pub current_price: Option<f64>,
    pub bands: BandMap,
    /// Outermost raw bands above and below the current price
    pub band_references: ReferenceBands,
    pub level_clusters: LevelClusterResult,
    pub order_flow: OrderFlowAnalysis,
    pub cycles: CycleAnalysis,
    pub errors: Vec<String>,
}

/// Base candles plus the bands derived from them
struct BandSnapshot {
    bands: BandMap,
    current_price: f64,
}

/// Async façade over the analyzers. Holds no per-symbol state; every
/// operation fetches what it needs for the given request.
pub struct MarketStructureEngine {
    candles: Arc<dyn CandleSource>,
    order_books: Arc<dyn OrderBookSource>,
    trades: Arc<dyn TradeSource>,
    analysis: AnalysisEnvConfig,
    depth_limit: usize,
    trades_limit: usize,
    band_calculator: BandCalculator,
    level_analyzer: LevelClusterAnalyzer,
    order_flow_analyzer: OrderFlowAnalyzer,
    cycle_analyzer: CycleAnalyzer,
}

impl MarketStructureEngine {
    pub fn new(
        candles: Arc<dyn CandleSource>,
        order_books: Arc<dyn OrderBookSource>,
        trades: Arc<dyn TradeSource>,
        config: &Config,
    ) -> Self {
        let analysis = config.analysis.clone();
        Self {
            candles,
            order_books,
            trades,
            depth_limit: config.exchange.order_book_depth_limit,
            trades_limit: config.exchange.recent_trades_limit,
            band_calculator: BandCalculator::new(analysis.bands, analysis.base_timeframe),
            level_analyzer: LevelClusterAnalyzer::new(analysis.cluster),
            order_flow_analyzer: OrderFlowAnalyzer::new(analysis.order_flow),
            cycle_analyzer: CycleAnalyzer::new(analysis.swing),
            analysis,
        }
    }

    /// Engine whose three sources are the same service
    pub fn with_source<S>(source: Arc<S>, config: &Config) -> Self
    where
        S: CandleSource + OrderBookSource + TradeSource + 'static,
    {
        Self::new(source.clone(), source.clone(), source, config)
    }

    /// Latest bands for every configured timeframe with enough history
    pub async fn bands(&self, request: &AnalysisRequest) -> Result<BandMap, AnalysisError> {
        Ok(self.band_snapshot(&request.symbol).await?.bands)
    }

    pub async fn level_clusters(
        &self,
        request: &AnalysisRequest,
    ) -> Result<LevelClusterResult, AnalysisError> {
        let snapshot = self.band_snapshot(&request.symbol).await?;
        self.level_analyzer
            .analyze_from_base(&snapshot.bands, self.analysis.base_timeframe)
    }

    pub async fn order_flow(
        &self,
        request: &AnalysisRequest,
    ) -> Result<OrderFlowAnalysis, AnalysisError> {
        let symbol = request.symbol.as_str();
        let (snapshot, book, trades) = tokio::join!(
            self.band_snapshot(symbol),
            self.fetch_depth(symbol),
            self.fetch_trades(symbol),
        );
        Ok(self.analyze_order_flow(&snapshot?, book?, trades?))
    }

    pub async fn cycles(&self, request: &AnalysisRequest) -> Result<CycleAnalysis, AnalysisError> {
        let candles = self
            .fetch_candles(&request.symbol, self.analysis.cycle_timeframe)
            .await?;
        Ok(self
            .cycle_analyzer
            .analyze_at(&candles, request.reference_price))
    }

    /// Run every pipeline concurrently. Never fails: each failed pipeline
    /// contributes its default result and an entry in `errors`.
    pub async fn report(&self, request: &AnalysisRequest) -> SignalReport {
        let symbol = request.symbol.as_str();
        info!("MarketStructureEngine: Building report for {}", symbol);

        let (snapshot, cycle_candles, book, trades) = tokio::join!(
            self.band_snapshot(symbol),
            self.fetch_candles(symbol, self.analysis.cycle_timeframe),
            self.fetch_depth(symbol),
            self.fetch_trades(symbol),
        );

        let mut errors = Vec::new();
        let mut record = |pipeline: &str, err: AnalysisError| {
            warn!(
                "MarketStructureEngine: {} for {} replaced by default: {}",
                pipeline, symbol, err
            );
            errors.push(format!("{}: {}", pipeline, err));
        };

        let cycles = match cycle_candles {
            Ok(candles) => self
                .cycle_analyzer
                .analyze_at(&candles, request.reference_price),
            Err(e) => {
                record("cycles", e);
                CycleAnalysis::default()
            }
        };

        let flow_inputs = match (book, trades) {
            (Ok(book), Ok(trades)) => Some((book, trades)),
            (Err(e), _) | (_, Err(e)) => {
                record("order flow", e);
                None
            }
        };

        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(e) => {
                record("bands", e);
                return SignalReport {
                    symbol: symbol.to_string(),
                    generated_at: Utc::now(),
                    current_price: None,
                    bands: BandMap::new(),
                    band_references: ReferenceBands::default(),
                    level_clusters: LevelClusterResult::insufficient_data(0.0),
                    order_flow: OrderFlowAnalysis::insufficient_data(),
                    cycles,
                    errors,
                };
            }
        };

        let level_clusters = self
            .level_analyzer
            .analyze_from_base(&snapshot.bands, self.analysis.base_timeframe)
            .unwrap_or_else(|e| {
                record("level clusters", e);
                LevelClusterResult::insufficient_data(snapshot.current_price)
            });

        let order_flow = match flow_inputs {
            Some((book, trades)) => self.analyze_order_flow(&snapshot, book, trades),
            None => OrderFlowAnalysis::insufficient_data(),
        };

        let band_references = band_reference_levels(&snapshot.bands, snapshot.current_price);

        info!(
            "MarketStructureEngine: {} report: {} band sets, levels {:?}, flow {:?}, {} cycles",
            symbol,
            snapshot.bands.len(),
            level_clusters.suggestion.action,
            order_flow.recommendation.action,
            cycles.cycles.len()
        );

        SignalReport {
            symbol: symbol.to_string(),
            generated_at: Utc::now(),
            current_price: Some(snapshot.current_price),
            bands: snapshot.bands,
            band_references,
            level_clusters,
            order_flow,
            cycles,
            errors,
        }
    }

    fn analyze_order_flow(
        &self,
        snapshot: &BandSnapshot,
        book: OrderBook,
        trades: Vec<Trade>,
    ) -> OrderFlowAnalysis {
        let market = MarketSnapshot::new(
            snapshot.current_price,
            book,
            RecentTrades::from_trades(trades),
        );
        let range = snapshot.bands.get(&self.analysis.order_flow_range_timeframe);
        self.order_flow_analyzer.analyze(&market, range)
    }

    async fn band_snapshot(&self, symbol: &str) -> Result<BandSnapshot, AnalysisError> {
        let base = self.analysis.base_timeframe;
        let candles = self.fetch_candles(symbol, base).await?;
        let current_price = candles
            .last()
            .map(Candle::close_f64)
            .ok_or_else(|| AnalysisError::missing(format!("no {} candles for {}", base, symbol)))?;

        // The rayon fan-out runs on the blocking pool, off the async workers
        let calculator = self.band_calculator;
        let timeframes = self.analysis.band_timeframes.clone();
        let candle_count = candles.len();
        let bands =
            tokio::task::spawn_blocking(move || calculator.multi_timeframe(&candles, &timeframes))
                .await
                .map_err(|e| AnalysisError::TaskFailed {
                    task: format!("{} bands", symbol),
                    reason: e.to_string(),
                })?;
        debug!(
            "MarketStructureEngine: {} bands for {} of {} timeframes from {} base candles",
            symbol,
            bands.len(),
            self.analysis.band_timeframes.len(),
            candle_count
        );

        Ok(BandSnapshot {
            bands,
            current_price,
        })
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Timeframe,
    ) -> Result<Vec<Candle>, AnalysisError> {
        self.candles
            .get_candles(symbol, interval)
            .await
            .map_err(|e| AnalysisError::upstream(format!("{} klines", interval), &e))
    }

    async fn fetch_depth(&self, symbol: &str) -> Result<OrderBook, AnalysisError> {
        self.order_books
            .get_depth(symbol, self.depth_limit)
            .await
            .map_err(|e| AnalysisError::upstream("order book", &e))
    }

    async fn fetch_trades(&self, symbol: &str) -> Result<Vec<Trade>, AnalysisError> {
        self.trades
            .get_recent_trades(symbol, self.trades_limit)
            .await
            .map_err(|e| AnalysisError::upstream("recent trades", &e))
    }
}
