// Exchange-facing market data
pub mod candle;
pub mod order_book;
pub mod timeframe;
