#![allow(dead_code)]

use marketlens::domain::market::candle::Candle;
use marketlens::domain::market::order_book::{OrderBook, OrderBookEntry, TakerSide, Trade};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

pub fn dec(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap()
}

/// Candle with open and close at `close`, one unit of wick either side
pub fn candle(index: i64, interval_ms: i64, high: f64, low: f64, close: f64) -> Candle {
    let open_time = index * interval_ms;
    Candle {
        open_time,
        close_time: open_time + interval_ms - 1,
        open: dec(close),
        high: dec(high),
        low: dec(low),
        close: dec(close),
        volume: Decimal::ONE,
        quote_volume: dec(close),
        trade_count: 1,
        taker_buy_base_volume: Decimal::ZERO,
        taker_buy_quote_volume: Decimal::ZERO,
    }
}

/// 15m candles closing alternately at 99 and 101
pub fn oscillating_candles(count: i64) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let close = if i % 2 == 0 { 99.0 } else { 101.0 };
            candle(i, 900_000, close + 0.5, close - 0.5, close)
        })
        .collect()
}

pub fn book(bids: &[(f64, f64)], asks: &[(f64, f64)]) -> OrderBook {
    let side = |entries: &[(f64, f64)]| {
        entries
            .iter()
            .map(|&(price, volume)| OrderBookEntry::new(dec(price), dec(volume)))
            .collect()
    };
    OrderBook {
        bids: side(bids),
        asks: side(asks),
    }
}

pub fn trade(price: f64, quantity: f64, taker_side: TakerSide) -> Trade {
    Trade {
        price: dec(price),
        quantity: dec(quantity),
        taker_side,
    }
}
