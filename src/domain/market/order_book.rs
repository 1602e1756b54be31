use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A single price level of order-book depth. The side is implied by the
/// list (bids or asks) the entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBookEntry {
    pub price: Decimal,
    pub volume: Decimal,
}

impl OrderBookEntry {
    pub fn new(price: Decimal, volume: Decimal) -> Self {
        Self { price, volume }
    }
}

/// Point-in-time order-book depth snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub bids: Vec<OrderBookEntry>,
    pub asks: Vec<OrderBookEntry>,
}

/// Aggressor side of an executed trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TakerSide {
    Buy,
    Sell,
}

impl TakerSide {
    /// On Binance `isBuyerMaker = true` means the seller was the aggressor
    pub fn from_buyer_maker(is_buyer_maker: bool) -> Self {
        if is_buyer_maker {
            TakerSide::Sell
        } else {
            TakerSide::Buy
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub price: Decimal,
    pub quantity: Decimal,
    pub taker_side: TakerSide,
}

/// Recent trades split by taker side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentTrades {
    pub buys: Vec<Trade>,
    pub sells: Vec<Trade>,
}

impl RecentTrades {
    pub fn from_trades(trades: impl IntoIterator<Item = Trade>) -> Self {
        let (buys, sells) = trades
            .into_iter()
            .partition(|t| t.taker_side == TakerSide::Buy);
        Self { buys, sells }
    }

    pub fn total_buy_volume(&self) -> f64 {
        self.buys.iter().map(|t| t.quantity.to_f64().unwrap_or(0.0)).sum()
    }

    pub fn total_sell_volume(&self) -> f64 {
        self.sells.iter().map(|t| t.quantity.to_f64().unwrap_or(0.0)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buys.is_empty() && self.sells.is_empty()
    }
}

/// Aggregate figures over the whole snapshot, independent of any band range
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookSummary {
    pub total_bid_volume: f64,
    pub total_ask_volume: f64,
    pub bid_levels: usize,
    pub ask_levels: usize,
    pub total_buy_volume: f64,
    pub total_sell_volume: f64,
}

/// Everything the order-flow analysis needs from the exchange for one symbol
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    pub current_price: f64,
    pub order_book: OrderBook,
    pub recent_trades: RecentTrades,
}

impl MarketSnapshot {
    pub fn new(current_price: f64, order_book: OrderBook, recent_trades: RecentTrades) -> Self {
        Self {
            current_price,
            order_book,
            recent_trades,
        }
    }

    pub fn summary(&self) -> OrderBookSummary {
        let volume = |entries: &[OrderBookEntry]| -> f64 {
            entries.iter().map(|e| e.volume.to_f64().unwrap_or(0.0)).sum()
        };

        OrderBookSummary {
            total_bid_volume: volume(&self.order_book.bids),
            total_ask_volume: volume(&self.order_book.asks),
            bid_levels: self.order_book.bids.len(),
            ask_levels: self.order_book.asks.len(),
            total_buy_volume: self.recent_trades.total_buy_volume(),
            total_sell_volume: self.recent_trades.total_sell_volume(),
        }
    }

    /// Share of taker-buy volume in recent trades, 0.5 when there were none
    pub fn buy_pressure(&self) -> f64 {
        let buy = self.recent_trades.total_buy_volume();
        let sell = self.recent_trades.total_sell_volume();
        let total = buy + sell;
        if total > 0.0 { buy / total } else { 0.5 }
    }
}
