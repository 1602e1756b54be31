use crate::domain::market::timeframe::Timeframe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which line of a Bollinger band a price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandType {
    Upper,
    Middle,
    Lower,
}

/// Where the current price sits relative to a band triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandPosition {
    #[serde(rename = "Above Upper")]
    AboveUpper,
    #[serde(rename = "Below Lower")]
    BelowLower,
    #[serde(rename = "Above Middle")]
    AboveMiddle,
    #[serde(rename = "Below Middle")]
    BelowMiddle,
    #[serde(rename = "At Middle")]
    AtMiddle,
}

/// Latest Bollinger band values for one timeframe.
///
/// `middle`, `upper` and `lower` are absent exactly when the timeframe has
/// fewer than `period` candles. When present, `upper >= middle >= lower`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandSet {
    pub timeframe: Timeframe,
    pub middle: Option<f64>,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
    pub current_price: f64,
    /// Open time of the candle the values belong to (Unix ms)
    pub timestamp: i64,
    pub position: Option<BandPosition>,
}

impl BandSet {
    pub fn new(
        timeframe: Timeframe,
        middle: Option<f64>,
        upper: Option<f64>,
        lower: Option<f64>,
        current_price: f64,
        timestamp: i64,
    ) -> Self {
        let position = match (upper, middle, lower) {
            (Some(u), Some(m), Some(l)) => Some(classify_position(current_price, u, m, l)),
            _ => None,
        };

        Self {
            timeframe,
            middle,
            upper,
            lower,
            current_price,
            timestamp,
            position,
        }
    }

    /// Defined band values tagged with their band type
    pub fn levels(&self) -> Vec<(BandType, f64)> {
        [
            (BandType::Upper, self.upper),
            (BandType::Middle, self.middle),
            (BandType::Lower, self.lower),
        ]
        .into_iter()
        .filter_map(|(band_type, price)| price.map(|p| (band_type, p)))
        .collect()
    }

    pub fn is_defined(&self) -> bool {
        self.upper.is_some() && self.middle.is_some() && self.lower.is_some()
    }
}

fn classify_position(price: f64, upper: f64, middle: f64, lower: f64) -> BandPosition {
    if price > upper {
        BandPosition::AboveUpper
    } else if price < lower {
        BandPosition::BelowLower
    } else if price > middle {
        BandPosition::AboveMiddle
    } else if price < middle {
        BandPosition::BelowMiddle
    } else {
        BandPosition::AtMiddle
    }
}

/// Latest bands keyed by timeframe, shortest timeframe first
pub type BandMap = BTreeMap<Timeframe, BandSet>;

/// A single raw band line used as a reference level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandLevel {
    pub timeframe: Timeframe,
    pub band_type: BandType,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceBands {
    pub resistance: Option<BandLevel>,
    pub support: Option<BandLevel>,
}

/// Raw band lines of one type across all timeframes, highest price first
fn lines_descending(bands: &BandMap, band_type: BandType) -> Vec<BandLevel> {
    let mut lines: Vec<BandLevel> = bands
        .values()
        .flat_map(|set| {
            set.levels()
                .into_iter()
                .filter(|(t, _)| *t == band_type)
                .map(move |(_, price)| BandLevel {
                    timeframe: set.timeframe,
                    band_type,
                    price,
                })
        })
        .collect();
    lines.sort_by(|a, b| b.price.total_cmp(&a.price));
    lines
}

/// Unclustered counterpart of the level-cluster analysis, using the same
/// scan order as the Fibonacci cycle context.
///
/// Resistance scans upper bands then middle bands, each from the highest
/// price down, and takes the first line above the price. Support scans
/// lower bands then middle bands, each from the lowest price up, and takes
/// the first line below the price. Either side therefore reports the
/// outermost qualifying band, not the closest one.
pub fn band_reference_levels(bands: &BandMap, current_price: f64) -> ReferenceBands {
    let upper = lines_descending(bands, BandType::Upper);
    let middle = lines_descending(bands, BandType::Middle);
    let lower = lines_descending(bands, BandType::Lower);

    let resistance = upper
        .iter()
        .chain(middle.iter())
        .find(|line| line.price > current_price)
        .copied();
    let support = lower
        .iter()
        .rev()
        .chain(middle.iter().rev())
        .find(|line| line.price < current_price)
        .copied();

    ReferenceBands {
        resistance,
        support,
    }
}
