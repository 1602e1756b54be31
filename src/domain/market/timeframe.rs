use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chart timeframes supported by the band pipeline.
///
/// Variants are declared in ascending duration, so the derived `Ord` sorts
/// a `BTreeMap<Timeframe, _>` from the shortest to the longest timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "15m")]
    FifteenMin,
    #[serde(rename = "30m")]
    ThirtyMin,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "2h")]
    TwoHour,
    #[serde(rename = "3h")]
    ThreeHour,
    #[serde(rename = "4h")]
    FourHour,
    #[serde(rename = "5h")]
    FiveHour,
    #[serde(rename = "7h")]
    SevenHour,
    #[serde(rename = "8h")]
    EightHour,
    #[serde(rename = "9h")]
    NineHour,
    #[serde(rename = "10h")]
    TenHour,
    #[serde(rename = "11h")]
    ElevenHour,
    #[serde(rename = "12h")]
    TwelveHour,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "2d")]
    TwoDay,
    #[serde(rename = "3d")]
    ThreeDay,
    #[serde(rename = "4d")]
    FourDay,
    #[serde(rename = "5d")]
    FiveDay,
    #[serde(rename = "6d")]
    SixDay,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "2w")]
    TwoWeek,
    #[serde(rename = "3w")]
    ThreeWeek,
    #[serde(rename = "1M")]
    OneMonth,
}

impl Timeframe {
    /// Returns the duration of this timeframe in minutes.
    /// A month is counted as 30 days.
    pub fn to_minutes(&self) -> usize {
        match self {
            Timeframe::FifteenMin => 15,
            Timeframe::ThirtyMin => 30,
            Timeframe::OneHour => 60,
            Timeframe::TwoHour => 2 * 60,
            Timeframe::ThreeHour => 3 * 60,
            Timeframe::FourHour => 4 * 60,
            Timeframe::FiveHour => 5 * 60,
            Timeframe::SevenHour => 7 * 60,
            Timeframe::EightHour => 8 * 60,
            Timeframe::NineHour => 9 * 60,
            Timeframe::TenHour => 10 * 60,
            Timeframe::ElevenHour => 11 * 60,
            Timeframe::TwelveHour => 12 * 60,
            Timeframe::OneDay => 1440,
            Timeframe::TwoDay => 2 * 1440,
            Timeframe::ThreeDay => 3 * 1440,
            Timeframe::FourDay => 4 * 1440,
            Timeframe::FiveDay => 5 * 1440,
            Timeframe::SixDay => 6 * 1440,
            Timeframe::OneWeek => 7 * 1440,
            Timeframe::TwoWeek => 14 * 1440,
            Timeframe::ThreeWeek => 21 * 1440,
            Timeframe::OneMonth => 30 * 1440,
        }
    }

    /// Label used on the wire and as the exchange kline interval
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::FifteenMin => "15m",
            Timeframe::ThirtyMin => "30m",
            Timeframe::OneHour => "1h",
            Timeframe::TwoHour => "2h",
            Timeframe::ThreeHour => "3h",
            Timeframe::FourHour => "4h",
            Timeframe::FiveHour => "5h",
            Timeframe::SevenHour => "7h",
            Timeframe::EightHour => "8h",
            Timeframe::NineHour => "9h",
            Timeframe::TenHour => "10h",
            Timeframe::ElevenHour => "11h",
            Timeframe::TwelveHour => "12h",
            Timeframe::OneDay => "1d",
            Timeframe::TwoDay => "2d",
            Timeframe::ThreeDay => "3d",
            Timeframe::FourDay => "4d",
            Timeframe::FiveDay => "5d",
            Timeframe::SixDay => "6d",
            Timeframe::OneWeek => "1w",
            Timeframe::TwoWeek => "2w",
            Timeframe::ThreeWeek => "3w",
            Timeframe::OneMonth => "1M",
        }
    }

    /// Number of `base` candles merged into one candle of this timeframe.
    ///
    /// Returns `None` when this timeframe is the base itself or is not an
    /// exact multiple of it; callers treat that as identity.
    pub fn multiplier_from(&self, base: Timeframe) -> Option<usize> {
        let own = self.to_minutes();
        let base_minutes = base.to_minutes();
        if own <= base_minutes || own % base_minutes != 0 {
            return None;
        }
        Some(own / base_minutes)
    }

    /// Returns all available timeframes in ascending order
    pub fn all() -> Vec<Timeframe> {
        vec![
            Timeframe::FifteenMin,
            Timeframe::ThirtyMin,
            Timeframe::OneHour,
            Timeframe::TwoHour,
            Timeframe::ThreeHour,
            Timeframe::FourHour,
            Timeframe::FiveHour,
            Timeframe::SevenHour,
            Timeframe::EightHour,
            Timeframe::NineHour,
            Timeframe::TenHour,
            Timeframe::ElevenHour,
            Timeframe::TwelveHour,
            Timeframe::OneDay,
            Timeframe::TwoDay,
            Timeframe::ThreeDay,
            Timeframe::FourDay,
            Timeframe::FiveDay,
            Timeframe::SixDay,
            Timeframe::OneWeek,
            Timeframe::TwoWeek,
            Timeframe::ThreeWeek,
            Timeframe::OneMonth,
        ]
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    /// Labels are case-sensitive: `1m`-style minutes are not supported and
    /// `1M` is the monthly timeframe.
    fn from_str(s: &str) -> Result<Self> {
        Timeframe::all()
            .into_iter()
            .find(|tf| tf.as_str() == s.trim())
            .ok_or_else(|| {
                anyhow!(
                    "Invalid timeframe: '{}'. Valid options: 15m, 30m, 1h..12h, 1d..6d, 1w, 2w, 3w, 1M",
                    s
                )
            })
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
