mod common;

use common::{book, candle};
use marketlens::application::analysis::level_cluster::LevelClusterAnalyzer;
use marketlens::application::analysis::order_flow::OrderFlowAnalyzer;
use marketlens::application::cycles::cycle_identifier::identify_cycles;
use marketlens::application::cycles::fibonacci;
use marketlens::application::indicators::bollinger::BandCalculator;
use marketlens::application::market_data::timeframe_aggregator::TimeframeAggregator;
use marketlens::domain::market::order_book::{MarketSnapshot, RecentTrades};
use marketlens::domain::market::timeframe::Timeframe;
use marketlens::domain::signals::bands::{BandMap, BandSet};
use marketlens::domain::signals::cycles::{CycleDirection, SwingKind, SwingPoint};
use marketlens::domain::signals::levels::LevelStrength;
use marketlens::domain::signals::order_flow::{FlowAction, OrderFlowAnalysis};

fn flat(count: i64, price: f64) -> Vec<marketlens::domain::market::candle::Candle> {
    (0..count)
        .map(|i| candle(i, 900_000, price, price, price))
        .collect()
}

#[test]
fn test_constant_closes_collapse_bands() {
    let set = BandCalculator::default()
        .latest(&flat(20, 100.0), Timeframe::FifteenMin)
        .unwrap();

    assert_eq!(set.middle, Some(100.0));
    assert_eq!(set.upper, Some(100.0));
    assert_eq!(set.lower, Some(100.0));
}

#[test]
fn test_trailing_partial_chunk_is_dropped() {
    let aggregated =
        TimeframeAggregator::new(Timeframe::FifteenMin).aggregate(&flat(10, 1.0), Timeframe::OneHour);

    assert_eq!(aggregated.len(), 2);
    assert_eq!(aggregated[1].open_time, 4 * 900_000);
}

#[test]
fn test_nearby_band_values_form_one_medium_cluster() {
    let mut bands = BandMap::new();
    bands.insert(
        Timeframe::OneHour,
        BandSet::new(Timeframe::OneHour, Some(100.05), Some(110.0), Some(90.0), 100.0, 0),
    );
    bands.insert(
        Timeframe::FourHour,
        BandSet::new(Timeframe::FourHour, Some(100.08), Some(120.0), Some(80.0), 100.0, 0),
    );

    let levels = LevelClusterAnalyzer::default().cluster(&bands, 100.0);
    let near: Vec<_> = levels
        .iter()
        .filter(|l| (l.price - 100.0).abs() < 1.0)
        .collect();

    assert_eq!(levels.len(), 5);
    assert_eq!(near.len(), 1);
    assert_eq!(near[0].member_count, 2);
    assert_eq!(near[0].strength, LevelStrength::Medium);
}

#[test]
fn test_depth_outside_range_holds() {
    let range = BandSet::new(Timeframe::FifteenMin, Some(100.0), Some(102.0), Some(98.0), 100.0, 0);
    let snapshot = MarketSnapshot::new(
        100.0,
        book(&[(90.0, 3.0)], &[(110.0, 3.0)]),
        RecentTrades::default(),
    );

    let analysis = OrderFlowAnalyzer::default().analyze(&snapshot, Some(&range));

    assert_eq!(analysis, OrderFlowAnalysis::insufficient_data());
    assert_eq!(analysis.recommendation.action, FlowAction::Hold);
    assert_eq!(analysis.recommendation.confidence, 0.0);
}

#[test]
fn test_low_high_low_yields_up_then_down() {
    let swing = |kind, price, time| SwingPoint {
        kind,
        price,
        time,
        strength: 0.5,
    };
    let swings = [
        swing(SwingKind::Low, 10.0, 1),
        swing(SwingKind::High, 20.0, 2),
        swing(SwingKind::Low, 5.0, 3),
    ];

    let cycles = identify_cycles(&swings);

    assert_eq!(cycles.len(), 2);
    assert_eq!(cycles[0].direction, CycleDirection::Upward);
    assert_eq!((cycles[0].start.price, cycles[0].end.price), (10.0, 20.0));
    assert_eq!(cycles[1].direction, CycleDirection::Downward);
    assert_eq!((cycles[1].start.price, cycles[1].end.price), (20.0, 5.0));

    let projection = fibonacci::project(&cycles[0]);
    assert_eq!(projection.level(0.5), Some(15.0));
}
