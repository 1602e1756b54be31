use crate::domain::signals::cycles::{
    Cycle, CycleContext, CycleDirection, CycleSummary, FIB_RATIOS, FibLevel, FibProjection,
};

/// Retracement levels for one cycle.
///
/// Upward cycles project down from the end price (`end - range * ratio`);
/// downward cycles project up from the start price (`start + range * ratio`).
pub fn project(cycle: &Cycle) -> FibProjection {
    let start = cycle.start.price;
    let end = cycle.end.price;
    let range = (end - start).abs();

    let levels = FIB_RATIOS
        .iter()
        .map(|&ratio| FibLevel {
            ratio,
            price: match cycle.direction {
                CycleDirection::Upward => end - range * ratio,
                CycleDirection::Downward => start + range * ratio,
            },
        })
        .collect();

    FibProjection {
        direction: cycle.direction,
        start_time: cycle.start.time,
        end_time: cycle.end.time,
        start_price: start,
        end_price: end,
        strength: cycle.strength,
        levels,
    }
}

/// Resistance and support levels of `projection` around `price`.
///
/// Levels are ordered by price, descending for upward cycles and ascending
/// for downward ones. Resistance is the first level in that order above the
/// price; support is the first level below it when scanning from the other
/// end.
pub fn context(projection: &FibProjection, price: f64) -> CycleContext {
    let mut ordered = projection.levels.clone();
    match projection.direction {
        CycleDirection::Upward => ordered.sort_by(|a, b| b.price.total_cmp(&a.price)),
        CycleDirection::Downward => ordered.sort_by(|a, b| a.price.total_cmp(&b.price)),
    }

    let nearest_resistance = ordered.iter().find(|l| l.price > price).copied();
    let nearest_support = ordered.iter().rev().find(|l| l.price < price).copied();

    CycleContext {
        cycle: CycleSummary {
            direction: projection.direction,
            start_time: projection.start_time,
            end_time: projection.end_time,
            start_price: projection.start_price,
            end_price: projection.end_price,
            strength: projection.strength,
        },
        nearest_resistance,
        nearest_support,
    }
}
