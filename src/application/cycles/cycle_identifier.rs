use crate::domain::signals::cycles::{Cycle, SwingPoint};

/// Pairs alternating swing points into cycles.
///
/// The pending start is the first swing of the current same-kind run, so a
/// run of lows followed by a high yields a single upward cycle from the first
/// low. Fewer than two swings yield no cycles.
pub fn identify_cycles(swings: &[SwingPoint]) -> Vec<Cycle> {
    let mut cycles = Vec::new();
    let mut pending: Option<SwingPoint> = None;

    for pair in swings.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        let start = *pending.get_or_insert(current);

        if current.kind != next.kind {
            if let Some(cycle) = Cycle::between(start, next) {
                cycles.push(cycle);
            }
            pending = Some(next);
        }
    }

    cycles
}
