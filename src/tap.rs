use crate::models::{MALA_SIZE, PracticeProgress};

/// Advances `state` by one tap.
///
/// Returns the new state and whether this tap completed a mala.
pub fn apply_tap(state: PracticeProgress) -> (PracticeProgress, bool) {
    let lifetime_taps = state.lifetime_taps.saturating_add(1);
    let taps = state.current_taps.saturating_add(1);

    if taps >= MALA_SIZE {
        let next = PracticeProgress {
            current_taps: 0,
            completed_units: state.completed_units.saturating_add(1),
            lifetime_taps,
        };
        return (next, true);
    }

    let next = PracticeProgress {
        current_taps: taps,
        completed_units: state.completed_units,
        lifetime_taps,
    };
    (next, false)
}
