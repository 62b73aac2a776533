// Counting heuristics shared by the chord and melody fitness functions.
//
// Each helper counts how many positions of a candidate satisfy one musical
// preference; the fitness functions multiply the counts by their own
// per-term weights. Index windows are clipped to the candidate's length so a
// shorter vector simply scores fewer matches.

use crate::scale::{Register, in_c_major};
use std::ops::Range;

/// Number of values inside `register`.
pub fn count_in_register(values: &[i64], register: Register) -> usize {
    values.iter().filter(|&&v| register.contains(v)).count()
}

/// Number of values found in the C-major reference table.
pub fn count_in_c_major(values: &[i64]) -> usize {
    values.iter().filter(|&&v| in_c_major(v)).count()
}

/// Number of adjacent pairs whose distance is below `max_leap`, or at most
/// `max_leap` when `inclusive` is set.
pub fn count_smooth_pairs(values: &[i64], max_leap: u64, inclusive: bool) -> usize {
    values
        .windows(2)
        .filter(|w| {
            let leap = w[0].abs_diff(w[1]);
            if inclusive { leap <= max_leap } else { leap < max_leap }
        })
        .count()
}

/// Number of indices `i` in `window` with `values[i] > values[i - 1]`.
pub fn count_rising(values: &[i64], window: Range<usize>) -> usize {
    clip(window, values.len())
        .filter(|&i| values[i] > values[i - 1])
        .count()
}

/// Number of indices `i` in `window` with `values[i] < values[i - 1]`.
pub fn count_falling(values: &[i64], window: Range<usize>) -> usize {
    clip(window, values.len())
        .filter(|&i| values[i] < values[i - 1])
        .count()
}

/// Restrict a predecessor-comparison window to indices `1..len`.
fn clip(window: Range<usize>, len: usize) -> Range<usize> {
    window.start.max(1)..window.end.min(len)
}
