// Consecutive-repeat detection.
//
// A candidate that sits on one pitch for five or more steps in a row sounds
// stuck, so both fitness functions only award their "variety" point when no
// such run exists. Only run length matters: a value may appear any number of
// times overall as long as its occurrences are broken up.

/// Run length at which a repeated value counts as stuck.
pub const REPEAT_RUN_LIMIT: usize = 5;

/// True iff some value occurs `REPEAT_RUN_LIMIT` or more times in a row.
///
/// Returns as soon as a run reaches the limit.
pub fn has_repeat_run(values: &[i64]) -> bool {
    let Some((&first, rest)) = values.split_first() else {
        return false;
    };
    let mut current = first;
    let mut run = 1;
    for &v in rest {
        if v == current {
            run += 1;
        } else {
            current = v;
            run = 1;
        }
        if run >= REPEAT_RUN_LIMIT {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_in_a_row_is_a_repeat() {
        assert!(has_repeat_run(&[5, 5, 5, 5, 5, 1, 2]));
    }

    #[test]
    fn broken_run_is_not_a_repeat() {
        // Six fives overall, but the longest run is four.
        assert!(!has_repeat_run(&[5, 5, 5, 5, 1, 5, 5]));
    }

    #[test]
    fn run_at_the_tail_is_found() {
        assert!(has_repeat_run(&[60, 62, 64, 64, 64, 64, 64]));
    }

    #[test]
    fn short_inputs_never_repeat() {
        assert!(!has_repeat_run(&[]));
        assert!(!has_repeat_run(&[60]));
        assert!(!has_repeat_run(&[60, 60, 60, 60]));
    }
}
