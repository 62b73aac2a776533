// Melody stage: searching for a 32-note line over a finished progression.
//
// Runs only after the chord stage, because one of its terms reads the chord
// roots. Two melody notes sound over each chord, so note i is compared with
// the root of chord i / 2.
//
// Fitness terms, summed and divided by 6:
// - no note repeated five or more times in a row (+1)
// - notes in the melody register [72, 96] (+0.03125 each)
// - notes an exact number of octaves from the current chord root
//   (+0.03125 each)
// - adjacent notes at most an octave apart (+0.0322580645 per pair; note
//   "at most", where the chord stage uses "less than")
// - a rising opening over notes 1-8 (+0.05 each)
// - a falling close over notes 24-31 (+0.05 each)
// - notes in the C-major table (+0.03125 each)
//
// Notes are taken from the swarm's global best as they are. There is no
// fallback for pitches outside MIDI range at this stage.

use crate::chord::ChordProgression;
use crate::contour::{
    count_falling, count_in_c_major, count_in_register, count_rising, count_smooth_pairs,
};
use crate::error::ConfigError;
use crate::repeat::has_repeat_run;
use crate::scale::Register;
use crate::swarm::{Fitness, Swarm, SwarmConfig, SwarmOutcome};
use serde::{Deserialize, Serialize};
use swarm_song_prng::SongRng;

/// Number of notes in a melody line.
pub const MELODY_STEPS: usize = 32;

/// Melody notes sounding over each chord.
pub const NOTES_PER_CHORD: usize = 2;

const VARIETY_REWARD: f64 = 1.0;
const REGISTER_REWARD: f64 = 0.03125;
const OCTAVE_REWARD: f64 = 0.03125;
const SMOOTH_REWARD: f64 = 0.0322580645;
const RISING_REWARD: f64 = 0.05;
const FALLING_REWARD: f64 = 0.05;
const SCALE_REWARD: f64 = 0.03125;
const TERM_GROUPS: f64 = 6.0;

/// Largest leap (inclusive) between neighbouring notes that counts as smooth.
const MAX_SMOOTH_LEAP: u64 = 12;

/// Number of notes that are octave-equivalent to the chord sounding under
/// them. Notes past the end of the progression never match.
pub fn count_octave_matches(notes: &[i64], progression: &ChordProgression) -> usize {
    notes
        .iter()
        .enumerate()
        .filter(|&(i, &note)| {
            progression
                .root_at(i / NOTES_PER_CHORD)
                .is_some_and(|root| root.abs_diff(note) % 12 == 0)
        })
        .count()
}

/// Score a melody against a finished progression.
pub fn melody_fitness(notes: &[i64], progression: &ChordProgression) -> f64 {
    let mut total = 0.0;
    if !has_repeat_run(notes) {
        total += VARIETY_REWARD;
    }
    total += count_in_register(notes, Register::MELODY) as f64 * REGISTER_REWARD;
    total += count_octave_matches(notes, progression) as f64 * OCTAVE_REWARD;
    total += count_smooth_pairs(notes, MAX_SMOOTH_LEAP, true) as f64 * SMOOTH_REWARD;
    total += count_rising(notes, 1..9) as f64 * RISING_REWARD;
    total += count_falling(notes, 24..32) as f64 * FALLING_REWARD;
    total += count_in_c_major(notes) as f64 * SCALE_REWARD;
    total / TERM_GROUPS
}

/// `melody_fitness` bound to one progression, for use as a swarm fitness.
pub struct MelodyFitness<'a> {
    pub progression: &'a ChordProgression,
}

impl Fitness for MelodyFitness<'_> {
    fn evaluate(&self, position: &[i64]) -> f64 {
        melody_fitness(position, self.progression)
    }
}

/// The finished melody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MelodyLine {
    pub notes: Vec<i64>,
}

/// What the melody stage produced.
#[derive(Debug, Clone)]
pub struct MelodyOutcome {
    pub search: SwarmOutcome,
    pub melody: MelodyLine,
}

/// Runs the melody swarm against a fixed progression.
#[derive(Debug, Clone)]
pub struct MelodySwarmOptimizer {
    pub config: SwarmConfig,
}

impl MelodySwarmOptimizer {
    pub fn new(config: SwarmConfig) -> Self {
        MelodySwarmOptimizer { config }
    }

    /// Swarm shape used when nothing is overridden: 5000 particles starting
    /// in [72, 96), at most 10000 sweeps, stop at 0.905.
    pub fn default_config() -> SwarmConfig {
        SwarmConfig {
            particle_count: 5000,
            dimension: MELODY_STEPS,
            lower_bound: 72,
            position_range: 24,
            iteration_cap: 10_000,
            convergence_threshold: 0.905,
        }
    }

    pub fn run(
        &self,
        progression: &ChordProgression,
        rng: &mut SongRng,
    ) -> Result<MelodyOutcome, ConfigError> {
        let fitness = MelodyFitness { progression };
        let swarm = Swarm::new("melody", self.config.clone(), fitness, rng)?;
        let search = swarm.run(rng);
        let melody = MelodyLine {
            notes: search.position.clone(),
        };
        Ok(MelodyOutcome { search, melody })
    }
}

impl Default for MelodySwarmOptimizer {
    fn default() -> Self {
        MelodySwarmOptimizer::new(Self::default_config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// C# roots: no melody note used below is octave-equivalent to them.
    fn c_sharp_progression() -> ChordProgression {
        ChordProgression::from_roots(&[61; 16])
    }

    /// Alternating 20 / 100: never smooth, never in register, never in the
    /// table, rising on odd steps and falling on even ones.
    fn zigzag() -> Vec<i64> {
        (0..MELODY_STEPS)
            .map(|i| if i % 2 == 0 { 20 } else { 100 })
            .collect()
    }

    #[test]
    fn test_octave_equivalence_pairs_two_notes_per_chord() {
        let mut roots = [61; 16];
        roots[3] = 60;
        let prog = ChordProgression::from_roots(&roots);
        assert_eq!(prog.triads[3].pitches(), [60, 64, 67]);

        let mut notes = vec![95; MELODY_STEPS];
        notes[6] = 60;
        notes[7] = 72;
        assert_eq!(count_octave_matches(&notes, &prog), 2);

        // Same notes one chord later do not match the C# root.
        notes[6] = 95;
        notes[7] = 95;
        notes[8] = 60;
        notes[9] = 72;
        assert_eq!(count_octave_matches(&notes, &prog), 0);
    }

    #[test]
    fn test_register_match_never_lowers_score() {
        let prog = c_sharp_progression();
        let before = zigzag();
        let mut after = before.clone();
        after[5] = 94; // Bb6: in register, not in the table, still above 20

        let gain = melody_fitness(&after, &prog) - melody_fitness(&before, &prog);
        assert!((gain - REGISTER_REWARD / TERM_GROUPS).abs() < 1e-12, "gain {gain}");
    }

    #[test]
    fn test_octave_match_never_lowers_score() {
        let prog = c_sharp_progression();
        let before = zigzag();
        let mut after = before.clone();
        after[5] = 109; // C#8: four octaves above the C# root, out of register

        let gain = melody_fitness(&after, &prog) - melody_fitness(&before, &prog);
        assert!((gain - OCTAVE_REWARD / TERM_GROUPS).abs() < 1e-12, "gain {gain}");
    }

    #[test]
    fn test_octave_leap_is_smooth_for_melody() {
        // Exactly 12 apart: smooth here, but not for chord roots.
        assert_eq!(count_smooth_pairs(&[72, 84], MAX_SMOOTH_LEAP, true), 1);
    }

    #[test]
    fn test_scale_run_adds_up_terms() {
        // Over C roots: C5 up the scale to C7 and back down.
        let prog = ChordProgression::from_roots(&[60; 16]);
        let notes: Vec<i64> = vec![
            72, 74, 76, 77, 79, 81, 83, 84, 86, 88, 89, 91, 93, 95, 96, 95,
            93, 91, 89, 88, 86, 84, 83, 81, 79, 77, 76, 74, 72, 74, 76, 72,
        ];
        assert!(!has_repeat_run(&notes));
        // C notes (72, 84, 96) over C roots: indices 0, 7, 14, 21, 28, 31.
        assert_eq!(count_octave_matches(&notes, &prog), 6);
        // Falling close: 29 (74 > 72) and 30 (76 > 74) miss.
        assert_eq!(count_falling(&notes, 24..32), 6);

        let expected = (1.0 + 1.0 + 6.0 * 0.03125 + 31.0 * 0.0322580645 + 8.0 * 0.05
            + 6.0 * 0.05
            + 1.0)
            / 6.0;
        let score = melody_fitness(&notes, &prog);
        assert!((score - expected).abs() < 1e-12, "expected {expected}, got {score}");
    }

    #[test]
    fn test_notes_pass_through_unclamped() {
        let optimizer = MelodySwarmOptimizer::new(SwarmConfig {
            particle_count: 1,
            iteration_cap: 0,
            lower_bound: 140,
            position_range: 4,
            ..MelodySwarmOptimizer::default_config()
        });
        let outcome = optimizer
            .run(&c_sharp_progression(), &mut SongRng::new(1))
            .unwrap();
        assert_eq!(outcome.melody.notes.len(), MELODY_STEPS);
        assert!(outcome.melody.notes.iter().all(|&n| (140..144).contains(&n)));
    }

    #[test]
    fn test_small_search_keeps_best_monotonic() {
        let prog = ChordProgression::from_roots(&[
            48, 50, 52, 53, 55, 57, 59, 60, 59, 57, 55, 60, 59, 57, 55, 53,
        ]);
        let optimizer = MelodySwarmOptimizer::new(SwarmConfig {
            particle_count: 50,
            iteration_cap: 30,
            ..MelodySwarmOptimizer::default_config()
        });
        let outcome = optimizer.run(&prog, &mut SongRng::new(12)).unwrap();
        assert!(outcome.search.history.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(melody_fitness(&outcome.melody.notes, &prog), outcome.search.fitness);
    }
}
