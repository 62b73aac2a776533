// Chord stage: searching for a 16-step progression of chord roots.
//
// The swarm optimizes one root pitch per step. Fitness rewards, in this
// order of terms:
// - no root repeated five or more times in a row (+1)
// - roots in the chord register [48, 72) (+0.0625 each)
// - adjacent roots less than an octave apart (+0.066667 per pair)
// - a rising opening over steps 1-3 (+0.125 each)
// - a falling close over steps 12-15 (+0.125 each)
// - roots in the C-major table (+0.0625 each)
// and the sum is divided by 5. The weights are not normalized: a perfect
// progression scores 0.975001, which is why the default threshold is 0.975.
//
// The winning roots are expanded into major triads. The swarm never clamps
// positions, so a root may end up outside MIDI range; such a step gets the
// C major triad (60, 64, 67) instead, and the substitution is both logged and
// recorded on the progression. Only this stage substitutes. The melody stage
// passes its notes through unchanged.

use crate::contour::{
    count_falling, count_in_c_major, count_in_register, count_rising, count_smooth_pairs,
};
use crate::error::ConfigError;
use crate::repeat::has_repeat_run;
use crate::scale::{Register, is_midi_pitch};
use crate::swarm::{Swarm, SwarmConfig, SwarmOutcome};
use serde::{Deserialize, Serialize};
use swarm_song_prng::SongRng;
use tracing::warn;

/// Number of chords in a progression.
pub const CHORD_STEPS: usize = 16;

/// Triad used in place of one whose root is not a MIDI pitch.
pub const FALLBACK_TRIAD: Triad = Triad {
    root: 60,
    third: 64,
    fifth: 67,
};

const VARIETY_REWARD: f64 = 1.0;
const REGISTER_REWARD: f64 = 0.0625;
const SMOOTH_REWARD: f64 = 0.066667;
const RISING_REWARD: f64 = 0.125;
const FALLING_REWARD: f64 = 0.125;
const SCALE_REWARD: f64 = 0.0625;
const TERM_GROUPS: f64 = 5.0;

/// Largest leap (exclusive) between neighbouring roots that counts as smooth.
const MAX_SMOOTH_LEAP: u64 = 12;

/// Score a vector of chord roots.
pub fn chord_fitness(roots: &[i64]) -> f64 {
    let mut total = 0.0;
    if !has_repeat_run(roots) {
        total += VARIETY_REWARD;
    }
    total += count_in_register(roots, Register::CHORD) as f64 * REGISTER_REWARD;
    total += count_smooth_pairs(roots, MAX_SMOOTH_LEAP, false) as f64 * SMOOTH_REWARD;
    total += count_rising(roots, 1..4) as f64 * RISING_REWARD;
    total += count_falling(roots, 12..16) as f64 * FALLING_REWARD;
    total += count_in_c_major(roots) as f64 * SCALE_REWARD;
    total / TERM_GROUPS
}

/// A major triad: root, major third, perfect fifth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triad {
    pub root: i64,
    pub third: i64,
    pub fifth: i64,
}

impl Triad {
    pub fn major(root: i64) -> Self {
        Triad {
            root,
            third: root + 4,
            fifth: root + 7,
        }
    }

    pub fn pitches(&self) -> [i64; 3] {
        [self.root, self.third, self.fifth]
    }
}

/// A step whose optimized root was replaced by `FALLBACK_TRIAD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackSubstitution {
    pub step: usize,
    pub root: i64,
}

/// The finished chord progression handed to the melody stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordProgression {
    pub triads: Vec<Triad>,
    /// Steps that were substituted, in step order.
    pub fallbacks: Vec<FallbackSubstitution>,
}

impl ChordProgression {
    /// Expand roots into major triads, substituting out-of-range roots.
    pub fn from_roots(roots: &[i64]) -> Self {
        let mut triads = Vec::with_capacity(roots.len());
        let mut fallbacks = Vec::new();
        for (step, &root) in roots.iter().enumerate() {
            if is_midi_pitch(root) {
                triads.push(Triad::major(root));
            } else {
                warn!(step, root, "chord root outside MIDI range, using C major triad");
                fallbacks.push(FallbackSubstitution { step, root });
                triads.push(FALLBACK_TRIAD);
            }
        }
        ChordProgression { triads, fallbacks }
    }

    /// Root of the chord sounding at `step`, if there is one.
    pub fn root_at(&self, step: usize) -> Option<i64> {
        self.triads.get(step).map(|t| t.root)
    }

    pub fn len(&self) -> usize {
        self.triads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triads.is_empty()
    }
}

/// What the chord stage produced.
#[derive(Debug, Clone)]
pub struct ChordOutcome {
    /// Raw search result; `search.position` holds the optimized roots.
    pub search: SwarmOutcome,
    pub progression: ChordProgression,
}

/// Runs the chord-root swarm and expands its winner into triads.
#[derive(Debug, Clone)]
pub struct ChordSwarmOptimizer {
    pub config: SwarmConfig,
}

impl ChordSwarmOptimizer {
    pub fn new(config: SwarmConfig) -> Self {
        ChordSwarmOptimizer { config }
    }

    /// Swarm shape used when nothing is overridden: 5000 particles starting
    /// in [48, 72), at most 10000 sweeps, stop at 0.975.
    pub fn default_config() -> SwarmConfig {
        SwarmConfig {
            particle_count: 5000,
            dimension: CHORD_STEPS,
            lower_bound: 48,
            position_range: 24,
            iteration_cap: 10_000,
            convergence_threshold: 0.975,
        }
    }

    pub fn run(&self, rng: &mut SongRng) -> Result<ChordOutcome, ConfigError> {
        let swarm = Swarm::new("chord", self.config.clone(), chord_fitness, rng)?;
        let search = swarm.run(rng);
        let progression = ChordProgression::from_roots(&search.position);
        Ok(ChordOutcome {
            search,
            progression,
        })
    }
}

impl Default for ChordSwarmOptimizer {
    fn default() -> Self {
        ChordSwarmOptimizer::new(Self::default_config())
    }
}
