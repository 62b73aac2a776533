// Generator configuration.
//
// Every value has a compiled-in default, and a run with no config file uses
// exactly those: 5000 particles and at most 10000 sweeps for both stages,
// thresholds 0.975 (chords) and 0.905 (melody), 120 BPM, a clock-derived
// seed. A JSON file may override any subset of fields; missing fields keep
// their defaults.
//
// Only the search budget, thresholds, tempo and seed are exposed. Step
// counts, registers and initial position bands are fixed by the fitness
// functions and are not configurable.
//
// See also: `chord.rs` and `melody.rs` for the fixed swarm shapes that
// `chord_swarm()` / `melody_swarm()` start from.

use crate::chord::ChordSwarmOptimizer;
use crate::error::ConfigError;
use crate::melody::MelodySwarmOptimizer;
use crate::render::MIN_TEMPO_BPM;
use crate::swarm::SwarmConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Particles per swarm, shared by both stages.
    pub particle_count: usize,
    /// Sweep cap, shared by both stages.
    pub iteration_cap: usize,
    /// Chord search stops once its best fitness reaches this.
    pub chord_threshold: f64,
    /// Melody search stops once its best fitness reaches this.
    pub melody_threshold: f64,
    /// Playback tempo in quarter notes per minute.
    pub tempo_bpm: u16,
    /// PRNG seed. `None` means derive one from the clock at startup.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let chord = ChordSwarmOptimizer::default_config();
        let melody = MelodySwarmOptimizer::default_config();
        GeneratorConfig {
            particle_count: chord.particle_count,
            iteration_cap: chord.iteration_cap,
            chord_threshold: chord.convergence_threshold,
            melody_threshold: melody.convergence_threshold,
            tempo_bpm: 120,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Read, parse and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse and validate a JSON config.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: GeneratorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chord_swarm().validate("chord")?;
        self.melody_swarm().validate("melody")?;
        if self.tempo_bpm < MIN_TEMPO_BPM {
            return Err(ConfigError::TempoOutOfRange {
                bpm: self.tempo_bpm,
            });
        }
        Ok(())
    }

    /// Full swarm shape for the chord stage.
    pub fn chord_swarm(&self) -> SwarmConfig {
        SwarmConfig {
            particle_count: self.particle_count,
            iteration_cap: self.iteration_cap,
            convergence_threshold: self.chord_threshold,
            ..ChordSwarmOptimizer::default_config()
        }
    }

    /// Full swarm shape for the melody stage.
    pub fn melody_swarm(&self) -> SwarmConfig {
        SwarmConfig {
            particle_count: self.particle_count,
            iteration_cap: self.iteration_cap,
            convergence_threshold: self.melody_threshold,
            ..MelodySwarmOptimizer::default_config()
        }
    }
}
