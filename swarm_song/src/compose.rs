// Two-stage composition pipeline.
//
// chord swarm -> triad expansion -> melody swarm (reads the triads) -> events
//
// The stages are strictly sequential: the melody fitness needs the finished
// progression. Both stages draw from one `SongRng` seeded once, so a seed
// fully determines the composition.
//
// Rendering is kept separate: a `Composition` can be turned into chord and
// note events and handed to any `Renderer`. Chords are quarter notes and
// melody notes eighth notes, so 16 chords and 32 notes both span four bars.

use crate::chord::{ChordProgression, ChordSwarmOptimizer};
use crate::config::GeneratorConfig;
use crate::error::{ConfigError, RenderError};
use crate::melody::{MelodyLine, MelodySwarmOptimizer};
use crate::render::{ChordEvent, NoteEvent, NoteValue, Renderer};
use crate::scale::pitch_name;
use crate::swarm::SearchStats;
use serde::{Deserialize, Serialize};
use swarm_song_prng::SongRng;
use tracing::info;

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub seed: u64,
    pub tempo_bpm: u16,
    /// Chord roots exactly as the chord swarm left them.
    pub roots: Vec<i64>,
    pub progression: ChordProgression,
    pub melody: MelodyLine,
    pub chord_search: SearchStats,
    pub melody_search: SearchStats,
}

impl Composition {
    /// One quarter-note chord event per triad.
    pub fn chord_events(&self) -> Vec<ChordEvent> {
        self.progression
            .triads
            .iter()
            .map(|t| ChordEvent {
                pitches: t.pitches().to_vec(),
                duration: NoteValue::Quarter,
            })
            .collect()
    }

    /// One eighth-note event per melody note.
    pub fn note_events(&self) -> Vec<NoteEvent> {
        self.melody
            .notes
            .iter()
            .map(|&pitch| NoteEvent {
                pitch,
                duration: NoteValue::Eighth,
            })
            .collect()
    }

    /// Hand the composition's events and tempo to `renderer`.
    pub fn render(&self, renderer: &mut impl Renderer) -> Result<(), RenderError> {
        renderer.render(&self.chord_events(), &self.note_events(), self.tempo_bpm)
    }
}

/// Run both swarm stages with the given seed.
pub fn compose(config: &GeneratorConfig, seed: u64) -> Result<Composition, ConfigError> {
    config.validate()?;
    let mut rng = SongRng::new(seed);

    info!(seed, particles = config.particle_count, "searching for chords");
    let chords = ChordSwarmOptimizer::new(config.chord_swarm()).run(&mut rng)?;
    info!(
        fitness = chords.search.fitness,
        iterations = chords.search.iterations,
        fallbacks = chords.progression.fallbacks.len(),
        roots = %names(&chords.search.position),
        "chord stage done"
    );

    info!("searching for melody");
    let melody =
        MelodySwarmOptimizer::new(config.melody_swarm()).run(&chords.progression, &mut rng)?;
    info!(
        fitness = melody.search.fitness,
        iterations = melody.search.iterations,
        notes = %names(&melody.melody.notes),
        "melody stage done"
    );

    Ok(Composition {
        seed,
        tempo_bpm: config.tempo_bpm,
        chord_search: chords.search.stats(),
        melody_search: melody.search.stats(),
        roots: chords.search.position,
        progression: chords.progression,
        melody: melody.melody,
    })
}

fn names(pitches: &[i64]) -> String {
    pitches
        .iter()
        .map(|&p| pitch_name(p))
        .collect::<Vec<_>>()
        .join(" ")
}
