// End-to-end test of the generator: both swarm stages, MIDI rendering to a
// real file, and the JSON summary.
//
// Uses small swarms so the test stays fast; the search logic is identical to
// a full-size run.

use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};
use swarm_song::chord::{CHORD_STEPS, ChordSwarmOptimizer, chord_fitness};
use swarm_song::compose::{Composition, compose};
use swarm_song::config::GeneratorConfig;
use swarm_song::melody::{MELODY_STEPS, melody_fitness};
use swarm_song::midi::MidiRenderer;
use swarm_song::scale::is_midi_pitch;
use swarm_song::swarm::SwarmConfig;
use swarm_song_prng::SongRng;

fn small_config() -> GeneratorConfig {
    GeneratorConfig {
        particle_count: 80,
        iteration_cap: 60,
        seed: Some(2718),
        ..Default::default()
    }
}

#[test]
fn composition_scores_match_its_notes() {
    let config = small_config();
    let piece = compose(&config, 2718).unwrap();

    assert_eq!(chord_fitness(&piece.roots), piece.chord_search.fitness);
    assert_eq!(
        melody_fitness(&piece.melody.notes, &piece.progression),
        piece.melody_search.fitness
    );
    assert!(piece.chord_search.iterations <= config.iteration_cap);
    assert_eq!(
        piece.chord_search.converged,
        piece.chord_search.fitness >= config.chord_threshold
    );
}

#[test]
fn midi_file_round_trips() {
    let piece = compose(&small_config(), 99).unwrap();
    let path = std::env::temp_dir().join(format!("swarm_song_test_{}.mid", std::process::id()));

    let mut renderer = MidiRenderer::new(&path);
    piece.render(&mut renderer).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let smf = Smf::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 3);
    assert!(smf.tracks[0].iter().any(|e| matches!(
        e.kind,
        TrackEventKind::Meta(MetaMessage::Tempo(t)) if t.as_int() == 500_000
    )));

    let count_note_ons = |track: usize| {
        smf.tracks[track]
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    TrackEventKind::Midi {
                        message: MidiMessage::NoteOn { .. },
                        ..
                    }
                )
            })
            .count()
    };

    let playable_chord_notes = piece
        .progression
        .triads
        .iter()
        .flat_map(|t| t.pitches())
        .filter(|&p| is_midi_pitch(p))
        .count();
    let playable_melody_notes = piece
        .melody
        .notes
        .iter()
        .filter(|&&p| is_midi_pitch(p))
        .count();
    assert_eq!(count_note_ons(1), playable_chord_notes);
    assert_eq!(count_note_ons(2), playable_melody_notes);
}

#[test]
fn summary_json_round_trips() {
    let piece = compose(&small_config(), 4).unwrap();
    let json = serde_json::to_string_pretty(&piece).unwrap();
    let restored: Composition = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.seed, piece.seed);
    assert_eq!(restored.roots, piece.roots);
    assert_eq!(restored.progression, piece.progression);
    assert_eq!(restored.melody, piece.melody);
    assert_eq!(restored.chord_search.iterations, piece.chord_search.iterations);
    assert!((restored.melody_search.fitness - piece.melody_search.fitness).abs() < 1e-12);
    assert_eq!(restored.roots.len(), CHORD_STEPS);
    assert_eq!(restored.melody.notes.len(), MELODY_STEPS);
}

#[test]
fn degenerate_chord_search_returns_initial_particle() {
    let optimizer = ChordSwarmOptimizer::new(SwarmConfig {
        particle_count: 1,
        iteration_cap: 0,
        ..ChordSwarmOptimizer::default_config()
    });
    let outcome = optimizer.run(&mut SongRng::new(555)).unwrap();

    let mut replay = SongRng::new(555);
    let initial: Vec<i64> = (0..CHORD_STEPS).map(|_| replay.range_i64(48, 72)).collect();
    assert_eq!(outcome.search.position, initial);
    assert_eq!(outcome.search.history.len(), 1);
}
