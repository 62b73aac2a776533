// swarm_song: chord progressions and melodies from particle swarms.
//
// Generates a 16-chord progression and a 32-note melody by running two
// particle swarm searches in sequence, each steered by a hand-written
// musical fitness function, then renders the result to MIDI.
//
// Architecture:
// - swarm.rs: Generic PSO engine (init, velocity/position update, personal
//   and global best tracking, convergence check)
// - repeat.rs: Detection of five-or-more consecutive repeated pitches
// - contour.rs: Counting heuristics shared by both fitness functions
// - scale.rs: C-major reference table, registers, pitch names
// - chord.rs: Chord-root fitness, chord swarm, triad expansion + fallback
// - melody.rs: Melody fitness (reads the finished progression), melody swarm
// - compose.rs: Runs the two stages in order and builds render events
// - render.rs: Renderer contract (chord events, note events, tempo)
// - midi.rs: MIDI file output via `midly`
// - config.rs: Compiled-in defaults with optional JSON override
// - error.rs: Config and render error types
//
// The generator is deterministic given a seed.

pub mod chord;
pub mod compose;
pub mod config;
pub mod contour;
pub mod error;
pub mod melody;
pub mod midi;
pub mod render;
pub mod repeat;
pub mod scale;
pub mod swarm;
