// The hand-off from generation to playback.
//
// A finished composition becomes two ordered event streams, one of chords
// (pitch sets) and one of single notes, each with a fixed note value, plus a
// tempo. A `Renderer` turns those into something playable. The only renderer
// shipped is `midi::MidiRenderer`; tests use recording renderers.
//
// Events carry pitches exactly as generated. Deciding what to do with a pitch
// that a target format cannot represent is the renderer's business.

use crate::error::RenderError;
use serde::{Deserialize, Serialize};

/// Slowest tempo whose quarter-note length still fits a MIDI tempo message.
pub const MIN_TEMPO_BPM: u16 = 4;

/// Note lengths used by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteValue {
    Quarter,
    Eighth,
}

impl NoteValue {
    /// Length in ticks at the given resolution (ticks per quarter note).
    pub fn ticks(self, ticks_per_quarter: u32) -> u32 {
        match self {
            NoteValue::Quarter => ticks_per_quarter,
            NoteValue::Eighth => ticks_per_quarter / 2,
        }
    }
}

/// Several pitches struck together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordEvent {
    pub pitches: Vec<i64>,
    pub duration: NoteValue,
}

/// One pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch: i64,
    pub duration: NoteValue,
}

/// Produces a playable sequence from chord and note events.
///
/// Given the same events and tempo, a renderer must produce the same output.
pub trait Renderer {
    fn render(
        &mut self,
        chords: &[ChordEvent],
        notes: &[NoteEvent],
        tempo_bpm: u16,
    ) -> Result<(), RenderError>;
}
