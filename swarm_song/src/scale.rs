// Pitch tables and registers shared by the two fitness functions.
//
// Pitches are MIDI note numbers held as `i64`, because swarm positions are
// never clamped and may wander outside 0-127 (or below zero) between sweeps.
//
// This module provides:
// - The fixed C-major reference table (29 pitches, C3 to C7)
// - `Register`, an allowed pitch band with an open or closed upper end
// - The two registers the generator rewards: chords in [48, 72) and melody
//   notes in [72, 96]
// - `pitch_name` for log output

/// Every C-major pitch from C3 (48) through C7 (96), ascending.
pub const C_MAJOR: [i64; 29] = [
    48, 50, 52, 53, 55, 57, 59, 60, 62, 64, 65, 67, 69, 71, 72, 74, 76, 77, 79, 81, 83, 84, 86,
    88, 89, 91, 93, 95, 96,
];

/// Lowest valid MIDI pitch.
pub const MIDI_MIN: i64 = 0;

/// Highest valid MIDI pitch.
pub const MIDI_MAX: i64 = 127;

/// True if `pitch` appears in the C-major reference table.
pub fn in_c_major(pitch: i64) -> bool {
    C_MAJOR.binary_search(&pitch).is_ok()
}

/// True if `pitch` is encodable as a MIDI note number.
pub fn is_midi_pitch(pitch: i64) -> bool {
    (MIDI_MIN..=MIDI_MAX).contains(&pitch)
}

/// A band of pitches a part is expected to stay within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    pub low: i64,
    pub high: i64,
    /// Whether `high` itself belongs to the register.
    pub high_inclusive: bool,
}

impl Register {
    /// Chord roots: C3 up to, but not including, C5.
    pub const CHORD: Register = Register {
        low: 48,
        high: 72,
        high_inclusive: false,
    };

    /// Melody notes: C5 through C7, both ends included.
    pub const MELODY: Register = Register {
        low: 72,
        high: 96,
        high_inclusive: true,
    };

    pub fn contains(&self, pitch: i64) -> bool {
        if self.high_inclusive {
            pitch >= self.low && pitch <= self.high
        } else {
            pitch >= self.low && pitch < self.high
        }
    }
}

/// Human-readable name of a pitch, e.g. `C4` for 60.
///
/// Pitches outside the MIDI range get a bare number so log lines still make
/// sense for drifted positions.
pub fn pitch_name(pitch: i64) -> String {
    if !is_midi_pitch(pitch) {
        return format!("#{pitch}");
    }
    let name = match pitch % 12 {
        0 => "C", 1 => "C#", 2 => "D", 3 => "Eb",
        4 => "E", 5 => "F", 6 => "F#", 7 => "G",
        8 => "Ab", 9 => "A", 10 => "Bb", _ => "B",
    };
    format!("{}{}", name, pitch / 12 - 1)
}
