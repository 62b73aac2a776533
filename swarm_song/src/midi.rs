// MIDI output for generated pieces.
//
// Converts chord and note events into a Standard MIDI File (SMF) Format 1:
// track 0 carries the tempo, track 1 the accompaniment chords (channel 0),
// track 2 the melody (channel 1). Both parts use acoustic grand piano.
//
// Resolution is 480 ticks per quarter note. Every event is a note-on for
// each of its pitches followed by the matching note-offs one duration later.
//
// Generated pitches are not guaranteed to fit in 0-127. A pitch that does not
// fit is left out of its event with a warning; if no pitch of an event fits,
// the event's time passes in silence so the rest of the part stays aligned.
//
// Uses the `midly` crate for MIDI writing.

use crate::error::RenderError;
use crate::render::{ChordEvent, MIN_TEMPO_BPM, NoteEvent, Renderer};
use crate::scale::is_midi_pitch;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u16 = 480;

/// General MIDI program for acoustic grand piano.
const PIANO_PROGRAM: u8 = 0;

/// Note-on velocity for every note.
const VELOCITY: u8 = 80;

/// Largest delta time a track event can carry.
const MAX_DELTA: u64 = (1 << 28) - 1;

/// Writes events to a `.mid` file.
#[derive(Debug, Clone)]
pub struct MidiRenderer {
    pub path: PathBuf,
}

impl MidiRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        MidiRenderer { path: path.into() }
    }
}

impl Renderer for MidiRenderer {
    fn render(
        &mut self,
        chords: &[ChordEvent],
        notes: &[NoteEvent],
        tempo_bpm: u16,
    ) -> Result<(), RenderError> {
        let bytes = render_to_bytes(chords, notes, tempo_bpm)?;
        write_file(&self.path, &bytes)?;
        info!(path = %self.path.display(), bytes = bytes.len(), "wrote MIDI file");
        Ok(())
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Encode events as SMF bytes.
pub fn render_to_bytes(
    chords: &[ChordEvent],
    notes: &[NoteEvent],
    tempo_bpm: u16,
) -> Result<Vec<u8>, RenderError> {
    let smf = events_to_smf(chords, notes, tempo_bpm)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

/// Build an in-memory SMF from the two event streams.
pub fn events_to_smf(
    chords: &[ChordEvent],
    notes: &[NoteEvent],
    tempo_bpm: u16,
) -> Result<Smf<'static>, RenderError> {
    if tempo_bpm < MIN_TEMPO_BPM {
        return Err(RenderError::TempoOutOfRange { bpm: tempo_bpm });
    }

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo track
    let tempo_microseconds = 60_000_000 / tempo_bpm as u32;
    smf.tracks.push(vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]);

    let ticks_per_quarter = TICKS_PER_QUARTER as u32;
    let chord_slots: Vec<(&[i64], u32)> = chords
        .iter()
        .map(|c| (c.pitches.as_slice(), c.duration.ticks(ticks_per_quarter)))
        .collect();
    smf.tracks.push(part_track(b"Accompaniment", u4::new(0), &chord_slots)?);

    let note_slots: Vec<(&[i64], u32)> = notes
        .iter()
        .map(|n| (std::slice::from_ref(&n.pitch), n.duration.ticks(ticks_per_quarter)))
        .collect();
    smf.tracks.push(part_track(b"Melody", u4::new(1), &note_slots)?);

    Ok(smf)
}

/// Build one part's track from `(pitches, length in ticks)` slots.
fn part_track(
    name: &'static [u8],
    channel: u4,
    slots: &[(&[i64], u32)],
) -> Result<Track<'static>, RenderError> {
    let mut track: Track<'static> = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(name)),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(PIANO_PROGRAM),
                },
            },
        },
    ];

    // Silence accumulated since the last event (skipped slots).
    let mut pending: u64 = 0;

    for (slot, &(pitches, ticks)) in slots.iter().enumerate() {
        let keys: Vec<u7> = pitches
            .iter()
            .filter_map(|&pitch| {
                if is_midi_pitch(pitch) {
                    Some(u7::new(pitch as u8))
                } else {
                    warn!(slot, pitch, "pitch outside MIDI range, leaving it silent");
                    None
                }
            })
            .collect();

        if keys.is_empty() {
            pending += ticks as u64;
            continue;
        }

        for (i, &key) in keys.iter().enumerate() {
            let delta = if i == 0 { delta(pending)? } else { u28::new(0) };
            track.push(TrackEvent {
                delta,
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOn {
                        key,
                        vel: u7::new(VELOCITY),
                    },
                },
            });
        }
        for (i, &key) in keys.iter().enumerate() {
            let delta = if i == 0 { delta(ticks as u64)? } else { u28::new(0) };
            track.push(TrackEvent {
                delta,
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOff {
                        key,
                        vel: u7::new(0),
                    },
                },
            });
        }
        pending = 0;
    }

    // Trailing silence still counts toward the part's length.
    track.push(TrackEvent {
        delta: delta(pending)?,
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    Ok(track)
}

fn delta(ticks: u64) -> Result<u28, RenderError> {
    if ticks > MAX_DELTA {
        return Err(RenderError::TickOverflow { ticks });
    }
    Ok(u28::new(ticks as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::NoteValue;

    fn note_ons(track: &Track) -> Vec<u8> {
        track
            .iter()
            .filter_map(|e| match e.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, .. },
                    ..
                } => Some(key.as_int()),
                _ => None,
            })
            .collect()
    }

    fn total_ticks(track: &Track) -> u32 {
        track.iter().map(|e| e.delta.as_int()).sum()
    }

    fn chord(pitches: &[i64]) -> ChordEvent {
        ChordEvent {
            pitches: pitches.to_vec(),
            duration: NoteValue::Quarter,
        }
    }

    fn note(pitch: i64) -> NoteEvent {
        NoteEvent {
            pitch,
            duration: NoteValue::Eighth,
        }
    }

    #[test]
    fn test_tracks_and_tempo() {
        let smf = events_to_smf(&[chord(&[60, 64, 67])], &[note(72), note(74)], 120).unwrap();
        // 1 tempo track + accompaniment + melody
        assert_eq!(smf.tracks.len(), 3);
        assert!(matches!(
            smf.tracks[0][0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(t)) if t.as_int() == 500_000
        ));
        assert_eq!(note_ons(&smf.tracks[1]), vec![60, 64, 67]);
        assert_eq!(note_ons(&smf.tracks[2]), vec![72, 74]);
        assert_eq!(total_ticks(&smf.tracks[1]), 480);
        assert_eq!(total_ticks(&smf.tracks[2]), 480);
    }

    #[test]
    fn test_out_of_range_pitches_are_silent_but_keep_time() {
        let chords = [chord(&[125, 129, 132]), chord(&[200, 204, 207])];
        let notes = [note(-4), note(72)];
        let smf = events_to_smf(&chords, &notes, 120).unwrap();

        assert_eq!(note_ons(&smf.tracks[1]), vec![125]);
        assert_eq!(total_ticks(&smf.tracks[1]), 960);

        assert_eq!(note_ons(&smf.tracks[2]), vec![72]);
        assert_eq!(total_ticks(&smf.tracks[2]), 480);
    }

    #[test]
    fn test_bytes_parse_back() {
        let chords: Vec<ChordEvent> = (0..16).map(|i| chord(&[48 + i, 52 + i, 55 + i])).collect();
        let notes: Vec<NoteEvent> = (0..32).map(|i| note(72 + i % 12)).collect();
        let bytes = render_to_bytes(&chords, &notes, 120).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 3);
        assert_eq!(note_ons(&smf.tracks[1]).len(), 48);
        assert_eq!(note_ons(&smf.tracks[2]).len(), 32);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let chords = [chord(&[60, 64, 67])];
        let notes = [note(72)];
        assert_eq!(
            render_to_bytes(&chords, &notes, 90).unwrap(),
            render_to_bytes(&chords, &notes, 90).unwrap()
        );
    }

    #[test]
    fn test_tempo_too_slow_rejected() {
        let err = events_to_smf(&[], &[], 3).err();
        assert!(matches!(err, Some(RenderError::TempoOutOfRange { bpm: 3 })));
    }
}
