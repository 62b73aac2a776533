// Error types for configuration loading and MIDI rendering.
//
// The search itself never fails: every vector it builds is valid by
// construction. Errors only come from the edges of the system, namely a
// user-supplied JSON config that describes a degenerate swarm, and the
// filesystem when the rendered file is written.

use thiserror::Error;

/// Problems with a `GeneratorConfig` or `SwarmConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{stage} swarm needs at least one particle")]
    NoParticles { stage: &'static str },

    #[error("{stage} swarm asks for {count} particles, at most {max} are allowed")]
    TooManyParticles {
        stage: &'static str,
        count: usize,
        max: usize,
    },

    #[error("{stage} swarm has zero-dimensional positions")]
    NoDimensions { stage: &'static str },

    #[error("{stage} swarm has an empty initial position range")]
    EmptyRange { stage: &'static str },

    #[error("{stage} convergence threshold must be finite, got {threshold}")]
    BadThreshold { stage: &'static str, threshold: f64 },

    #[error("tempo of {bpm} BPM is too slow to encode")]
    TempoOutOfRange { bpm: u16 },
}

/// Problems while turning events into a sequence file.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write sequence file: {0}")]
    Io(#[from] std::io::Error),

    #[error("tempo of {bpm} BPM is too slow to encode")]
    TempoOutOfRange { bpm: u16 },

    #[error("event stream too long: {ticks} ticks exceeds the MIDI delta limit")]
    TickOverflow { ticks: u64 },
}
