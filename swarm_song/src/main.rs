// swarm_song generator, CLI entry point.
//
// Searches for a chord progression, then a melody over it, and writes both
// to a MIDI file. The pipeline: chord swarm → triads → melody swarm → MIDI.
//
// Usage:
//   cargo run -p swarm_song -- [output.mid] [--seed N] [--config FILE] [--json FILE]
//
// With no flags it uses the built-in settings, a
// clock-derived seed, output to melody.mid. Set RUST_LOG=debug to see every
// sweep.

use std::path::Path;
use std::process;
use std::time::Instant;
use swarm_song::compose::{Composition, compose};
use swarm_song::config::GeneratorConfig;
use swarm_song::midi::MidiRenderer;
use swarm_song_prng::clock_seed;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let start = Instant::now();
    let args: Vec<String> = std::env::args().collect();

    let output_path = args
        .get(1)
        .filter(|s| !s.starts_with("--"))
        .map(|s| s.as_str())
        .unwrap_or("melody.mid");
    let config_path: Option<String> = parse_flag(&args, "--config");
    let json_path: Option<String> = parse_flag(&args, "--json");

    let mut config = match &config_path {
        Some(path) => match GeneratorConfig::load(Path::new(path)) {
            Ok(c) => {
                info!(path = %path, "loaded config");
                c
            }
            Err(e) => {
                error!("failed to load config {}: {}", path, e);
                process::exit(1);
            }
        },
        None => GeneratorConfig::default(),
    };
    if let Some(seed) = parse_flag(&args, "--seed") {
        config.seed = Some(seed);
    }
    let seed = config.seed.unwrap_or_else(clock_seed);

    info!(
        output = output_path,
        seed,
        particles = config.particle_count,
        iterations = config.iteration_cap,
        tempo = config.tempo_bpm,
        "swarm_song generator"
    );

    let piece = match compose(&config, seed) {
        Ok(p) => p,
        Err(e) => {
            error!("invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let mut renderer = MidiRenderer::new(output_path);
    if let Err(e) = piece.render(&mut renderer) {
        error!("failed to write MIDI: {}", e);
        process::exit(1);
    }

    if let Some(path) = json_path {
        if let Err(e) = write_summary(&piece, Path::new(&path)) {
            error!("failed to write summary {}: {}", path, e);
            process::exit(1);
        }
        info!(path = %path, "wrote summary");
    }

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        chord_fitness = piece.chord_search.fitness,
        melody_fitness = piece.melody_search.fitness,
        "done, replay with --seed {}",
        seed
    );
}

fn write_summary(piece: &Composition, path: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(piece)?;
    std::fs::write(path, json)
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
