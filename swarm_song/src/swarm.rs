// Particle swarm optimization over integer pitch vectors.
//
// One generic engine serves both generator stages; it is parameterized by the
// vector dimension, the initial position band, and a `Fitness` implementation
// (higher is better). The chord stage instantiates it with 16 dimensions and
// the melody stage with 32.
//
// Each particle carries an integer position, a real velocity, and its
// personal best. Per sweep, for every particle in index order and every
// component d:
//
//   v[d] = 0.5 v[d] + 2 r1 (pbest[d] - x[d]) + 2 r2 (gbest[d] - x[d])
//   x[d] = trunc(x[d] + v[d])
//
// with r1, r2 fresh uniform draws in [0, 1). Truncation, not rounding: a
// small positive velocity leaves the position where it is. Positions are
// never clamped back into the initial band.
//
// The global best is updated the moment a particle's personal best beats it,
// so particles later in the same sweep are already pulled toward it. Sweeps
// must therefore stay sequential; processing particles in parallel would
// change which global best each one sees and hence the search trajectory.
//
// The convergence threshold is checked once before each sweep.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use swarm_song_prng::SongRng;
use tracing::{debug, info};

/// Inertia weight applied to the previous velocity.
pub const INERTIA: f64 = 0.5;

/// Acceleration toward the particle's own best.
pub const COGNITIVE: f64 = 2.0;

/// Acceleration toward the swarm's best.
pub const SOCIAL: f64 = 2.0;

/// Largest swarm a config may ask for. Ten times the default population.
pub const MAX_PARTICLES: usize = 50_000;

/// Scores a candidate position. Higher is better.
pub trait Fitness {
    fn evaluate(&self, position: &[i64]) -> f64;
}

impl<F> Fitness for F
where
    F: Fn(&[i64]) -> f64,
{
    fn evaluate(&self, position: &[i64]) -> f64 {
        self(position)
    }
}

/// Shape and stopping rules of one swarm search.
#[derive(Debug, Clone, PartialEq)]
pub struct SwarmConfig {
    /// Number of particles in the swarm.
    pub particle_count: usize,
    /// Length of every position and velocity vector.
    pub dimension: usize,
    /// Smallest initial position component.
    pub lower_bound: i64,
    /// Width of the initial band: components start in
    /// `[lower_bound, lower_bound + position_range)`.
    pub position_range: i64,
    /// Maximum number of sweeps.
    pub iteration_cap: usize,
    /// Stop once the global best reaches this fitness.
    pub convergence_threshold: f64,
}

impl SwarmConfig {
    /// Reject shapes the engine cannot initialize.
    pub fn validate(&self, stage: &'static str) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::NoParticles { stage });
        }
        if self.particle_count > MAX_PARTICLES {
            return Err(ConfigError::TooManyParticles {
                stage,
                count: self.particle_count,
                max: MAX_PARTICLES,
            });
        }
        if self.dimension == 0 {
            return Err(ConfigError::NoDimensions { stage });
        }
        if self.position_range <= 0 || self.lower_bound.checked_add(self.position_range).is_none() {
            return Err(ConfigError::EmptyRange { stage });
        }
        if !self.convergence_threshold.is_finite() {
            return Err(ConfigError::BadThreshold {
                stage,
                threshold: self.convergence_threshold,
            });
        }
        Ok(())
    }
}

/// One candidate solution with its velocity and personal best.
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec<i64>,
    pub velocity: Vec<f64>,
    /// Fitness of the current position.
    pub fitness: f64,
    pub best_position: Vec<i64>,
    pub best_fitness: f64,
}

impl Particle {
    /// Draw a random particle: all position components first, then all
    /// velocity components in [0, 1).
    fn spawn(config: &SwarmConfig, fitness: &impl Fitness, rng: &mut SongRng) -> Self {
        let high = config.lower_bound + config.position_range;
        let position: Vec<i64> = (0..config.dimension)
            .map(|_| rng.range_i64(config.lower_bound, high))
            .collect();
        let velocity: Vec<f64> = (0..config.dimension).map(|_| rng.next_f64()).collect();
        let value = fitness.evaluate(&position);
        Particle {
            best_position: position.clone(),
            best_fitness: value,
            position,
            velocity,
            fitness: value,
        }
    }

    /// Apply one velocity/position update toward `global`.
    fn advance(&mut self, global: &GlobalBest, rng: &mut SongRng) {
        let components = self
            .position
            .iter_mut()
            .zip(self.velocity.iter_mut())
            .zip(self.best_position.iter().zip(&global.position));
        for ((x, v), (&pbest, &gbest)) in components {
            let here = *x as f64;
            let r1 = rng.next_f64();
            let r2 = rng.next_f64();
            *v = INERTIA * *v
                + COGNITIVE * r1 * (pbest as f64 - here)
                + SOCIAL * r2 * (gbest as f64 - here);
            *x = advance_position(*x, *v);
        }
    }
}

/// Move a position component by a real velocity, truncating toward zero.
///
/// `as` saturates at the `i64` bounds, so a diverging velocity cannot wrap.
pub fn advance_position(position: i64, velocity: f64) -> i64 {
    (position as f64 + velocity) as i64
}

/// The best position any particle has reached so far.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalBest {
    pub position: Vec<i64>,
    pub fitness: f64,
}

/// Summary of a finished search, kept with the composition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Sweeps actually run.
    pub iterations: usize,
    /// Whether the final global best reached the convergence threshold.
    pub converged: bool,
    /// Fitness of the returned position.
    pub fitness: f64,
}

/// Result of `Swarm::run`.
#[derive(Debug, Clone)]
pub struct SwarmOutcome {
    pub position: Vec<i64>,
    pub fitness: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Global-best fitness after initialization, then after every sweep.
    pub history: Vec<f64>,
}

impl SwarmOutcome {
    pub fn stats(&self) -> SearchStats {
        SearchStats {
            iterations: self.iterations,
            converged: self.converged,
            fitness: self.fitness,
        }
    }
}

/// A swarm of particles searching one fitness landscape.
pub struct Swarm<F: Fitness> {
    stage: &'static str,
    config: SwarmConfig,
    fitness: F,
    particles: Vec<Particle>,
    global: GlobalBest,
    history: Vec<f64>,
}

impl<F: Fitness> Swarm<F> {
    /// Validate `config` and spawn every particle.
    ///
    /// The first particle seeds the global best; a later particle replaces
    /// it only with strictly greater fitness, so ties go to the earliest.
    pub fn new(
        stage: &'static str,
        config: SwarmConfig,
        fitness: F,
        rng: &mut SongRng,
    ) -> Result<Self, ConfigError> {
        config.validate(stage)?;

        let mut particles = Vec::with_capacity(config.particle_count);
        let mut global: Option<GlobalBest> = None;
        for _ in 0..config.particle_count {
            let particle = Particle::spawn(&config, &fitness, rng);
            if global.as_ref().is_none_or(|g| particle.best_fitness > g.fitness) {
                global = Some(GlobalBest {
                    position: particle.best_position.clone(),
                    fitness: particle.best_fitness,
                });
            }
            particles.push(particle);
        }
        let global = global.ok_or(ConfigError::NoParticles { stage })?;

        info!(
            stage,
            particles = config.particle_count,
            dimension = config.dimension,
            fitness = global.fitness,
            "swarm initialized"
        );

        Ok(Swarm {
            stage,
            history: vec![global.fitness],
            config,
            fitness,
            particles,
            global,
        })
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn global_best(&self) -> &GlobalBest {
        &self.global
    }

    /// Update every particle once, in index order.
    pub fn sweep(&mut self, rng: &mut SongRng) {
        let Swarm {
            fitness,
            particles,
            global,
            ..
        } = self;

        for particle in particles.iter_mut() {
            particle.advance(global, rng);

            particle.fitness = fitness.evaluate(&particle.position);
            if particle.fitness > particle.best_fitness {
                particle.best_fitness = particle.fitness;
                particle.best_position.copy_from_slice(&particle.position);
            }

            // Visible to the particles after this one in the same sweep.
            if particle.best_fitness > global.fitness {
                global.fitness = particle.best_fitness;
                global.position.copy_from_slice(&particle.best_position);
            }
        }

        self.history.push(self.global.fitness);
    }

    /// Sweep until the threshold is reached or the iteration cap runs out.
    pub fn run(mut self, rng: &mut SongRng) -> SwarmOutcome {
        let threshold = self.config.convergence_threshold;
        let mut iterations = 0;
        while iterations < self.config.iteration_cap {
            if self.global.fitness >= threshold {
                break;
            }
            self.sweep(rng);
            iterations += 1;
            debug!(
                stage = self.stage,
                iteration = iterations,
                fitness = self.global.fitness,
                "sweep finished"
            );
        }

        let converged = self.global.fitness >= threshold;
        info!(
            stage = self.stage,
            iterations,
            converged,
            fitness = self.global.fitness,
            "swarm finished"
        );

        SwarmOutcome {
            position: self.global.position,
            fitness: self.global.fitness,
            iterations,
            converged,
            history: self.history,
        }
    }
}
