//! Swarm-wide metrics, convergence and stagnation detection.
//!
//! All metrics are recomputed from the full particle set once per
//! iteration rather than maintained incrementally.

use super::config::PsoConfig;
use super::types::{Particle, Swarm};

/// `1 - variance / (mean^2 + 1)` of the particles' current fitness,
/// clamped to `[0, 1]`.
///
/// Fitness spread wide relative to its mean would drive the raw ratio
/// negative. Reported as both the swarm's convergence and its stability.
pub fn fitness_agreement(particles: &[Particle]) -> f64 {
    if particles.is_empty() {
        return 1.0;
    }
    let n = particles.len() as f64;
    let mean = particles.iter().map(|p| p.fitness).sum::<f64>() / n;
    let variance = particles
        .iter()
        .map(|p| (p.fitness - mean).powi(2))
        .sum::<f64>()
        / n;
    (1.0 - variance / (mean * mean + 1.0)).clamp(0.0, 1.0)
}

/// Mean pairwise Euclidean distance between particle positions.
///
/// Quadratic in the swarm size. A swarm with fewer than two particles has
/// zero diversity.
pub fn diversity(particles: &[Particle]) -> f64 {
    let n = particles.len();
    if n < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for (i, a) in particles.iter().enumerate() {
        for b in &particles[i + 1..] {
            total += euclidean(&a.position, &b.position);
        }
    }
    let pairs = (n * (n - 1) / 2) as f64;
    total / pairs
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Recomputes average fitness, diversity, convergence and stability.
pub fn refresh_metrics(swarm: &mut Swarm) {
    let n = swarm.particles.len();
    swarm.average_fitness = if n == 0 {
        0.0
    } else {
        swarm.particles.iter().map(|p| p.fitness).sum::<f64>() / n as f64
    };
    swarm.diversity = diversity(&swarm.particles);
    let agreement = fitness_agreement(&swarm.particles);
    swarm.convergence = agreement;
    swarm.stability = agreement;
}

/// Whether the swarm's convergence metric exceeds `threshold`.
///
/// A threshold of 0 or below is met by any swarm.
pub fn is_converged(swarm: &Swarm, threshold: f64) -> bool {
    if threshold <= 0.0 {
        swarm.convergence >= threshold
    } else {
        swarm.convergence > threshold
    }
}

/// Counts consecutive stagnant iterations and signals when to restart.
///
/// An iteration is stagnant when the gap between the global best fitness
/// and the average fitness is below the tolerance. A non-stagnant
/// iteration resets the counter.
#[derive(Debug, Clone)]
pub struct StagnationMonitor {
    tolerance: f64,
    limit: usize,
    counter: usize,
}

impl StagnationMonitor {
    pub fn new(config: &PsoConfig) -> Self {
        Self {
            tolerance: config.stagnation_tolerance,
            limit: config.stagnation_limit,
            counter: 0,
        }
    }

    /// Consecutive stagnant iterations observed so far.
    pub fn counter(&self) -> usize {
        self.counter
    }

    /// Records one iteration. Returns `true` when a restart is due.
    pub fn observe(&mut self, swarm: &Swarm) -> bool {
        if swarm.global_best_fitness - swarm.average_fitness < self.tolerance {
            self.counter += 1;
        } else {
            self.counter = 0;
        }
        self.limit > 0 && self.counter > self.limit
    }

    /// Clears the counter after a restart.
    pub fn reset(&mut self) {
        self.counter = 0;
    }
}
