//! Single-step hill-climb layered on the swarm search.
//!
//! With a small probability per particle and iteration, one random variable
//! is nudged by `U(-0.05, 0.05) * domain width`. The move is kept only if it
//! strictly improves fitness. Repeating this across iterations provides the
//! refinement; a single call never takes more than one step.

use super::fitness::FitnessEvaluator;
use super::types::Particle;
use crate::error::PsoError;
use rand::Rng;

const PERTURBATION_SCALE: f64 = 0.05;

/// Probabilistic local refinement of particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalSearch {
    probability: f64,
}

impl LocalSearch {
    /// Creates a hybridizer that fires with the given probability.
    pub fn new(probability: f64) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
        }
    }

    /// Rolls the trigger and, if it fires, attempts one refinement step.
    ///
    /// Returns `true` if the particle moved.
    pub fn maybe_refine<R: Rng>(
        &self,
        particle: &mut Particle,
        evaluator: &FitnessEvaluator<'_>,
        rng: &mut R,
    ) -> Result<bool, PsoError> {
        if !rng.random_bool(self.probability) {
            return Ok(false);
        }
        refine(particle, evaluator, rng)
    }
}

/// Perturbs one variable and keeps the result if fitness strictly improves.
///
/// The velocity is left untouched. Returns `true` if the particle moved.
pub fn refine<R: Rng>(
    particle: &mut Particle,
    evaluator: &FitnessEvaluator<'_>,
    rng: &mut R,
) -> Result<bool, PsoError> {
    let variables = &evaluator.problem().variables;
    if variables.is_empty() {
        return Ok(false);
    }

    let i = rng.random_range(0..variables.len());
    let var = &variables[i];
    let delta = rng.random_range(-PERTURBATION_SCALE..=PERTURBATION_SCALE) * var.domain.width();

    let mut candidate = particle.position.clone();
    candidate[i] = var.repair(candidate[i] + delta).0;
    if candidate[i] == particle.position[i] {
        return Ok(false);
    }

    let evaluation = evaluator.evaluate(&candidate)?;
    if evaluation.fitness > particle.fitness {
        particle.position = candidate;
        particle.apply_evaluation(evaluation);
        Ok(true)
    } else {
        Ok(false)
    }
}
