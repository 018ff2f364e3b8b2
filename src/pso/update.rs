//! Particle initialization and the velocity/position update.

use super::adaptive::Coefficients;
use super::fitness::FitnessEvaluator;
use super::types::{Particle, Swarm};
use crate::error::PsoError;
use crate::problem::Variable;
use rand::Rng;

/// Creates a particle at a uniformly random, type-correct position.
pub fn initialize_particle<R: Rng>(
    id: usize,
    evaluator: &FitnessEvaluator<'_>,
    rng: &mut R,
) -> Result<Particle, PsoError> {
    let variables = &evaluator.problem().variables;
    let position: Vec<f64> = variables.iter().map(|v| v.sample(rng)).collect();
    let velocity: Vec<f64> = variables.iter().map(|v| v.initial_velocity(rng)).collect();
    let evaluation = evaluator.evaluate(&position)?;

    let mut particle = Particle::new(id, position, velocity, evaluation);
    refresh_telemetry(&mut particle, variables);
    Ok(particle)
}

/// Creates `size` random particles and derives the global best.
pub fn initialize_swarm<R: Rng>(
    evaluator: &FitnessEvaluator<'_>,
    size: usize,
    rng: &mut R,
) -> Result<Swarm, PsoError> {
    let particles = (0..size)
        .map(|id| initialize_particle(id, evaluator, rng))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Swarm::new(particles))
}

/// Moves a particle one step.
///
/// For each variable:
///
/// ```text
/// v = w*v + c1*r1*(pbest - x) + c2*r2*(gbest - x)
/// v = clamp(v, -vmax, vmax)
/// x = repair(x + v)
/// ```
///
/// Repair clamps to the domain, then snaps to the variable type. Hitting a
/// bound zeroes that variable's velocity. The caller re-evaluates fitness.
pub fn move_particle<R: Rng>(
    particle: &mut Particle,
    global_best: &[f64],
    coefficients: &Coefficients,
    variables: &[Variable],
    rng: &mut R,
) {
    let limit = coefficients.velocity_limit;
    for (i, var) in variables.iter().enumerate() {
        let r1: f64 = rng.random();
        let r2: f64 = rng.random();
        let x = particle.position[i];

        let cognitive = coefficients.cognitive * r1 * (particle.best_position[i] - x);
        let social = coefficients.social * r2 * (global_best[i] - x);
        let velocity =
            (coefficients.inertia * particle.velocity[i] + cognitive + social).clamp(-limit, limit);

        let (repaired, hit_wall) = var.repair(x + velocity);
        particle.position[i] = repaired;
        particle.velocity[i] = if hit_wall { 0.0 } else { velocity };
    }
    refresh_telemetry(particle, variables);
}

/// Recomputes the exploration/exploitation rates from the current velocity.
pub(crate) fn refresh_telemetry(particle: &mut Particle, variables: &[Variable]) {
    let mut total = 0.0;
    let mut counted = 0usize;
    for (var, v) in variables.iter().zip(&particle.velocity) {
        let width = var.domain.width();
        if width > 0.0 {
            total += (v.abs() / width).min(1.0);
            counted += 1;
        }
    }
    let exploration = if counted == 0 {
        0.0
    } else {
        total / counted as f64
    };
    particle.exploration_rate = exploration;
    particle.exploitation_rate = 1.0 - exploration;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Objective, Problem, VariableKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mixed_problem() -> crate::problem::CompiledProblem {
        Problem::new("mixed")
            .with_variable(Variable::continuous("c", -5.0, 5.0))
            .with_variable(Variable::discrete("d", 0.0, 3.0, 0.5))
            .with_variable(Variable::integer("i", -10, 10))
            .with_variable(Variable::binary("b"))
            .with_objective(Objective::maximize("sum"))
            .compile()
            .unwrap()
    }

    fn coefficients(limit: f64) -> Coefficients {
        Coefficients {
            inertia: 0.9,
            cognitive: 2.0,
            social: 2.0,
            velocity_limit: limit,
        }
    }

    #[test]
    fn test_initialize_swarm_type_correct() {
        let problem = mixed_problem();
        let evaluator = FitnessEvaluator::new(&problem);
        let mut rng = StdRng::seed_from_u64(11);
        let swarm = initialize_swarm(&evaluator, 25, &mut rng).unwrap();

        assert_eq!(swarm.len(), 25);
        for p in &swarm.particles {
            assert_eq!(p.best_position, p.position);
            assert_eq!(p.best_fitness, p.fitness);
            assert_eq!(p.iterations_since_improvement, 0);
            for (var, &x) in problem.variables.iter().zip(&p.position) {
                assert!(var.is_valid_value(x));
            }
        }
        let max = swarm
            .particles
            .iter()
            .map(|p| p.best_fitness)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(swarm.global_best_fitness, max);
    }

    #[test]
    fn test_move_keeps_domain_and_type() {
        let problem = mixed_problem();
        let evaluator = FitnessEvaluator::new(&problem);
        let mut rng = StdRng::seed_from_u64(5);
        let mut swarm = initialize_swarm(&evaluator, 10, &mut rng).unwrap();
        let gbest = vec![5.0, 3.0, 10.0, 1.0];

        for _ in 0..50 {
            for p in &mut swarm.particles {
                move_particle(p, &gbest, &coefficients(100.0), &problem.variables, &mut rng);
                for (var, &x) in problem.variables.iter().zip(&p.position) {
                    assert!(var.is_valid_value(x), "{:?} got {x}", var.kind);
                }
            }
        }
    }

    #[test]
    fn test_velocity_clamped() {
        let problem = Problem::new("wide")
            .with_variable(Variable::continuous("x", -1000.0, 1000.0))
            .compile()
            .unwrap();
        let evaluator = FitnessEvaluator::new(&problem);
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = initialize_particle(0, &evaluator, &mut rng).unwrap();
        p.position = vec![-900.0];
        p.best_position = vec![900.0];

        move_particle(&mut p, &[900.0], &coefficients(2.5), &problem.variables, &mut rng);
        assert!(p.velocity[0].abs() <= 2.5);
        assert!(p.position[0] >= -902.5 && p.position[0] <= -897.5);
    }

    #[test]
    fn test_wall_hit_zeroes_velocity() {
        let problem = Problem::new("wall")
            .with_variable(Variable::continuous("x", 0.0, 1.0))
            .compile()
            .unwrap();
        let evaluator = FitnessEvaluator::new(&problem);
        let mut rng = StdRng::seed_from_u64(2);
        let mut p = initialize_particle(0, &evaluator, &mut rng).unwrap();
        p.position = vec![0.99];
        p.best_position = vec![0.99];
        p.velocity = vec![5.0];

        let c = Coefficients {
            inertia: 1.0,
            cognitive: 0.0,
            social: 0.0,
            velocity_limit: 10.0,
        };
        move_particle(&mut p, &[0.99], &c, &problem.variables, &mut rng);
        assert_eq!(p.position, vec![1.0]);
        assert_eq!(p.velocity, vec![0.0]);
        assert_eq!(p.exploration_rate, 0.0);
    }

    #[test]
    fn test_binary_rounding() {
        let problem = Problem::new("bin")
            .with_variable(Variable::binary("b"))
            .compile()
            .unwrap();
        assert_eq!(problem.variables[0].kind, VariableKind::Binary);
        let evaluator = FitnessEvaluator::new(&problem);
        let mut rng = StdRng::seed_from_u64(9);
        let mut p = initialize_particle(0, &evaluator, &mut rng).unwrap();
        p.position = vec![0.0];
        p.velocity = vec![0.6];
        let c = Coefficients {
            inertia: 1.0,
            cognitive: 0.0,
            social: 0.0,
            velocity_limit: 10.0,
        };
        move_particle(&mut p, &[0.0], &c, &problem.variables, &mut rng);
        assert_eq!(p.position, vec![1.0]);
    }
}
