//! Particle and swarm state.

use super::fitness::Evaluation;

/// One candidate solution in the swarm.
///
/// Positions and velocities are dense vectors in the problem's variable
/// order. After every update each position entry lies inside its
/// variable's domain and is type-correct (rounded or stepped where the
/// variable kind requires it).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Particle {
    /// Slot index in the swarm.
    pub id: usize,
    /// Current position.
    pub position: Vec<f64>,
    /// Current velocity.
    pub velocity: Vec<f64>,
    /// Fitness of the current position.
    pub fitness: f64,
    /// Best position this particle has visited.
    pub best_position: Vec<f64>,
    /// Fitness at `best_position`. Never decreases.
    pub best_fitness: f64,
    /// Objective values at the current position.
    pub objective_values: Vec<f64>,
    /// Constraint values at the current position.
    pub constraint_values: Vec<f64>,
    /// Whether the current position satisfies every constraint.
    pub feasible: bool,
    /// Messages for failing constraints at the current position.
    pub violations: Vec<String>,
    /// Iterations since `best_fitness` last improved.
    pub iterations_since_improvement: usize,
    /// Mean velocity magnitude relative to domain width, in `[0, 1]`.
    pub exploration_rate: f64,
    /// `1 - exploration_rate`.
    pub exploitation_rate: f64,
}

impl Particle {
    /// Creates a particle whose personal best is its starting point.
    pub fn new(id: usize, position: Vec<f64>, velocity: Vec<f64>, evaluation: Evaluation) -> Self {
        let mut particle = Self {
            id,
            best_position: position.clone(),
            position,
            velocity,
            fitness: evaluation.fitness,
            best_fitness: evaluation.fitness,
            objective_values: Vec::new(),
            constraint_values: Vec::new(),
            feasible: true,
            violations: Vec::new(),
            iterations_since_improvement: 0,
            exploration_rate: 1.0,
            exploitation_rate: 0.0,
        };
        particle.apply_evaluation(evaluation);
        particle
    }

    /// Stores the scores of the current position.
    pub fn apply_evaluation(&mut self, evaluation: Evaluation) {
        self.fitness = evaluation.fitness;
        self.objective_values = evaluation.objective_values;
        self.constraint_values = evaluation.constraint_values;
        self.feasible = evaluation.feasible;
        self.violations = evaluation.violations;
    }

    /// Promotes the current position to personal best if it is strictly better.
    ///
    /// Returns `true` on improvement.
    pub fn update_personal_best(&mut self) -> bool {
        if self.fitness > self.best_fitness {
            self.best_fitness = self.fitness;
            self.best_position.clone_from(&self.position);
            self.iterations_since_improvement = 0;
            true
        } else {
            self.iterations_since_improvement += 1;
            false
        }
    }
}

/// The particle set plus aggregate statistics.
///
/// The swarm is owned by a single run and mutated only by its runner.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Swarm {
    pub particles: Vec<Particle>,
    /// Position of the best personal best in the swarm.
    pub global_best_position: Vec<f64>,
    /// `max(p.best_fitness)` over all particles.
    pub global_best_fitness: f64,
    /// Mean current fitness.
    pub average_fitness: f64,
    /// Mean pairwise Euclidean distance between positions.
    pub diversity: f64,
    /// `1 - variance / (mean^2 + 1)` of current fitness, clamped to `[0, 1]`.
    pub convergence: f64,
    /// Same quantity as `convergence`, reported separately.
    pub stability: f64,
}

impl Swarm {
    /// Wraps particles and derives the global best from their personal bests.
    pub fn new(particles: Vec<Particle>) -> Self {
        let mut swarm = Self {
            particles,
            global_best_position: Vec::new(),
            global_best_fitness: f64::NEG_INFINITY,
            average_fitness: 0.0,
            diversity: 0.0,
            convergence: 0.0,
            stability: 0.0,
        };
        swarm.update_global_best();
        swarm
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// The particle holding the swarm's best personal best.
    pub fn best_particle(&self) -> Option<&Particle> {
        self.particles.iter().max_by(|a, b| {
            a.best_fitness
                .partial_cmp(&b.best_fitness)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Recomputes the global best from all personal bests.
    ///
    /// Returns `true` if the global best fitness increased.
    pub fn update_global_best(&mut self) -> bool {
        let Some(best) = self.best_particle() else {
            return false;
        };
        let improved = best.best_fitness > self.global_best_fitness;
        let (fitness, position) = (best.best_fitness, best.best_position.clone());
        self.global_best_fitness = fitness;
        self.global_best_position = position;
        improved
    }

    /// Fraction of particles whose current position is feasible.
    pub fn feasible_fraction(&self) -> f64 {
        if self.particles.is_empty() {
            return 0.0;
        }
        let feasible = self.particles.iter().filter(|p| p.feasible).count();
        feasible as f64 / self.particles.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(fitness: f64) -> Evaluation {
        Evaluation {
            objective_values: vec![fitness],
            constraint_values: Vec::new(),
            fitness,
            feasible: true,
            violations: Vec::new(),
        }
    }

    #[test]
    fn test_personal_best_monotonic() {
        let mut p = Particle::new(0, vec![1.0], vec![0.0], eval(10.0));
        assert_eq!(p.best_fitness, 10.0);

        p.position = vec![2.0];
        p.apply_evaluation(eval(5.0));
        assert!(!p.update_personal_best());
        assert_eq!(p.best_fitness, 10.0);
        assert_eq!(p.best_position, vec![1.0]);
        assert_eq!(p.iterations_since_improvement, 1);

        p.position = vec![3.0];
        p.apply_evaluation(eval(12.0));
        assert!(p.update_personal_best());
        assert_eq!(p.best_position, vec![3.0]);
        assert_eq!(p.iterations_since_improvement, 0);
    }

    #[test]
    fn test_global_best_is_max_personal_best() {
        let swarm = Swarm::new(vec![
            Particle::new(0, vec![1.0], vec![0.0], eval(3.0)),
            Particle::new(1, vec![2.0], vec![0.0], eval(8.0)),
            Particle::new(2, vec![3.0], vec![0.0], eval(-1.0)),
        ]);
        assert_eq!(swarm.global_best_fitness, 8.0);
        assert_eq!(swarm.global_best_position, vec![2.0]);
        assert_eq!(swarm.best_particle().map(|p| p.id), Some(1));
    }

    #[test]
    fn test_feasible_fraction() {
        let mut infeasible = eval(0.0);
        infeasible.feasible = false;
        infeasible.violations.push("c".into());
        let swarm = Swarm::new(vec![
            Particle::new(0, vec![], vec![], eval(0.0)),
            Particle::new(1, vec![], vec![], infeasible),
        ]);
        assert!((swarm.feasible_fraction() - 0.5).abs() < 1e-12);
    }
}
