//! PSO iteration loop.
//!
//! [`PsoRunner`] drives a run through its phases:
//! initializing → iterating → converged | exhausted → finalizing → done.
//!
//! Within an iteration every particle reads the swarm best frozen at the
//! end of the previous iteration. Swarm metrics, parameter adaptation and
//! the stagnation decision happen only after all particles have moved.

use super::adaptive::{AdaptiveController, Coefficients};
use super::config::{PsoConfig, Topology};
use super::fitness::FitnessEvaluator;
use super::local_search::LocalSearch;
use super::monitor::{is_converged, refresh_metrics, StagnationMonitor};
use super::report::{
    recommend, IterationStats, PerformanceMetrics, Recommendation, RunSummary, Termination,
};
use super::types::{Particle, Swarm};
use super::update::{initialize_swarm, move_particle};
use crate::error::PsoError;
use crate::problem::Problem;
use crate::sink::{dispatch, EventPublisher, ResultSink};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Phase of a run, reported to [`RunObserver::on_phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Initializing,
    Iterating,
    /// The convergence threshold was exceeded.
    Converged,
    /// The iteration or time budget ran out, or the run was cancelled.
    Exhausted,
    Finalizing,
    Done,
}

/// Receives progress callbacks during a run.
///
/// All methods default to no-ops.
pub trait RunObserver {
    fn on_phase(&mut self, _phase: RunPhase) {}

    /// Called at the end of every iteration, after any restart.
    fn on_iteration(&mut self, _stats: &IterationStats, _swarm: &Swarm) {}

    /// Called with the stagnant swarm just before it is reinitialized.
    fn on_restart(&mut self, _iteration: usize, _swarm: &Swarm) {}
}

/// Optional collaborators for a run.
#[derive(Default)]
pub struct RunHooks<'a> {
    /// Checked once per iteration; setting it stops the run early.
    pub cancel: Option<Arc<AtomicBool>>,
    pub observer: Option<&'a mut dyn RunObserver>,
    pub sink: Option<&'a dyn ResultSink>,
    pub publisher: Option<&'a dyn EventPublisher>,
}

/// Result of a PSO run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PsoResult {
    /// Problem name.
    pub problem: String,

    /// Seed of the run's random source.
    pub seed: u64,

    /// Best solution seen during the whole run, including before restarts.
    ///
    /// Its position is the best position and its evaluation caches describe
    /// that position.
    pub best: Particle,

    /// Fitness of `best`.
    pub best_fitness: f64,

    /// `best.position` keyed by variable id.
    pub best_values: Vec<(String, f64)>,

    /// The swarm as it was when the run stopped.
    pub swarm: Swarm,

    pub summary: RunSummary,

    pub metrics: PerformanceMetrics,

    pub recommendations: Vec<Recommendation>,

    /// Per-iteration statistics.
    pub history: Vec<IterationStats>,

    /// Run-wide best fitness, initial value followed by one entry per iteration.
    pub fitness_history: Vec<f64>,
}

impl PsoResult {
    /// Whether the run was cancelled externally.
    pub fn cancelled(&self) -> bool {
        self.summary.termination == Termination::Cancelled
    }
}

/// Executes the particle swarm loop.
///
/// # Usage
///
/// ```
/// use u_swarm::problem::{Objective, Problem, Variable};
/// use u_swarm::pso::{PsoConfig, PsoRunner};
///
/// let problem = Problem::new("demo")
///     .with_variable(Variable::continuous("x", 0.0, 10.0))
///     .with_objective(Objective::maximize("x").with_term("x", 1.0));
/// let config = PsoConfig::fast().with_seed(42);
///
/// let result = PsoRunner::run(&problem, &config).unwrap();
/// assert!(result.best_fitness > 0.0);
/// ```
pub struct PsoRunner;

impl PsoRunner {
    /// Runs the optimizer.
    ///
    /// # Errors
    /// Returns the first definitional or evaluation error encountered.
    pub fn run(problem: &Problem, config: &PsoConfig) -> Result<PsoResult, PsoError> {
        Self::run_with_hooks(problem, config, RunHooks::default())
    }

    /// Runs the optimizer with an optional cancellation token.
    ///
    /// If the flag is set, the run stops before the next iteration and
    /// returns the best solution found so far.
    pub fn run_with_cancel(
        problem: &Problem,
        config: &PsoConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<PsoResult, PsoError> {
        Self::run_with_hooks(
            problem,
            config,
            RunHooks {
                cancel,
                ..RunHooks::default()
            },
        )
    }

    /// Runs the optimizer with observers and result collaborators.
    pub fn run_with_hooks(
        problem: &Problem,
        config: &PsoConfig,
        mut hooks: RunHooks<'_>,
    ) -> Result<PsoResult, PsoError> {
        let started = Instant::now();
        let mut observer = hooks.observer.take();

        // Initializing
        enter_phase(RunPhase::Initializing, &mut observer);
        config.validate()?;
        let compiled = problem.compile()?;
        let evaluator = FitnessEvaluator::new(&compiled);

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        if config.topology != Topology::Global {
            debug!(topology = ?config.topology, "topology treated as global");
        }
        info!(
            problem = %compiled.name,
            variables = compiled.dimension(),
            swarm_size = config.swarm_size,
            max_iterations = config.max_iterations,
            seed,
            "starting particle swarm run"
        );

        let mut swarm = initialize_swarm(&evaluator, config.swarm_size, &mut rng)?;
        refresh_metrics(&mut swarm);

        let mut coefficients = Coefficients::from_config(config);
        let adaptive = AdaptiveController::new(config);
        let local_search = config
            .local_search
            .then(|| LocalSearch::new(config.local_search_probability));
        let mut stagnation = StagnationMonitor::new(config);
        let deadline = config.time_limit_ms.map(Duration::from_millis);

        let mut elite = Elite::default();
        elite.absorb(&swarm);
        let initial_best_fitness = elite.fitness;
        let initial_convergence = swarm.convergence;

        let capacity = config.max_iterations.min(HISTORY_PREALLOC);
        let mut history = Vec::with_capacity(if config.record_history { capacity } else { 0 });
        let mut fitness_history = Vec::with_capacity(capacity + 1);
        fitness_history.push(elite.fitness);
        let mut iteration = 0usize;
        let mut restarts = 0usize;
        let mut improving_iterations = 0usize;

        // Iterating
        enter_phase(RunPhase::Iterating, &mut observer);
        let termination = loop {
            if let Some(ref flag) = hooks.cancel {
                if flag.load(Ordering::Relaxed) {
                    break Termination::Cancelled;
                }
            }
            if iteration >= config.max_iterations {
                break Termination::IterationLimit;
            }
            if deadline.is_some_and(|limit| started.elapsed() >= limit) {
                break Termination::TimeLimit;
            }
            iteration += 1;

            // One sub-seed per particle keeps trajectories independent of
            // the order in which particles are processed.
            let seeds: Vec<u64> = (0..swarm.len()).map(|_| rng.random()).collect();
            let frozen_best = swarm.global_best_position.clone();
            let step = ParticleStep {
                evaluator,
                global_best: &frozen_best,
                coefficients,
                local_search,
            };
            advance_particles(&mut swarm.particles, &seeds, &step, config.parallel)?;

            swarm.update_global_best();
            refresh_metrics(&mut swarm);
            let mut improved = elite.absorb(&swarm);

            if config.adaptive.is_enabled()
                && adaptive.adapt(&mut coefficients, iteration, swarm.diversity, swarm.convergence)
            {
                debug!(
                    iteration,
                    inertia = coefficients.inertia,
                    cognitive = coefficients.cognitive,
                    social = coefficients.social,
                    "adapted coefficients"
                );
            }

            let converged = is_converged(&swarm, config.convergence_threshold);
            let mut restarted = false;
            if !converged && stagnation.observe(&swarm) {
                warn!(
                    iteration,
                    stagnant_iterations = stagnation.counter(),
                    global_best = swarm.global_best_fitness,
                    "swarm stagnated, reinitializing"
                );
                if let Some(obs) = observer.as_deref_mut() {
                    obs.on_restart(iteration, &swarm);
                }
                swarm = initialize_swarm(&evaluator, config.swarm_size, &mut rng)?;
                refresh_metrics(&mut swarm);
                stagnation.reset();
                restarts += 1;
                restarted = true;
                improved |= elite.absorb(&swarm);
            }
            if improved {
                improving_iterations += 1;
            }

            let stats = IterationStats {
                iteration,
                global_best_fitness: swarm.global_best_fitness,
                best_so_far: elite.fitness,
                average_fitness: swarm.average_fitness,
                diversity: swarm.diversity,
                convergence: swarm.convergence,
                restarted,
            };
            trace!(
                iteration,
                global_best = stats.global_best_fitness,
                average = stats.average_fitness,
                diversity = stats.diversity,
                convergence = stats.convergence,
                "iteration complete"
            );
            if let Some(obs) = observer.as_deref_mut() {
                obs.on_iteration(&stats, &swarm);
            }
            if config.record_history {
                history.push(stats);
            }
            fitness_history.push(elite.fitness);

            if converged {
                break Termination::Converged;
            }
        };

        enter_phase(
            if termination == Termination::Converged {
                RunPhase::Converged
            } else {
                RunPhase::Exhausted
            },
            &mut observer,
        );

        // Finalizing
        enter_phase(RunPhase::Finalizing, &mut observer);
        let best = elite.into_particle(&evaluator)?;
        let per_iteration = |x: f64| {
            if iteration == 0 {
                0.0
            } else {
                x / iteration as f64
            }
        };
        let summary = RunSummary {
            termination,
            iterations: iteration,
            elapsed_ms: started.elapsed().as_millis() as u64,
            restarts,
            initial_best_fitness,
            improving_iterations,
            improvement_rate: per_iteration(improving_iterations as f64),
            convergence_rate: per_iteration(swarm.convergence - initial_convergence),
            final_diversity: swarm.diversity,
            final_convergence: swarm.convergence,
            final_stability: swarm.stability,
        };
        let metrics =
            PerformanceMetrics::compute(&swarm, best.best_fitness, compiled.objectives.len());
        let recommendations = recommend(&metrics, &summary);

        let result = PsoResult {
            problem: compiled.name.clone(),
            seed,
            best_fitness: best.best_fitness,
            best_values: compiled.named_values(&best.position),
            best,
            swarm,
            summary,
            metrics,
            recommendations,
            history,
            fitness_history,
        };
        info!(
            problem = %result.problem,
            termination = ?result.summary.termination,
            iterations = result.summary.iterations,
            restarts = result.summary.restarts,
            best_fitness = result.best_fitness,
            feasible = result.best.feasible,
            elapsed_ms = result.summary.elapsed_ms,
            "particle swarm run finished"
        );

        dispatch(&result, hooks.sink, hooks.publisher);

        enter_phase(RunPhase::Done, &mut observer);
        Ok(result)
    }
}

const HISTORY_PREALLOC: usize = 4096;

fn enter_phase(phase: RunPhase, observer: &mut Option<&mut dyn RunObserver>) {
    debug!(phase = ?phase, "run phase");
    if let Some(obs) = observer.as_deref_mut() {
        obs.on_phase(phase);
    }
}

/// Shared, read-only inputs for one iteration's particle updates.
struct ParticleStep<'a> {
    evaluator: FitnessEvaluator<'a>,
    global_best: &'a [f64],
    coefficients: Coefficients,
    local_search: Option<LocalSearch>,
}

impl ParticleStep<'_> {
    fn apply(&self, particle: &mut Particle, seed: u64) -> Result<(), PsoError> {
        let mut rng = StdRng::seed_from_u64(seed);
        move_particle(
            particle,
            self.global_best,
            &self.coefficients,
            &self.evaluator.problem().variables,
            &mut rng,
        );
        let evaluation = self.evaluator.evaluate(&particle.position)?;
        particle.apply_evaluation(evaluation);
        if let Some(ls) = &self.local_search {
            ls.maybe_refine(particle, &self.evaluator, &mut rng)?;
        }
        particle.update_personal_best();
        Ok(())
    }
}

#[cfg(feature = "parallel")]
fn advance_particles(
    particles: &mut [Particle],
    seeds: &[u64],
    step: &ParticleStep<'_>,
    parallel: bool,
) -> Result<(), PsoError> {
    use rayon::prelude::*;

    if parallel {
        particles
            .par_iter_mut()
            .zip(seeds.par_iter())
            .try_for_each(|(p, &seed)| step.apply(p, seed))
    } else {
        particles
            .iter_mut()
            .zip(seeds)
            .try_for_each(|(p, &seed)| step.apply(p, seed))
    }
}

#[cfg(not(feature = "parallel"))]
fn advance_particles(
    particles: &mut [Particle],
    seeds: &[u64],
    step: &ParticleStep<'_>,
    _parallel: bool,
) -> Result<(), PsoError> {
    particles
        .iter_mut()
        .zip(seeds)
        .try_for_each(|(p, &seed)| step.apply(p, seed))
}

/// Best position seen across the whole run.
#[derive(Debug, Clone)]
struct Elite {
    fitness: f64,
    position: Vec<f64>,
    particle_id: usize,
}

impl Default for Elite {
    fn default() -> Self {
        Self {
            fitness: f64::NEG_INFINITY,
            position: Vec::new(),
            particle_id: 0,
        }
    }
}

impl Elite {
    /// Takes the swarm's global best if it beats the current elite.
    fn absorb(&mut self, swarm: &Swarm) -> bool {
        match swarm.best_particle() {
            Some(p) if p.best_fitness > self.fitness => {
                self.fitness = p.best_fitness;
                self.position.clone_from(&p.best_position);
                self.particle_id = p.id;
                true
            }
            _ => false,
        }
    }

    fn into_particle(self, evaluator: &FitnessEvaluator<'_>) -> Result<Particle, PsoError> {
        let evaluation = evaluator.evaluate(&self.position)?;
        let velocity = vec![0.0; self.position.len()];
        Ok(Particle::new(
            self.particle_id,
            self.position,
            velocity,
            evaluation,
        ))
    }
}
