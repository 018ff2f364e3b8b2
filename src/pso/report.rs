//! Run summary, performance metrics and recommendations.

use super::types::Swarm;

/// Why the iteration loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    /// Convergence metric exceeded the threshold.
    Converged,
    /// `max_iterations` reached.
    IterationLimit,
    /// Wall-clock budget exhausted.
    TimeLimit,
    /// Cancellation flag was set.
    Cancelled,
}

impl Termination {
    /// Whether the run stopped because a budget ran out.
    pub fn is_exhausted(self) -> bool {
        matches!(self, Self::IterationLimit | Self::TimeLimit)
    }
}

/// Swarm state recorded at the end of one iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IterationStats {
    /// 1-based iteration number.
    pub iteration: usize,
    /// Swarm global best; may drop right after a restart.
    pub global_best_fitness: f64,
    /// Best fitness seen in the whole run so far. Never decreases.
    pub best_so_far: f64,
    pub average_fitness: f64,
    pub diversity: f64,
    pub convergence: f64,
    /// Whether the swarm was reinitialized at the end of this iteration.
    pub restarted: bool,
}

/// Iteration and timing summary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    pub termination: Termination,
    /// Completed iterations.
    pub iterations: usize,
    pub elapsed_ms: u64,
    /// Number of stagnation-triggered swarm restarts.
    pub restarts: usize,
    /// Best fitness of the initial swarm.
    pub initial_best_fitness: f64,
    /// Iterations in which the run-wide best improved.
    pub improving_iterations: usize,
    /// `improving_iterations / iterations`.
    pub improvement_rate: f64,
    /// `(final convergence - initial convergence) / iterations`.
    pub convergence_rate: f64,
    pub final_diversity: f64,
    pub final_convergence: f64,
    pub final_stability: f64,
}

/// Scalar quality indicators of a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerformanceMetrics {
    /// `best / (average + 1)`.
    pub efficiency: f64,
    /// `best / (objective_count * 1000 + 1)`.
    pub quality: f64,
    /// Fraction of final particles that are feasible.
    pub coverage: f64,
    pub stability: f64,
    pub diversity: f64,
}

impl PerformanceMetrics {
    /// Derives the metrics from the final swarm and the run-wide best.
    pub fn compute(swarm: &Swarm, best_fitness: f64, objective_count: usize) -> Self {
        Self {
            efficiency: ratio(best_fitness, swarm.average_fitness + 1.0),
            quality: ratio(best_fitness, objective_count as f64 * 1000.0 + 1.0),
            coverage: swarm.feasible_fraction(),
            stability: swarm.stability,
            diversity: swarm.diversity,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < f64::EPSILON {
        0.0
    } else {
        numerator / denominator
    }
}

/// Urgency of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tier {
    High,
    Medium,
    Low,
}

/// A tuning hint derived from fixed metric thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Recommendation {
    pub tier: Tier,
    pub category: String,
    pub message: String,
}

impl Recommendation {
    fn new(tier: Tier, category: &str, message: impl Into<String>) -> Self {
        Self {
            tier,
            category: category.to_string(),
            message: message.into(),
        }
    }
}

/// Builds recommendations, most urgent first.
pub fn recommend(metrics: &PerformanceMetrics, summary: &RunSummary) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if metrics.coverage < 0.5 {
        out.push(Recommendation::new(
            Tier::High,
            "coverage",
            "fewer than half of the particles are feasible; relax constraints or raise penalty weights",
        ));
    } else if metrics.coverage < 0.8 {
        out.push(Recommendation::new(
            Tier::Medium,
            "coverage",
            "a significant share of particles violate constraints; review penalty weights",
        ));
    }

    if metrics.stability < 0.5 {
        out.push(Recommendation::new(
            Tier::Medium,
            "stability",
            "fitness is still spread out across the swarm; increase the iteration budget",
        ));
    }

    if metrics.quality < 0.1 {
        out.push(Recommendation::new(
            Tier::Medium,
            "quality",
            "best fitness is low relative to the objective count; revisit objective weights",
        ));
    }

    if metrics.diversity < 1e-3 {
        out.push(Recommendation::new(
            Tier::Low,
            "diversity",
            "the swarm collapsed to a single point; increase swarm size or inertia",
        ));
    }

    if metrics.efficiency < 1.0 {
        out.push(Recommendation::new(
            Tier::Low,
            "efficiency",
            "the average particle lags far behind the best; enable local search",
        ));
    }

    if summary.restarts > 0 {
        out.push(Recommendation::new(
            Tier::Low,
            "stagnation",
            format!(
                "the swarm stagnated and restarted {} time(s); consider adaptive parameters",
                summary.restarts
            ),
        ));
    }

    out.sort_by_key(|r| r.tier);
    out
}
