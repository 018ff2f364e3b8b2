//! PSO run parameters.
//!
//! [`PsoConfig`] holds every parameter that controls the swarm loop,
//! including the optional behaviors (adaptive parameters, local search,
//! parallel particle updates).

use crate::error::PsoError;

/// Neighborhood topology.
///
/// Only [`Global`](Topology::Global) is implemented; the other values are
/// accepted and behave as a single shared swarm best.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Topology {
    #[default]
    Global,
    Ring,
    Star,
    Wheel,
    Random,
}

/// Which adaptive parameter policies are active.
///
/// When both are enabled the reactive policy runs after the schedule and
/// uses the scheduled values as its baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdaptiveMode {
    /// Linear schedule over iterations: inertia and cognitive weight fade,
    /// social weight grows.
    pub schedule: bool,
    /// Adjust weights from the observed diversity and convergence.
    pub reactive: bool,
}

impl AdaptiveMode {
    /// Both policies disabled.
    pub const OFF: Self = Self {
        schedule: false,
        reactive: false,
    };

    /// Both policies enabled.
    pub const FULL: Self = Self {
        schedule: true,
        reactive: true,
    };

    /// Whether any policy is active.
    pub fn is_enabled(&self) -> bool {
        self.schedule || self.reactive
    }
}

/// Configuration for the particle swarm optimizer.
///
/// # Defaults
///
/// ```
/// use u_swarm::pso::PsoConfig;
///
/// let config = PsoConfig::default();
/// assert_eq!(config.swarm_size, 30);
/// assert_eq!(config.max_iterations, 200);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_swarm::pso::{AdaptiveMode, PsoConfig};
///
/// let config = PsoConfig::default()
///     .with_swarm_size(50)
///     .with_inertia_weight(0.9)
///     .with_adaptive(AdaptiveMode::FULL)
///     .with_local_search(true)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PsoConfig {
    /// Number of particles. Typical range: 20–100.
    pub swarm_size: usize,

    /// Maximum number of iterations before termination.
    pub max_iterations: usize,

    /// Optional wall-clock budget in milliseconds.
    ///
    /// Checked once per iteration; the run may overshoot by one
    /// iteration's worth of work.
    pub time_limit_ms: Option<u64>,

    /// The run stops once the swarm convergence metric exceeds this value.
    ///
    /// The metric lies in `[0, 1]`, so a threshold of 1.0 or more disables
    /// convergence-based termination and a threshold of 0 or below stops
    /// after the first iteration.
    pub convergence_threshold: f64,

    /// Inertia weight: tendency to keep the previous velocity.
    pub inertia_weight: f64,

    /// Cognitive weight: pull towards the particle's own best.
    pub cognitive_weight: f64,

    /// Social weight: pull towards the swarm's best.
    pub social_weight: f64,

    /// Absolute velocity clamp applied to every variable.
    pub velocity_limit: f64,

    /// Neighborhood topology.
    pub topology: Topology,

    /// Adaptive parameter policies.
    pub adaptive: AdaptiveMode,

    /// Whether to run the single-step hill-climb after each particle update.
    pub local_search: bool,

    /// Per-particle, per-iteration probability of a local search step.
    pub local_search_probability: f64,

    /// An iteration is stagnant when `best - average` fitness is below this.
    pub stagnation_tolerance: f64,

    /// The swarm is restarted once the stagnation counter exceeds this.
    ///
    /// Set to 0 to disable restarts.
    pub stagnation_limit: usize,

    /// Whether to update particles in parallel using rayon.
    ///
    /// Results are identical to sequential runs with the same seed.
    /// Has no effect without the `parallel` feature.
    pub parallel: bool,

    /// Whether to keep per-iteration [`IterationStats`](super::IterationStats)
    /// in the result. Observers receive them either way.
    pub record_history: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            swarm_size: 30,
            max_iterations: 200,
            time_limit_ms: Some(60_000),
            convergence_threshold: 0.999,
            inertia_weight: 0.7,
            cognitive_weight: 1.5,
            social_weight: 1.5,
            velocity_limit: 10.0,
            topology: Topology::Global,
            adaptive: AdaptiveMode::OFF,
            local_search: false,
            local_search_probability: 0.1,
            stagnation_tolerance: 0.01,
            stagnation_limit: 10,
            parallel: false,
            record_history: true,
            seed: None,
        }
    }
}

impl PsoConfig {
    /// Sets the swarm size.
    pub fn with_swarm_size(mut self, n: usize) -> Self {
        self.swarm_size = n;
        self
    }

    /// Sets the maximum number of iterations.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets the wall-clock time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Removes the wall-clock time limit.
    pub fn without_time_limit(mut self) -> Self {
        self.time_limit_ms = None;
        self
    }

    /// Sets the convergence threshold.
    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    pub fn with_inertia_weight(mut self, w: f64) -> Self {
        self.inertia_weight = w;
        self
    }

    pub fn with_cognitive_weight(mut self, c1: f64) -> Self {
        self.cognitive_weight = c1;
        self
    }

    pub fn with_social_weight(mut self, c2: f64) -> Self {
        self.social_weight = c2;
        self
    }

    pub fn with_velocity_limit(mut self, limit: f64) -> Self {
        self.velocity_limit = limit;
        self
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_adaptive(mut self, mode: AdaptiveMode) -> Self {
        self.adaptive = mode;
        self
    }

    pub fn with_local_search(mut self, enabled: bool) -> Self {
        self.local_search = enabled;
        self
    }

    /// Sets the local search probability, clamped to `[0, 1]`.
    pub fn with_local_search_probability(mut self, p: f64) -> Self {
        self.local_search_probability = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_stagnation_tolerance(mut self, tolerance: f64) -> Self {
        self.stagnation_tolerance = tolerance;
        self
    }

    /// Sets the stagnation limit (0 to disable restarts).
    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    /// Enables or disables parallel particle updates.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enables or disables per-iteration history in the result.
    pub fn with_record_history(mut self, record: bool) -> Self {
        self.record_history = record;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Preset for quick runs: small swarm, short budget.
    ///
    /// - Swarm: 20, Iterations: 100, Time limit: 10s
    pub fn fast() -> Self {
        Self {
            swarm_size: 20,
            max_iterations: 100,
            time_limit_ms: Some(10_000),
            ..Self::default()
        }
    }

    /// Preset balancing quality and runtime.
    ///
    /// - Swarm: 30, Iterations: 300, Time limit: 30s
    /// - Reactive parameter adaptation
    pub fn balanced() -> Self {
        Self {
            swarm_size: 30,
            max_iterations: 300,
            time_limit_ms: Some(30_000),
            adaptive: AdaptiveMode {
                schedule: false,
                reactive: true,
            },
            ..Self::default()
        }
    }

    /// Preset for solution quality: large swarm, all refinements enabled.
    ///
    /// - Swarm: 60, Iterations: 500, Time limit: 60s
    /// - Scheduled and reactive adaptation, local search
    pub fn quality() -> Self {
        Self {
            swarm_size: 60,
            max_iterations: 500,
            time_limit_ms: Some(60_000),
            adaptive: AdaptiveMode::FULL,
            local_search: true,
            ..Self::default()
        }
    }

    /// Selects a preset based on the number of decision variables.
    ///
    /// - `variable_count < 10` → [`fast()`](Self::fast)
    /// - `10 ≤ variable_count < 50` → [`balanced()`](Self::balanced)
    /// - `variable_count ≥ 50` → [`quality()`](Self::quality)
    pub fn auto_select(variable_count: usize) -> Self {
        if variable_count < 10 {
            Self::fast()
        } else if variable_count < 50 {
            Self::balanced()
        } else {
            Self::quality()
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), PsoError> {
        let invalid = |msg: String| Err(PsoError::InvalidConfig(msg));

        if self.swarm_size == 0 {
            return invalid("swarm_size must be at least 1".into());
        }
        if self.max_iterations == 0 {
            return invalid("max_iterations must be at least 1".into());
        }
        if self.time_limit_ms == Some(0) {
            return invalid("time_limit_ms must be positive or None".into());
        }
        for (name, value) in [
            ("inertia_weight", self.inertia_weight),
            ("cognitive_weight", self.cognitive_weight),
            ("social_weight", self.social_weight),
            ("stagnation_tolerance", self.stagnation_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("{name} must be finite and non-negative, got {value}"));
            }
        }
        if !self.velocity_limit.is_finite() || self.velocity_limit <= 0.0 {
            return invalid(format!(
                "velocity_limit must be positive, got {}",
                self.velocity_limit
            ));
        }
        if self.convergence_threshold.is_nan() {
            return invalid("convergence_threshold must not be NaN".into());
        }
        if !(0.0..=1.0).contains(&self.local_search_probability) {
            return invalid(format!(
                "local_search_probability must be in [0, 1], got {}",
                self.local_search_probability
            ));
        }
        Ok(())
    }
}
