//! Particle Swarm Optimization (PSO).
//!
//! A population-based metaheuristic in which each particle moves through
//! the search space under three influences: its own velocity (inertia),
//! the best position it has seen (cognitive), and the best position the
//! swarm has seen (social).
//!
//! This implementation adds:
//!
//! - Type-aware repair for discrete, integer and binary variables
//! - Optional adaptive coefficients (linear schedule and/or reactive to
//!   diversity and convergence)
//! - Optional single-step local search hybridization
//! - Convergence-based termination and stagnation-triggered swarm restart
//!
//! # Key Types
//!
//! - [`PsoConfig`]: Run parameters and optional behaviors
//! - [`PsoRunner`]: Executes the iteration loop
//! - [`PsoResult`]: Best solution, final swarm, summary and recommendations
//!
//! # References
//!
//! - Kennedy & Eberhart (1995), "Particle Swarm Optimization"
//! - Shi & Eberhart (1998), "A Modified Particle Swarm Optimizer"
//! - Kennedy & Eberhart (1997), "A Discrete Binary Version of the Particle Swarm Algorithm"

mod adaptive;
mod config;
mod fitness;
mod local_search;
pub mod monitor;
mod report;
mod runner;
mod types;
mod update;

pub use adaptive::{AdaptiveController, Coefficients};
pub use config::{AdaptiveMode, PsoConfig, Topology};
pub use fitness::{Evaluation, FitnessEvaluator};
pub use local_search::{refine, LocalSearch};
pub use report::{
    recommend, IterationStats, PerformanceMetrics, Recommendation, RunSummary, Termination, Tier,
};
pub use runner::{PsoResult, PsoRunner, RunHooks, RunObserver, RunPhase};
pub use types::{Particle, Swarm};
pub use update::{initialize_particle, initialize_swarm, move_particle};
