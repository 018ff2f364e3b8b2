//! Domain-agnostic particle swarm optimization engine.
//!
//! Given decision variables, weighted objectives and penalized constraints,
//! searches for the assignment that maximizes a composite fitness score
//! within an iteration and wall-clock budget. There is no guarantee of
//! global optimality.
//!
//! - [`problem`]: Variables (continuous, discrete, integer, binary),
//!   objectives and constraints over linear combinations of variables
//! - [`pso`]: The swarm engine with adaptive coefficients, local search
//!   hybridization and stagnation-triggered restart
//! - [`sink`]: Best-effort persistence and event publishing of results
//!
//! # Example
//!
//! ```
//! use u_swarm::problem::{Constraint, Objective, Problem, Variable};
//! use u_swarm::pso::{PsoConfig, PsoRunner};
//!
//! let problem = Problem::new("capacity")
//!     .with_variable(Variable::integer("units", 0, 100))
//!     .with_objective(Objective::maximize("output").with_term("units", 1.0))
//!     .with_constraint(
//!         Constraint::inequality("cap", 60.0)
//!             .with_term("units", 1.0)
//!             .with_penalty_weight(5.0),
//!     );
//!
//! let result = PsoRunner::run(&problem, &PsoConfig::fast().with_seed(7)).unwrap();
//! assert!(result.best.position[0] <= 100.0);
//! ```
//!
//! # Logging
//!
//! Progress is reported through [`tracing`]; install a subscriber to see it.

pub mod error;
pub mod problem;
pub mod pso;
pub mod sink;

pub use error::{PsoError, SinkError};
