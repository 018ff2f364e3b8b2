//! Problem modeling layer.
//!
//! A [`Problem`] is a set of decision variables, weighted objectives and
//! penalized constraints. Objectives and constraints are linear in the
//! variables: each lists `(variable_id, coefficient)` terms, and an empty
//! term list falls back to the sum of `variable.weight * value` over all
//! variables.
//!
//! [`Problem::compile`] validates the definition and produces a
//! [`CompiledProblem`] whose positions are dense `f64` vectors indexed by a
//! variable-index table built once per run.

mod model;
mod variables;

pub use model::{
    CompiledConstraint, CompiledObjective, CompiledProblem, Constraint, ConstraintKind, Direction,
    LinearForm, Objective, Problem, EQUALITY_TOLERANCE,
};
pub use variables::{Domain, Variable, VariableKind};
