//! Fitness evaluation.
//!
//! Fitness is the sum of objective rewards minus the sum of constraint
//! penalties. Higher is better and there is no lower bound.
//!
//! - `minimize` reward: `1000 / (|value| + 1)`
//! - `maximize` reward: `value * 100`
//!
//! Each reward is scaled by `weight * priority`. The two reward shapes are
//! not on a common scale, so rewards from objectives of different
//! directions are not directly comparable.

use crate::error::PsoError;
use crate::problem::{CompiledProblem, ConstraintKind, Direction, EQUALITY_TOLERANCE};

/// Scores of a single position.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evaluation {
    /// Measured value of each objective, in problem order.
    pub objective_values: Vec<f64>,
    /// Measured value of each constraint, in problem order.
    pub constraint_values: Vec<f64>,
    /// Objective rewards minus constraint penalties.
    pub fitness: f64,
    /// Whether every constraint is satisfied.
    pub feasible: bool,
    /// One message per failing constraint.
    pub violations: Vec<String>,
}

/// Evaluates positions against a compiled problem.
///
/// Evaluation is a pure function of the position and the problem.
#[derive(Debug, Clone, Copy)]
pub struct FitnessEvaluator<'a> {
    problem: &'a CompiledProblem,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(problem: &'a CompiledProblem) -> Self {
        Self { problem }
    }

    /// The problem this evaluator scores against.
    pub fn problem(&self) -> &'a CompiledProblem {
        self.problem
    }

    /// Scores `position`.
    ///
    /// # Errors
    ///
    /// Returns [`PsoError::Evaluation`] if any measured value, reward or
    /// penalty is not finite.
    pub fn evaluate(&self, position: &[f64]) -> Result<Evaluation, PsoError> {
        debug_assert_eq!(position.len(), self.problem.dimension());

        let mut fitness = 0.0;

        let mut objective_values = Vec::with_capacity(self.problem.objectives.len());
        for obj in &self.problem.objectives {
            let value = finite("objective", &obj.id, obj.form.measure(position))?;
            let reward = match obj.direction {
                Direction::Minimize => 1000.0 / (value.abs() + 1.0),
                Direction::Maximize => value * 100.0,
            };
            fitness += finite("objective", &obj.id, reward * obj.scale)?;
            objective_values.push(value);
        }

        let mut constraint_values = Vec::with_capacity(self.problem.constraints.len());
        let mut violations = Vec::new();
        for con in &self.problem.constraints {
            let value = finite("constraint", &con.id, con.form.measure(position))?;
            let penalty = (value - con.bound).max(0.0) * con.penalty_weight * 100.0;
            fitness -= finite("constraint", &con.id, penalty)?;

            let satisfied = match con.kind {
                ConstraintKind::Equality => (value - con.bound).abs() <= EQUALITY_TOLERANCE,
                ConstraintKind::Inequality => value <= con.bound,
            };
            if !satisfied {
                violations.push(match con.kind {
                    ConstraintKind::Equality => format!(
                        "constraint `{}`: {value} != {} (tolerance {EQUALITY_TOLERANCE})",
                        con.id, con.bound
                    ),
                    ConstraintKind::Inequality => {
                        format!("constraint `{}`: {value} > {}", con.id, con.bound)
                    }
                });
            }
            constraint_values.push(value);
        }

        // A problem without variables has nothing to score.
        if self.problem.dimension() == 0 {
            fitness = 0.0;
        }

        Ok(Evaluation {
            objective_values,
            constraint_values,
            fitness: finite("fitness", &self.problem.name, fitness)?,
            feasible: violations.is_empty(),
            violations,
        })
    }
}

fn finite(owner: &'static str, id: &str, value: f64) -> Result<f64, PsoError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PsoError::Evaluation {
            owner,
            id: id.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Constraint, Objective, Problem, Variable};

    fn compile(problem: Problem) -> CompiledProblem {
        problem.compile().unwrap()
    }

    fn single_x() -> Problem {
        Problem::new("x").with_variable(Variable::continuous("x", 0.0, 100.0))
    }

    #[test]
    fn test_maximize_reward() {
        let p = compile(single_x().with_objective(Objective::maximize("x").with_term("x", 1.0)));
        let eval = FitnessEvaluator::new(&p).evaluate(&[42.0]).unwrap();
        assert!((eval.fitness - 4200.0).abs() < 1e-9);
        assert_eq!(eval.objective_values, vec![42.0]);
        assert!(eval.feasible);
    }

    #[test]
    fn test_minimize_reward_scaled_by_weight_and_priority() {
        let p = compile(
            single_x().with_objective(
                Objective::minimize("x")
                    .with_term("x", 1.0)
                    .with_weight(2.0)
                    .with_priority(3.0),
            ),
        );
        let eval = FitnessEvaluator::new(&p).evaluate(&[4.0]).unwrap();
        // 1000 / 5 * 6
        assert!((eval.fitness - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_inequality_penalty_and_violation() {
        let p = compile(
            single_x()
                .with_objective(Objective::maximize("x").with_term("x", 1.0))
                .with_constraint(
                    Constraint::inequality("cap", 60.0)
                        .with_term("x", 1.0)
                        .with_penalty_weight(2.0),
                ),
        );
        let eval = FitnessEvaluator::new(&p).evaluate(&[70.0]).unwrap();
        // 7000 - 10 * 2 * 100
        assert!((eval.fitness - 5000.0).abs() < 1e-9);
        assert!(!eval.feasible);
        assert_eq!(eval.violations.len(), 1);
        assert_eq!(eval.constraint_values, vec![70.0]);

        let eval = FitnessEvaluator::new(&p).evaluate(&[60.0]).unwrap();
        assert!(eval.feasible);
        assert!(eval.violations.is_empty());
    }

    #[test]
    fn test_equality_tolerance() {
        let p = compile(single_x().with_constraint(
            Constraint::equality("fifty", 50.0).with_term("x", 1.0),
        ));
        let evaluator = FitnessEvaluator::new(&p);
        assert!(evaluator.evaluate(&[50.0009]).unwrap().feasible);
        assert!(!evaluator.evaluate(&[50.01]).unwrap().feasible);
        // Below the bound: infeasible but not penalized.
        let below = evaluator.evaluate(&[49.0]).unwrap();
        assert!(!below.feasible);
        assert_eq!(below.fitness, 0.0);
    }

    #[test]
    fn test_fitness_may_be_negative() {
        let p = compile(single_x().with_constraint(
            Constraint::inequality("cap", 0.0)
                .with_term("x", 1.0)
                .with_penalty_weight(1.0),
        ));
        let eval = FitnessEvaluator::new(&p).evaluate(&[10.0]).unwrap();
        assert!((eval.fitness + 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_is_error() {
        let p = compile(
            Problem::new("big")
                .with_variable(Variable::continuous("x", 0.0, f64::MAX))
                .with_objective(Objective::maximize("x").with_term("x", 10.0)),
        );
        let err = FitnessEvaluator::new(&p).evaluate(&[f64::MAX]).unwrap_err();
        assert!(matches!(err, PsoError::Evaluation { owner: "objective", .. }));
    }

    #[test]
    fn test_zero_variables_scores_zero() {
        let p = compile(Problem::new("empty").with_objective(Objective::minimize("o")));
        let eval = FitnessEvaluator::new(&p).evaluate(&[]).unwrap();
        assert_eq!(eval.fitness, 0.0);
        assert!(eval.feasible);
    }
}
