//! Problem definition: variables, weighted objectives and constraints.

use super::variables::Variable;
use crate::error::PsoError;
use std::collections::HashMap;

/// Optimization direction of an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Minimize,
    Maximize,
}

/// A weighted scoring term.
///
/// The measured value is a linear combination of variables. When `terms`
/// is empty, every variable contributes `variable.weight * value`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Objective {
    /// Objective id.
    pub id: String,
    /// Whether smaller or larger measured values are rewarded.
    pub direction: Direction,
    /// Reward multiplier.
    pub weight: f64,
    /// Second reward multiplier; higher priority objectives dominate.
    pub priority: f64,
    /// (variable_id, coefficient) pairs.
    pub terms: Vec<(String, f64)>,
}

impl Objective {
    /// Creates an objective to minimize.
    pub fn minimize(id: impl Into<String>) -> Self {
        Self::new(id, Direction::Minimize)
    }

    /// Creates an objective to maximize.
    pub fn maximize(id: impl Into<String>) -> Self {
        Self::new(id, Direction::Maximize)
    }

    fn new(id: impl Into<String>, direction: Direction) -> Self {
        Self {
            id: id.into(),
            direction,
            weight: 1.0,
            priority: 1.0,
            terms: Vec::new(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    /// Adds `coefficient * variable` to the measured value.
    pub fn with_term(mut self, variable: impl Into<String>, coefficient: f64) -> Self {
        self.terms.push((variable.into(), coefficient));
        self
    }
}

/// How a constraint's measured value is compared with its bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstraintKind {
    /// Satisfied within [`EQUALITY_TOLERANCE`] of the bound.
    Equality,
    /// Satisfied when the measured value is at most the bound.
    Inequality,
}

/// Absolute tolerance for equality constraints.
pub const EQUALITY_TOLERANCE: f64 = 0.001;

/// A bound on a linear combination of variables.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constraint {
    /// Constraint id.
    pub id: String,
    /// Comparison kind.
    pub kind: ConstraintKind,
    /// Right-hand side.
    pub bound: f64,
    /// Penalty multiplier (must be non-negative).
    pub penalty_weight: f64,
    /// (variable_id, coefficient) pairs.
    pub terms: Vec<(String, f64)>,
}

impl Constraint {
    /// `measured == bound` (within tolerance).
    pub fn equality(id: impl Into<String>, bound: f64) -> Self {
        Self::new(id, ConstraintKind::Equality, bound)
    }

    /// `measured <= bound`.
    pub fn inequality(id: impl Into<String>, bound: f64) -> Self {
        Self::new(id, ConstraintKind::Inequality, bound)
    }

    fn new(id: impl Into<String>, kind: ConstraintKind, bound: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            bound,
            penalty_weight: 1.0,
            terms: Vec::new(),
        }
    }

    pub fn with_penalty_weight(mut self, weight: f64) -> Self {
        self.penalty_weight = weight;
        self
    }

    /// Adds `coefficient * variable` to the measured value.
    pub fn with_term(mut self, variable: impl Into<String>, coefficient: f64) -> Self {
        self.terms.push((variable.into(), coefficient));
        self
    }
}

/// A complete optimization problem.
///
/// # Examples
///
/// ```
/// use u_swarm::problem::{Constraint, Objective, Problem, Variable};
///
/// let mut problem = Problem::new("blend");
/// problem.add_variable(Variable::continuous("x", 0.0, 100.0));
/// problem.add_objective(Objective::maximize("output").with_term("x", 1.0));
/// problem.add_constraint(Constraint::inequality("cap", 80.0).with_term("x", 1.0));
/// assert!(problem.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Problem {
    /// Problem name, used in logs.
    pub name: String,
    /// Decision variables in index order.
    pub variables: Vec<Variable>,
    /// Objectives.
    pub objectives: Vec<Objective>,
    /// Constraints.
    pub constraints: Vec<Constraint>,
}

impl Problem {
    /// Creates an empty problem.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_variable(&mut self, variable: Variable) {
        self.variables.push(variable);
    }

    pub fn add_objective(&mut self, objective: Objective) {
        self.objectives.push(objective);
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Builder-style [`add_variable`](Self::add_variable).
    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.add_variable(variable);
        self
    }

    /// Builder-style [`add_objective`](Self::add_objective).
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.add_objective(objective);
        self
    }

    /// Builder-style [`add_constraint`](Self::add_constraint).
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.add_constraint(constraint);
        self
    }

    /// Checks the problem for definitional errors.
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), PsoError> {
        self.compile().map(|_| ())
    }

    /// Validates the problem and builds the dense variable index table.
    pub fn compile(&self) -> Result<CompiledProblem, PsoError> {
        let mut index = HashMap::with_capacity(self.variables.len());
        for (i, var) in self.variables.iter().enumerate() {
            var.validate()?;
            if index.insert(var.id.clone(), i).is_some() {
                return Err(PsoError::DuplicateVariable(var.id.clone()));
            }
        }

        let surrogate: Vec<(usize, f64)> = self
            .variables
            .iter()
            .enumerate()
            .map(|(i, v)| (i, v.weight))
            .collect();

        let mut objectives = Vec::with_capacity(self.objectives.len());
        for obj in &self.objectives {
            if !obj.weight.is_finite() || !obj.priority.is_finite() {
                return Err(PsoError::InvalidTerm {
                    owner: "objective",
                    id: obj.id.clone(),
                    reason: "weight and priority must be finite".into(),
                });
            }
            objectives.push(CompiledObjective {
                id: obj.id.clone(),
                direction: obj.direction,
                scale: obj.weight * obj.priority,
                form: resolve_terms("objective", &obj.id, &obj.terms, &index, &surrogate)?,
            });
        }

        let mut constraints = Vec::with_capacity(self.constraints.len());
        for con in &self.constraints {
            if !con.bound.is_finite() {
                return Err(PsoError::InvalidTerm {
                    owner: "constraint",
                    id: con.id.clone(),
                    reason: "bound must be finite".into(),
                });
            }
            if con.penalty_weight.is_nan() || con.penalty_weight < 0.0 {
                return Err(PsoError::InvalidTerm {
                    owner: "constraint",
                    id: con.id.clone(),
                    reason: format!(
                        "penalty weight must be non-negative, got {}",
                        con.penalty_weight
                    ),
                });
            }
            constraints.push(CompiledConstraint {
                id: con.id.clone(),
                kind: con.kind,
                bound: con.bound,
                penalty_weight: con.penalty_weight,
                form: resolve_terms("constraint", &con.id, &con.terms, &index, &surrogate)?,
            });
        }

        Ok(CompiledProblem {
            name: self.name.clone(),
            variables: self.variables.clone(),
            index,
            objectives,
            constraints,
        })
    }
}

fn resolve_terms(
    owner: &'static str,
    id: &str,
    terms: &[(String, f64)],
    index: &HashMap<String, usize>,
    surrogate: &[(usize, f64)],
) -> Result<LinearForm, PsoError> {
    if terms.is_empty() {
        return Ok(LinearForm {
            coefficients: surrogate.to_vec(),
        });
    }
    let mut coefficients = Vec::with_capacity(terms.len());
    for (name, coef) in terms {
        let &i = index.get(name).ok_or_else(|| PsoError::UnknownVariable {
            owner,
            id: id.to_string(),
            variable: name.clone(),
        })?;
        if !coef.is_finite() {
            return Err(PsoError::InvalidTerm {
                owner,
                id: id.to_string(),
                reason: format!("coefficient for `{name}` must be finite"),
            });
        }
        coefficients.push((i, *coef));
    }
    Ok(LinearForm { coefficients })
}

/// A linear combination over dense variable indices.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearForm {
    coefficients: Vec<(usize, f64)>,
}

impl LinearForm {
    /// Evaluates the form at `position`.
    pub fn measure(&self, position: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .map(|&(i, c)| c * position[i])
            .sum()
    }
}

/// An objective with its terms resolved to indices.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledObjective {
    pub id: String,
    pub direction: Direction,
    /// `weight * priority`.
    pub scale: f64,
    pub form: LinearForm,
}

/// A constraint with its terms resolved to indices.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledConstraint {
    pub id: String,
    pub kind: ConstraintKind,
    pub bound: f64,
    pub penalty_weight: f64,
    pub form: LinearForm,
}

/// A validated problem with a stable variable-index table.
///
/// Positions are plain `[f64]` slices in the order of [`variables`](Self::variables).
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProblem {
    pub name: String,
    pub variables: Vec<Variable>,
    pub objectives: Vec<CompiledObjective>,
    pub constraints: Vec<CompiledConstraint>,
    index: HashMap<String, usize>,
}

impl CompiledProblem {
    /// Number of decision variables.
    pub fn dimension(&self) -> usize {
        self.variables.len()
    }

    /// Dense index of a variable id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Looks up a variable's value in `position` by id.
    pub fn value_of(&self, position: &[f64], id: &str) -> Option<f64> {
        self.index_of(id).and_then(|i| position.get(i).copied())
    }

    /// Pairs each variable id with its value in `position`.
    pub fn named_values(&self, position: &[f64]) -> Vec<(String, f64)> {
        self.variables
            .iter()
            .zip(position)
            .map(|(v, &x)| (v.id.clone(), x))
            .collect()
    }
}
