//! Decision variable types.

use crate::error::PsoError;
use rand::Rng;

/// Tolerance used when counting discrete steps inside a domain.
const STEP_EPSILON: f64 = 1e-9;

/// The value type of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariableKind {
    /// Any real value in `[min, max]`.
    Continuous,
    /// `min + k * step` for integer `k`, within `[min, max]`.
    Discrete,
    /// Either `0` or `1`.
    Binary,
    /// Whole numbers in `[min, max]`.
    Integer,
}

/// Numeric bounds of a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Domain {
    /// Lower bound (inclusive).
    pub min: f64,
    /// Upper bound (inclusive).
    pub max: f64,
    /// Step size; required and positive for discrete variables only.
    pub step: Option<f64>,
}

impl Domain {
    /// Creates a domain without a step.
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            step: None,
        }
    }

    /// Width of the domain (`max - min`).
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Whether `value` lies within `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A decision variable.
///
/// Variables are immutable once a run starts. The `weight` is used by the
/// linear surrogate when an objective or constraint lists no explicit terms.
///
/// # Examples
///
/// ```
/// use u_swarm::problem::{Variable, VariableKind};
///
/// let x = Variable::discrete("x", 0.0, 10.0, 2.5);
/// assert_eq!(x.kind, VariableKind::Discrete);
/// assert_eq!(x.snap(6.0), 5.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    /// Variable id (unique within a problem).
    pub id: String,
    /// Value type.
    pub kind: VariableKind,
    /// Bounds.
    pub domain: Domain,
    /// Surrogate weight.
    pub weight: f64,
}

impl Variable {
    /// Creates a continuous variable in `[min, max]`.
    pub fn continuous(id: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            id: id.into(),
            kind: VariableKind::Continuous,
            domain: Domain::new(min, max),
            weight: 1.0,
        }
    }

    /// Creates a discrete variable taking values `min + k * step`.
    pub fn discrete(id: impl Into<String>, min: f64, max: f64, step: f64) -> Self {
        Self {
            id: id.into(),
            kind: VariableKind::Discrete,
            domain: Domain {
                min,
                max,
                step: Some(step),
            },
            weight: 1.0,
        }
    }

    /// Creates an integer variable in `[min, max]`.
    pub fn integer(id: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            id: id.into(),
            kind: VariableKind::Integer,
            domain: Domain::new(min as f64, max as f64),
            weight: 1.0,
        }
    }

    /// Creates a binary (0/1) variable.
    pub fn binary(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: VariableKind::Binary,
            domain: Domain::new(0.0, 1.0),
            weight: 1.0,
        }
    }

    /// Sets the surrogate weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Checks the domain invariants for this variable's kind.
    pub fn validate(&self) -> Result<(), PsoError> {
        let invalid = |reason: String| PsoError::InvalidVariable {
            id: self.id.clone(),
            reason,
        };
        let Domain { min, max, step } = self.domain;

        if !min.is_finite() || !max.is_finite() {
            return Err(invalid("bounds must be finite".into()));
        }
        if min > max {
            return Err(invalid(format!("min {min} is greater than max {max}")));
        }
        if !self.domain.width().is_finite() {
            return Err(invalid(format!("domain width of [{min}, {max}] overflows")));
        }
        if !self.weight.is_finite() {
            return Err(invalid("weight must be finite".into()));
        }

        match self.kind {
            VariableKind::Discrete => match step {
                Some(s) if s.is_finite() && s > 0.0 => {}
                Some(s) => return Err(invalid(format!("step must be positive, got {s}"))),
                None => return Err(invalid("discrete variable requires a step".into())),
            },
            VariableKind::Integer => {
                if min.ceil() > max.floor() {
                    return Err(invalid("domain contains no whole number".into()));
                }
            }
            VariableKind::Binary => {
                if min > 0.0 || max < 1.0 {
                    return Err(invalid("binary domain must include 0 and 1".into()));
                }
            }
            VariableKind::Continuous => {}
        }
        Ok(())
    }

    /// Snaps a value that already lies within the domain to the nearest
    /// type-correct value.
    pub fn snap(&self, value: f64) -> f64 {
        match self.kind {
            VariableKind::Continuous => value,
            VariableKind::Discrete => {
                let step = self.step();
                let index = ((value - self.domain.min) / step)
                    .round()
                    .clamp(0.0, self.max_step_index());
                (self.domain.min + index * step).min(self.domain.max)
            }
            VariableKind::Integer => value
                .round()
                .clamp(self.domain.min.ceil(), self.domain.max.floor()),
            VariableKind::Binary => {
                if value > 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Clamps `value` to the domain and snaps it to the variable's type.
    ///
    /// Returns the repaired value and whether the bound clamp triggered.
    pub fn repair(&self, value: f64) -> (f64, bool) {
        let clamped = value.clamp(self.domain.min, self.domain.max);
        let hit_wall = clamped != value;
        (self.snap(clamped), hit_wall)
    }

    /// Draws a uniformly random type-correct value from the domain.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        let Domain { min, max, .. } = self.domain;
        match self.kind {
            VariableKind::Continuous => rng.random_range(min..=max),
            VariableKind::Discrete => {
                let steps = self.max_step_index() as u64;
                let index = rng.random_range(0..=steps);
                (min + index as f64 * self.step()).min(max)
            }
            VariableKind::Integer => {
                let lo = min.ceil() as i64;
                let hi = max.floor() as i64;
                rng.random_range(lo..=hi) as f64
            }
            VariableKind::Binary => {
                if rng.random_bool(0.5) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Draws a small initial velocity.
    ///
    /// Continuous and discrete variables scale with the domain width;
    /// binary and integer variables draw from `[-1, 1]`.
    pub fn initial_velocity<R: Rng>(&self, rng: &mut R) -> f64 {
        match self.kind {
            VariableKind::Continuous | VariableKind::Discrete => {
                rng.random_range(-0.1..=0.1) * self.domain.width()
            }
            VariableKind::Binary | VariableKind::Integer => rng.random_range(-1.0..=1.0),
        }
    }

    /// Whether `value` is within the domain and type-correct.
    pub fn is_valid_value(&self, value: f64) -> bool {
        if !self.domain.contains(value) {
            return false;
        }
        match self.kind {
            VariableKind::Continuous => true,
            VariableKind::Discrete => {
                let k = (value - self.domain.min) / self.step();
                (k - k.round()).abs() < 1e-6
            }
            VariableKind::Integer => value.fract() == 0.0,
            VariableKind::Binary => value == 0.0 || value == 1.0,
        }
    }

    fn step(&self) -> f64 {
        self.domain.step.unwrap_or(1.0)
    }

    fn max_step_index(&self) -> f64 {
        (self.domain.width() / self.step() + STEP_EPSILON).floor()
    }
}
