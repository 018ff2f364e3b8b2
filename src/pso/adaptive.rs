//! Adaptive control of the inertia, cognitive and social weights.
//!
//! Two independent policies:
//!
//! - **Schedule**: `w(t) = w0 (1 - t/T)`, `c1(t) = c1_0 (1 - t/T)`,
//!   `c2(t) = c2_0 t/T`. Self influence fades while swarm influence grows.
//! - **Reactive**: low diversity shrinks inertia, high diversity grows it;
//!   high convergence shifts weight from cognitive to social, low
//!   convergence shifts it back.
//!
//! The reactive policy runs after the schedule and starts from the values
//! the schedule produced.

use super::config::{AdaptiveMode, PsoConfig};

const LOW_DIVERSITY: f64 = 0.1;
const HIGH_DIVERSITY: f64 = 0.5;
const HIGH_CONVERGENCE: f64 = 0.8;
const LOW_CONVERGENCE: f64 = 0.3;

const INERTIA_FLOOR: f64 = 0.1;
const INERTIA_CEILING: f64 = 0.9;
const ACCELERATION_FLOOR: f64 = 0.1;
const ACCELERATION_CEILING: f64 = 4.0;

/// The velocity update coefficients in effect for an iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coefficients {
    pub inertia: f64,
    pub cognitive: f64,
    pub social: f64,
    pub velocity_limit: f64,
}

impl Coefficients {
    /// Initial coefficients from the run configuration.
    pub fn from_config(config: &PsoConfig) -> Self {
        Self {
            inertia: config.inertia_weight,
            cognitive: config.cognitive_weight,
            social: config.social_weight,
            velocity_limit: config.velocity_limit,
        }
    }
}

/// Applies the enabled adaptive policies between iterations.
#[derive(Debug, Clone)]
pub struct AdaptiveController {
    mode: AdaptiveMode,
    base: Coefficients,
    max_iterations: usize,
}

impl AdaptiveController {
    pub fn new(config: &PsoConfig) -> Self {
        Self {
            mode: config.adaptive,
            base: Coefficients::from_config(config),
            max_iterations: config.max_iterations,
        }
    }

    /// Updates `coefficients` after `iteration` completed.
    ///
    /// Returns `true` if any coefficient changed.
    pub fn adapt(
        &self,
        coefficients: &mut Coefficients,
        iteration: usize,
        diversity: f64,
        convergence: f64,
    ) -> bool {
        let before = *coefficients;
        if self.mode.schedule {
            self.apply_schedule(coefficients, iteration);
        }
        if self.mode.reactive {
            apply_reactive(coefficients, diversity, convergence);
        }
        *coefficients != before
    }

    fn apply_schedule(&self, coefficients: &mut Coefficients, iteration: usize) {
        let progress = (iteration as f64 / self.max_iterations.max(1) as f64).clamp(0.0, 1.0);
        coefficients.inertia = self.base.inertia * (1.0 - progress);
        coefficients.cognitive = self.base.cognitive * (1.0 - progress);
        coefficients.social = self.base.social * progress;
    }
}

fn apply_reactive(coefficients: &mut Coefficients, diversity: f64, convergence: f64) {
    if diversity < LOW_DIVERSITY {
        coefficients.inertia = shrink(coefficients.inertia, INERTIA_FLOOR);
    } else if diversity > HIGH_DIVERSITY {
        coefficients.inertia = grow(coefficients.inertia, INERTIA_CEILING);
    }

    if convergence > HIGH_CONVERGENCE {
        coefficients.cognitive = shrink(coefficients.cognitive, ACCELERATION_FLOOR);
        coefficients.social = grow(coefficients.social, ACCELERATION_CEILING);
    } else if convergence < LOW_CONVERGENCE {
        coefficients.cognitive = grow(coefficients.cognitive, ACCELERATION_CEILING);
        coefficients.social = shrink(coefficients.social, ACCELERATION_FLOOR);
    }
}

/// Shrinks by 10%, never below `floor`. Values already under the floor stay put.
fn shrink(value: f64, floor: f64) -> f64 {
    if value <= floor {
        value
    } else {
        (value * 0.9).max(floor)
    }
}

/// Grows by 10%, never above `ceiling`. Values already over the ceiling stay put.
fn grow(value: f64, ceiling: f64) -> f64 {
    if value >= ceiling {
        value
    } else {
        (value * 1.1).min(ceiling)
    }
}
