//! Error types.
//!
//! A run either returns a complete result or fails with the first
//! [`PsoError`] encountered. Collaborator failures ([`SinkError`]) are
//! logged by the runner and never surface to the caller.

use thiserror::Error;

/// Fatal errors raised while validating a problem or running the swarm.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PsoError {
    /// A run parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A variable has an unusable domain.
    #[error("invalid variable `{id}`: {reason}")]
    InvalidVariable { id: String, reason: String },

    /// Two variables share the same id.
    #[error("duplicate variable id `{0}`")]
    DuplicateVariable(String),

    /// An objective or constraint term names a variable that does not exist.
    #[error("{owner} `{id}` references unknown variable `{variable}`")]
    UnknownVariable {
        owner: &'static str,
        id: String,
        variable: String,
    },

    /// A constraint or objective definition is malformed.
    #[error("invalid {owner} `{id}`: {reason}")]
    InvalidTerm {
        owner: &'static str,
        id: String,
        reason: String,
    },

    /// Fitness evaluation produced a non-finite value.
    #[error("evaluation of {owner} `{id}` produced non-finite value {value}")]
    Evaluation {
        owner: &'static str,
        id: String,
        value: f64,
    },
}

/// Failure reported by a result store or event publisher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("persisting result failed: {0}")]
    Persistence(String),

    #[error("publishing to `{topic}` failed: {reason}")]
    Publish { topic: String, reason: String },
}
