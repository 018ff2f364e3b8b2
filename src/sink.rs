//! Result persistence and event publishing collaborators.
//!
//! After a run completes the runner hands the result to an optional
//! [`ResultSink`] and announces it through an optional [`EventPublisher`].
//! Both are best-effort: failures are logged and never change the result
//! returned to the caller.

use crate::error::SinkError;
use crate::pso::{PsoResult, Termination};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Topic used for the run-completed event.
pub const COMPLETED_TOPIC: &str = "optimization.completed";

/// Payload published when a run completes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunEvent {
    pub problem: String,
    pub best_fitness: f64,
    pub feasible: bool,
    pub iterations: usize,
    pub restarts: usize,
    pub termination: Termination,
    pub elapsed_ms: u64,
}

impl RunEvent {
    pub fn from_result(result: &PsoResult) -> Self {
        Self {
            problem: result.problem.clone(),
            best_fitness: result.best_fitness,
            feasible: result.best.feasible,
            iterations: result.summary.iterations,
            restarts: result.summary.restarts,
            termination: result.summary.termination,
            elapsed_ms: result.summary.elapsed_ms,
        }
    }
}

/// Stores finished results.
pub trait ResultSink: Send + Sync {
    fn save(&self, result: &PsoResult) -> Result<(), SinkError>;
}

/// Publishes run events. Delivery is at-most-once.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, topic: &str, event: &RunEvent) -> Result<(), SinkError>;
}

/// Hands `result` to the collaborators, logging any failure.
pub(crate) fn dispatch(
    result: &PsoResult,
    sink: Option<&dyn ResultSink>,
    publisher: Option<&dyn EventPublisher>,
) {
    if let Some(sink) = sink {
        match sink.save(result) {
            Ok(()) => debug!(problem = %result.problem, "result saved"),
            Err(e) => warn!(problem = %result.problem, error = %e, "failed to save result"),
        }
    }
    if let Some(publisher) = publisher {
        let event = RunEvent::from_result(result);
        if let Err(e) = publisher.publish(COMPLETED_TOPIC, &event) {
            warn!(topic = COMPLETED_TOPIC, error = %e, "failed to publish run event");
        }
    }
}

/// In-memory store implementing both collaborator traits.
#[derive(Debug, Default)]
pub struct MemorySink {
    results: Mutex<Vec<PsoResult>>,
    events: Mutex<Vec<(String, RunEvent)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of saved results.
    pub fn results(&self) -> Vec<PsoResult> {
        self.results
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Snapshot of published `(topic, event)` pairs.
    pub fn events(&self) -> Vec<(String, RunEvent)> {
        self.events
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }
}

impl ResultSink for MemorySink {
    fn save(&self, result: &PsoResult) -> Result<(), SinkError> {
        self.results
            .lock()
            .map_err(|_| SinkError::Persistence("result store lock poisoned".into()))?
            .push(result.clone());
        Ok(())
    }
}

impl EventPublisher for MemorySink {
    fn publish(&self, topic: &str, event: &RunEvent) -> Result<(), SinkError> {
        self.events
            .lock()
            .map_err(|_| SinkError::Publish {
                topic: topic.to_string(),
                reason: "event log lock poisoned".into(),
            })?
            .push((topic.to_string(), event.clone()));
        Ok(())
    }
}
