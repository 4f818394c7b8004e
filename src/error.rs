use thiserror::Error;

use crate::supervisor::SupervisorState;

/// Cause type carried by every failure a resource callback can produce.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure attributed to a named supervisor.
///
/// Produced whenever `initialize`, `check`, or `teardown` fails; logged and
/// kept as the supervisor's last error. The supervisor name is attribution
/// for diagnostics only, it is not a way back into the state machine.
#[derive(Debug, Error)]
#[error("resource '{supervisor}': {message}")]
pub struct ResourceError {
    /// Name of the supervisor that produced the error.
    pub supervisor: String,
    /// What the supervisor was doing when the cause surfaced.
    pub message: String,
    /// The underlying failure from the wrapped dependency.
    #[source]
    pub cause: BoxError,
}

impl ResourceError {
    pub(crate) fn new(supervisor: &str, message: impl Into<String>, cause: BoxError) -> Self {
        Self {
            supervisor: supervisor.to_string(),
            message: message.into(),
            cause,
        }
    }
}

/// Errors returned to callers of the supervisor's public surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SupervisorError {
    /// The resource is not currently available. Recoverable: retry later,
    /// a heal attempt may already be scheduled. `state` tells you whether
    /// waiting can help (`Destroyed` never recovers).
    #[error("resource '{name}' is not ready (state: {state})")]
    NotReady {
        name: String,
        state: SupervisorState,
    },
}

impl SupervisorError {
    /// Distinguishes "retry later" from everything else, so callers can
    /// degrade a request instead of crashing.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady { .. })
    }
}
