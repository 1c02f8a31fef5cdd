use thiserror::Error;

use crate::agent::HealthState;
use crate::entity::AgentId;

/// Errors raised by the core agent and population model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// `infect` was called on an agent that is not susceptible.
    /// This is a bug in the caller, never a user error.
    #[error("Precondition violated: cannot infect an agent in state {state:?}")]
    PreconditionViolation { state: HealthState },

    #[error("Unknown or stale agent id {0:?}")]
    UnknownAgent(AgentId),

    #[error("Dead agents cannot be added to a population")]
    InactiveAgent,

    /// An infected agent whose timer was never started by `infect`.
    #[error("Infected agent has no infection timer running")]
    UntimedInfection,

    #[error("Invalid arena: {0}")]
    InvalidArena(String),
}
