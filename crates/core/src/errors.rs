use thiserror::Error;

use crate::review::session::ReviewState;

/// Shape violations in payloads handed over by the upstream pipeline stages.
///
/// These are the only hard errors on the intake path: validation states the
/// reviewer can act on (approval blockers, missing confidence data) are
/// modeled as values, not errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("expected exactly {expected} compliance checks, got {actual}")]
    CheckCountMismatch { expected: usize, actual: usize },
    #[error("expected at most {expected} compliance descriptions, got {actual}")]
    DescriptionOverflow { expected: usize, actual: usize },
}

/// Mutations attempted after a review session reached a terminal state.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("review session is closed (terminal state {state:?})")]
    SessionClosed { state: ReviewState },
}
