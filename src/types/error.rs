//! Error taxonomy for verification requests
//!
//! Every variant except `Persistence` on a cache write aborts the request.

use thiserror::Error;

/// Failure of a verification or fixture operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// Malformed URL, missing field, bad time filter
    #[error("invalid input: {0}")]
    Input(String),

    /// Data source call failed
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// Replay fixture absent or unreadable
    #[error("{0}")]
    NotFound(String),

    /// Storage write failed
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl VerifyError {
    /// Stable code string (for logging and API bodies)
    pub fn code(&self) -> &'static str {
        match self {
            Self::Input(_) => "R100_INPUT_INVALID",
            Self::Upstream(_) => "R200_UPSTREAM_FAILED",
            Self::NotFound(_) => "R300_FIXTURE_MISSING",
            Self::Persistence(_) => "R400_PERSISTENCE_FAILED",
        }
    }

    /// Short human description of the category
    pub fn description(&self) -> &'static str {
        match self {
            Self::Input(_) => "Request rejected",
            Self::Upstream(_) => "Data source unavailable",
            Self::NotFound(_) => "Fixture missing, generate fixtures first",
            Self::Persistence(_) => "Could not persist data",
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}
