//! Fleet client error types.

use thiserror::Error;

/// Errors that can occur while talking to the fleet API.
#[derive(Debug, Error)]
pub enum FleetError {
    /// Credentials rejected or the token service unreachable; not distinguished.
    #[error("authentication failed: {message}")]
    Auth {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("fleet API request failed: {message}")]
    Upstream {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("no resolvable endpoint for instance {instance_id}")]
    NoEndpoint { instance_id: String },

    #[error("ambiguous endpoint for instance {instance_id}: {candidates} topology entries qualify")]
    AmbiguousEndpoint {
        instance_id: String,
        candidates: usize,
    },

    #[error("malformed instance record: {0}")]
    MalformedRecord(String),
}

impl FleetError {
    pub(crate) fn auth(message: impl Into<String>, source: Option<reqwest::Error>) -> Self {
        Self::Auth {
            message: message.into(),
            source,
        }
    }

    pub(crate) fn upstream(message: impl Into<String>, source: Option<reqwest::Error>) -> Self {
        Self::Upstream {
            message: message.into(),
            source,
        }
    }

    /// Whether the error came from interpreting instance data rather than transport.
    pub fn is_normalization(&self) -> bool {
        matches!(
            self,
            Self::NoEndpoint { .. } | Self::AmbiguousEndpoint { .. } | Self::MalformedRecord(_)
        )
    }
}

pub type FleetResult<T> = Result<T, FleetError>;
