//! Reconciler error types.

use falkorlink_core::SchemaError;
use falkorlink_fleet::FleetError;
use thiserror::Error;

/// Errors surfaced by reconciler operations.
///
/// Every variant carries a human-readable message; causes are reachable
/// through `std::error::Error::source`.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("{0} is required")]
    MissingContext(&'static str),

    #[error("{0} must not contain '/'")]
    InvalidContext(&'static str),

    #[error("{message}")]
    Auth {
        message: String,
        #[source]
        source: FleetError,
    },

    #[error("{message}")]
    Upstream {
        message: String,
        #[source]
        source: FleetError,
    },

    #[error("invalid site configuration")]
    InvalidConfig(#[source] SchemaError),

    #[error("instance {0} is already attached")]
    Duplicate(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("failed to resolve instance endpoint")]
    Normalization(#[source] FleetError),

    #[error("{message}")]
    EnvSyncFailed {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{message}")]
    Storage {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Coarse classification of a `LinkError`, used by transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingContext,
    InvalidContext,
    Auth,
    Upstream,
    InvalidConfig,
    Duplicate,
    NotFound,
    Normalization,
    EnvSyncFailed,
    Storage,
}

impl LinkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingContext(_) => ErrorKind::MissingContext,
            Self::InvalidContext(_) => ErrorKind::InvalidContext,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::Duplicate(_) => ErrorKind::Duplicate,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Normalization(_) => ErrorKind::Normalization,
            Self::EnvSyncFailed { .. } => ErrorKind::EnvSyncFailed,
            Self::Storage { .. } => ErrorKind::Storage,
        }
    }

    pub(crate) fn invalid_credentials(source: FleetError) -> Self {
        Self::Auth {
            message: "Invalid FalkorDB credentials".to_string(),
            source,
        }
    }

    /// Classify a discovery failure.
    pub(crate) fn discovery(source: FleetError) -> Self {
        if source.is_normalization() {
            return Self::Normalization(source);
        }
        match source {
            FleetError::Auth { .. } => Self::invalid_credentials(source),
            other => Self::Upstream {
                message: "Failed to get FalkorDB instances".to_string(),
                source: other,
            },
        }
    }

    pub(crate) fn storage(message: &str, source: anyhow::Error) -> Self {
        Self::Storage {
            message: message.to_string(),
            source,
        }
    }
}

pub type LinkResult<T> = Result<T, LinkError>;
