//! falkorlink-link — attach discovered FalkorDB instances to a site.
//!
//! The `Reconciler` is the top-level orchestrator:
//! - Validates the stored site configuration
//! - Re-validates account credentials on every discovery (nothing cached)
//! - Assigns each attached instance a stable slot (`idx`) from a persisted counter
//! - Writes the configuration first, then the slot's four environment variables
//! - Reverts the configuration write if the variable write fails
//!
//! Storage is reached through the `SiteConfigurations` and
//! `EnvironmentVariables` traits; `StateStore` implements both.

pub mod collaborators;
pub mod context;
pub mod error;
pub mod reconciler;

pub use collaborators::{EnvironmentVariables, SiteConfigurations, VariableDeletion, VariableUpdate};
pub use context::SiteContext;
pub use error::{ErrorKind, LinkError, LinkResult};
pub use reconciler::{AttachRequest, Reconciler};
