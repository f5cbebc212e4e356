//! falkorlink-fleet — discovery of managed FalkorDB instances.
//!
//! Talks to the fleet-management API on behalf of a site account.
//!
//! # Architecture
//!
//! ```text
//! FleetClient
//!   ├── admin_token()                       GET  auth endpoint (API key)
//!   ├── user_token(admin, email, password)  POST customer-user-signin
//!   ├── list_subscriptions(user)            POST subscription action
//!   ├── list_instances_for_subscription()   GET  fleet instances → normalize
//!   └── list_all_instances(admin, user)     fan-out over subscriptions, join, flatten
//! ```
//!
//! Nothing is cached and nothing is retried: every call goes upstream and
//! failures surface immediately. Auth failures (bad credentials, network
//! errors, non-2xx) all map to `FleetError::Auth`.
//!
//! Raw instance records carry their endpoint inside a topology map keyed by
//! internal resource ids. `normalize` picks the single user-facing entry and
//! refuses to guess when there are zero or several.

pub mod aggregate;
pub mod auth;
pub mod client;
pub mod directory;
pub mod error;
pub mod instances;
pub mod normalize;
pub mod subscriptions;

pub use auth::{AdminToken, UserToken};
pub use client::FleetClient;
pub use directory::FleetDirectory;
pub use error::{FleetError, FleetResult};
