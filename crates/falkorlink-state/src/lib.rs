//! falkorlink-state — embedded state store for FalkorLink.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for the two collaborators the link reconciler writes to: per-site
//! configuration records and per-site environment variables.
//!
//! # Architecture
//!
//! All records are JSON-serialized into redb's `&[u8]` value columns.
//! Composite keys (`{team}/{site}`, `{account}/{site}/{NAME}`) enable
//! prefix scans over one site's variables.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
