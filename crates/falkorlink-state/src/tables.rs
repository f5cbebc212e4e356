//! redb table definitions for the FalkorLink state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized records).

use redb::TableDefinition;

/// Site configuration records keyed by `{team_id}/{site_id}`.
pub const SITE_CONFIGS: TableDefinition<&str, &[u8]> = TableDefinition::new("site_configs");

/// Environment variables keyed by `{account_id}/{site_id}/{name}`.
pub const ENV_VARS: TableDefinition<&str, &[u8]> = TableDefinition::new("env_vars");
