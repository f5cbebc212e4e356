pub mod config;
pub mod env;
pub mod settings;
pub mod types;

pub use config::{ConfigError, FleetConfig, LinkConfig};
pub use env::{client_snippet, connection_variables, env_var_names, env_var_prefix};
pub use settings::{SchemaError, SettingsSummary, SiteSettings, merge_credentials};
pub use types::*;
