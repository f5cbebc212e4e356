//! Environment-variable naming for attached instances.
//!
//! Slot 0 uses the bare `FALKORDB_` prefix, every other slot `FALKORDB_{idx}_`.

use std::collections::BTreeMap;

use crate::types::AttachedInstance;

pub const ENV_PREFIX: &str = "FALKORDB_";

/// Variable suffixes written for every attached instance.
pub const ENV_KEYS: [&str; 4] = ["HOSTNAME", "PORT", "USERNAME", "PASSWORD"];

pub fn env_var_prefix(idx: u32) -> String {
    if idx == 0 {
        ENV_PREFIX.to_string()
    } else {
        format!("{ENV_PREFIX}{idx}_")
    }
}

/// The four variable names owned by a slot.
pub fn env_var_names(idx: u32) -> Vec<String> {
    let prefix = env_var_prefix(idx);
    ENV_KEYS.iter().map(|key| format!("{prefix}{key}")).collect()
}

/// Variable values for an attached instance. Missing endpoint parts become "".
pub fn connection_variables(instance: &AttachedInstance) -> BTreeMap<String, String> {
    let prefix = env_var_prefix(instance.idx);
    let port = instance.port.map(|p| p.to_string()).unwrap_or_default();
    BTreeMap::from([
        (
            format!("{prefix}HOSTNAME"),
            instance.hostname.clone().unwrap_or_default(),
        ),
        (format!("{prefix}PORT"), port),
        (format!("{prefix}USERNAME"), instance.username.clone()),
        (
            format!("{prefix}PASSWORD"),
            instance.password.clone().unwrap_or_default(),
        ),
    ])
}

/// JavaScript snippet that connects using a slot's variables.
pub fn client_snippet(idx: u32) -> String {
    let prefix = env_var_prefix(idx);
    format!(
        r#"import FalkorDB from "falkordb";

const client = await FalkorDB.connect({{
  socket: {{
    host: process.env.{prefix}HOSTNAME,
    port: Number(process.env.{prefix}PORT),
  }},
  username: process.env.{prefix}USERNAME,
  password: process.env.{prefix}PASSWORD,
}});

const graph = client.selectGraph("my_graph");

await graph.query("CREATE (n:Person {{name: 'Bob'}})");

await client.close();
"#
    )
}
