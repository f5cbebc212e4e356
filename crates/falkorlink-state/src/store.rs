//! StateStore — redb-backed persistence for FalkorLink.
//!
//! Provides typed CRUD operations over site configurations and environment
//! variables. All values are JSON-serialized into redb's `&[u8]` value
//! columns. The store supports both on-disk and in-memory backends (the
//! latter for testing).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(SITE_CONFIGS).map_err(map_err!(Table))?;
        txn.open_table(ENV_VARS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Site configurations ────────────────────────────────────────

    /// Get the configuration record for a site.
    pub fn get_site_config(
        &self,
        team_id: &str,
        site_id: &str,
    ) -> StateResult<Option<SiteConfigRecord>> {
        let key = site_key(team_id, site_id);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SITE_CONFIGS).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: SiteConfigRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                // A separator inside an id can alias another site's key.
                if record.team_id != team_id || record.site_id != site_id {
                    return Ok(None);
                }
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Create a configuration record. Fails if one already exists.
    pub fn create_site_config(
        &self,
        team_id: &str,
        site_id: &str,
        config: &serde_json::Value,
    ) -> StateResult<SiteConfigRecord> {
        let now = now_secs();
        let record = SiteConfigRecord {
            team_id: team_id.to_string(),
            site_id: site_id.to_string(),
            config: config.clone(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let key = record.table_key();
        let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SITE_CONFIGS).map_err(map_err!(Table))?;
            if table.get(key.as_str()).map_err(map_err!(Read))?.is_some() {
                return Err(StateError::AlreadyExists(key));
            }
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "site config created");
        Ok(record)
    }

    /// Replace the configuration of an existing record.
    pub fn update_site_config(
        &self,
        team_id: &str,
        site_id: &str,
        config: &serde_json::Value,
    ) -> StateResult<SiteConfigRecord> {
        let key = site_key(team_id, site_id);
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let record;
        {
            let mut table = txn.open_table(SITE_CONFIGS).map_err(map_err!(Table))?;
            let existing = table
                .get(key.as_str())
                .map_err(map_err!(Read))?
                .map(|guard| guard.value().to_vec());
            let Some(bytes) = existing else {
                return Err(StateError::NotFound(key));
            };
            let previous: SiteConfigRecord =
                serde_json::from_slice(&bytes).map_err(map_err!(Deserialize))?;
            record = SiteConfigRecord {
                config: config.clone(),
                version: previous.version + 1,
                updated_at: now_secs(),
                ..previous
            };
            let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, version = record.version, "site config updated");
        Ok(record)
    }

    /// Delete a site's configuration. Returns true if it existed.
    pub fn delete_site_config(&self, team_id: &str, site_id: &str) -> StateResult<bool> {
        let key = site_key(team_id, site_id);
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(SITE_CONFIGS).map_err(map_err!(Table))?;
            existed = table.remove(key.as_str()).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "site config deleted");
        Ok(existed)
    }

    // ── Environment variables ──────────────────────────────────────

    /// Create or overwrite a batch of variables in one transaction.
    pub fn put_env_vars(
        &self,
        account_id: &str,
        site_id: &str,
        variables: &BTreeMap<String, String>,
        is_secret: bool,
    ) -> StateResult<u32> {
        let now = now_secs();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(ENV_VARS).map_err(map_err!(Table))?;
            for (name, value) in variables {
                let var = EnvVar {
                    account_id: account_id.to_string(),
                    site_id: site_id.to_string(),
                    name: name.clone(),
                    value: value.clone(),
                    is_secret,
                    updated_at: now,
                };
                let key = var.table_key();
                let bytes = serde_json::to_vec(&var).map_err(map_err!(Serialize))?;
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(account_id, site_id, count = variables.len(), "env vars stored");
        Ok(variables.len() as u32)
    }

    /// Get one variable by name.
    pub fn get_env_var(
        &self,
        account_id: &str,
        site_id: &str,
        name: &str,
    ) -> StateResult<Option<EnvVar>> {
        let key = env_key(account_id, site_id, name);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ENV_VARS).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let var: EnvVar =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                if var.account_id != account_id || var.site_id != site_id {
                    return Ok(None);
                }
                Ok(Some(var))
            }
            None => Ok(None),
        }
    }

    /// List all variables of a site.
    pub fn list_env_vars(&self, account_id: &str, site_id: &str) -> StateResult<Vec<EnvVar>> {
        let prefix = format!("{}{KEY_SEPARATOR}", site_key(account_id, site_id));
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ENV_VARS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(&prefix) {
                let var: EnvVar =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                if var.account_id == account_id && var.site_id == site_id {
                    results.push(var);
                }
            }
        }
        Ok(results)
    }

    /// Delete variables by name in one transaction. Returns number deleted.
    pub fn delete_env_vars(
        &self,
        account_id: &str,
        site_id: &str,
        names: &[String],
    ) -> StateResult<u32> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let mut count = 0;
        {
            let mut table = txn.open_table(ENV_VARS).map_err(map_err!(Table))?;
            for name in names {
                let key = env_key(account_id, site_id, name);
                if table.remove(key.as_str()).map_err(map_err!(Write))?.is_some() {
                    count += 1;
                }
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(account_id, site_id, count, "env vars deleted");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // ── Site config CRUD ───────────────────────────────────────────

    #[test]
    fn site_config_create_and_get() {
        let store = StateStore::open_in_memory().unwrap();
        let config = json!({ "email": "a@b.io", "password": "pw" });

        let created = store.create_site_config("team", "site", &config).unwrap();
        let retrieved = store.get_site_config("team", "site").unwrap();

        assert_eq!(retrieved, Some(created));
        assert_eq!(retrieved.unwrap().version, 1);
    }

    #[test]
    fn site_config_get_nonexistent_returns_none() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(store.get_site_config("nope", "nothing").unwrap().is_none());
    }

    #[test]
    fn site_config_create_twice_fails() {
        let store = StateStore::open_in_memory().unwrap();
        store.create_site_config("t", "s", &json!({})).unwrap();
        let err = store.create_site_config("t", "s", &json!({})).unwrap_err();
        assert!(matches!(err, StateError::AlreadyExists(_)));
    }

    #[test]
    fn site_config_update_in_place() {
        let store = StateStore::open_in_memory().unwrap();
        store.create_site_config("t", "s", &json!({ "email": "a@b.io" })).unwrap();

        let updated = store
            .update_site_config("t", "s", &json!({ "email": "c@d.io" }))
            .unwrap();
        assert_eq!(updated.version, 2);

        let retrieved = store.get_site_config("t", "s").unwrap().unwrap();
        assert_eq!(retrieved.config["email"], "c@d.io");
        assert_eq!(retrieved.created_at, updated.created_at);
    }

    #[test]
    fn site_config_update_missing_fails() {
        let store = StateStore::open_in_memory().unwrap();
        let err = store.update_site_config("t", "s", &json!({})).unwrap_err();
        assert!(matches!(err, StateError::NotFound(_)));
    }

    #[test]
    fn site_config_delete() {
        let store = StateStore::open_in_memory().unwrap();
        store.create_site_config("t", "s", &json!({})).unwrap();

        assert!(store.delete_site_config("t", "s").unwrap());
        assert!(!store.delete_site_config("t", "s").unwrap());
        assert!(store.get_site_config("t", "s").unwrap().is_none());
    }

    // ── Env var CRUD ───────────────────────────────────────────────

    #[test]
    fn env_vars_put_and_list_scoped_to_site() {
        let store = StateStore::open_in_memory().unwrap();
        store
            .put_env_vars("acct", "site-1", &vars(&[("A", "1"), ("B", "2")]), true)
            .unwrap();
        store
            .put_env_vars("acct", "site-2", &vars(&[("A", "3")]), false)
            .unwrap();

        let site1 = store.list_env_vars("acct", "site-1").unwrap();
        assert_eq!(site1.len(), 2);
        assert!(site1.iter().all(|v| v.is_secret));

        let a = store.get_env_var("acct", "site-2", "A").unwrap().unwrap();
        assert_eq!(a.value, "3");
        assert!(!a.is_secret);
    }

    #[test]
    fn env_vars_overwrite() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_env_vars("a", "s", &vars(&[("X", "old")]), true).unwrap();
        store.put_env_vars("a", "s", &vars(&[("X", "new")]), true).unwrap();

        let all = store.list_env_vars("a", "s").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value, "new");
    }

    #[test]
    fn env_vars_delete_only_named() {
        let store = StateStore::open_in_memory().unwrap();
        store
            .put_env_vars("a", "s", &vars(&[("X", "1"), ("Y", "2"), ("Z", "3")]), true)
            .unwrap();

        let deleted = store
            .delete_env_vars("a", "s", &["X".to_string(), "Y".to_string(), "MISSING".to_string()])
            .unwrap();
        assert_eq!(deleted, 2);

        let left = store.list_env_vars("a", "s").unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "Z");
    }

    #[test]
    fn separator_in_ids_does_not_alias_sites() {
        let store = StateStore::open_in_memory().unwrap();
        store
            .create_site_config("team", "site/x", &json!({ "email": "a@b.io" }))
            .unwrap();
        store
            .put_env_vars("team", "site/x", &vars(&[("FALKORDB_HOSTNAME", "h")]), true)
            .unwrap();

        assert!(store.get_site_config("team/site", "x").unwrap().is_none());
        assert!(store.list_env_vars("team", "site").unwrap().is_empty());
        assert!(
            store
                .get_env_var("team/site", "x", "FALKORDB_HOSTNAME")
                .unwrap()
                .is_none()
        );
        assert_eq!(store.list_env_vars("team", "site/x").unwrap().len(), 1);
    }

    // ── Persistence (on-disk) ──────────────────────────────────────

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        {
            let store = StateStore::open(&db_path).unwrap();
            store
                .create_site_config("prod", "site", &json!({ "email": "a@b.io" }))
                .unwrap();
            store.put_env_vars("prod", "site", &vars(&[("K", "v")]), true).unwrap();
        }

        // Reopen the same database file.
        let store = StateStore::open(&db_path).unwrap();
        let record = store.get_site_config("prod", "site").unwrap();
        assert_eq!(record.unwrap().config["email"], "a@b.io");
        assert_eq!(store.list_env_vars("prod", "site").unwrap().len(), 1);
    }

    // ── Edge cases ─────────────────────────────────────────────────

    #[test]
    fn empty_store_operations() {
        let store = StateStore::open_in_memory().unwrap();

        assert!(store.list_env_vars("any", "site").unwrap().is_empty());
        assert!(store.get_env_var("any", "site", "X").unwrap().is_none());
        assert_eq!(store.delete_env_vars("any", "site", &["X".to_string()]).unwrap(), 0);
        assert!(!store.delete_site_config("nope", "nope").unwrap());
    }
}
