//! JSON fixture used to seed a store with workspaces, users, the platform
//! config singleton and existing audit entries.

use std::path::Path;

use console_core::types::collections;
use console_core::{StoreError, StoreResult};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::document::{DocumentStore, Fields};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    #[serde(default)]
    pub workspaces: Vec<Value>,
    #[serde(default)]
    pub users: Vec<Value>,
    #[serde(default)]
    pub platform_config: Option<Value>,
    #[serde(default)]
    pub audit_log: Vec<Value>,
}

impl Fixture {
    pub fn from_json(raw: &str) -> StoreResult<Self> {
        serde_json::from_str(raw).map_err(|source| StoreError::Decode {
            path: "fixture".to_string(),
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Backend(format!("reading {}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    /// Write every fixture document into `store`.
    ///
    /// Workspaces and users keep their `id`; audit entries are appended and
    /// get store-assigned ids.
    pub async fn apply(&self, store: &dyn DocumentStore) -> StoreResult<()> {
        for doc in &self.workspaces {
            let (id, fields) = split_id(collections::WORKSPACES, doc)?;
            store.set_document(collections::WORKSPACES, &id, fields).await?;
        }
        for doc in &self.users {
            let (id, fields) = split_id(collections::USERS, doc)?;
            store.set_document(collections::USERS, &id, fields).await?;
        }
        if let Some(config) = &self.platform_config {
            store
                .set_document(
                    collections::PLATFORM,
                    collections::PLATFORM_CONFIG_ID,
                    object(collections::PLATFORM, config)?,
                )
                .await?;
        }
        for entry in &self.audit_log {
            let mut fields = object(collections::AUDIT_LOG, entry)?;
            fields.remove("id");
            store.add_document(collections::AUDIT_LOG, fields).await?;
        }
        info!(
            workspaces = self.workspaces.len(),
            users = self.users.len(),
            audit_entries = self.audit_log.len(),
            "Fixture applied"
        );
        Ok(())
    }
}

fn object(path: &str, value: &Value) -> StoreResult<Fields> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        other => Err(StoreError::Backend(format!(
            "fixture entry in {path} is not an object: {other}"
        ))),
    }
}

fn split_id(path: &str, value: &Value) -> StoreResult<(String, Fields)> {
    let mut fields = object(path, value)?;
    match fields.remove("id") {
        Some(Value::String(id)) if !id.is_empty() => Ok((id, fields)),
        _ => Err(StoreError::Backend(format!(
            "fixture entry in {path} has no string id"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    const SAMPLE: &str = r#"{
        "workspaces": [{"id": "w1", "name": "Acme", "members": {"u1": {"role": "owner"}}}],
        "users": [{"id": "u1", "name": "Ann", "email": "ann@example.com"}],
        "platformConfig": {"featureFlags": {"beta": true}},
        "auditLog": [{"id": "ignored", "action": "SUSPEND_USER"}]
    }"#;

    #[tokio::test]
    async fn test_apply_fixture() {
        let fixture = Fixture::from_json(SAMPLE).unwrap();
        let store = MemoryStore::new();
        fixture.apply(&store).await.unwrap();

        assert!(store.peek("workspaces", "w1").is_some());
        assert!(store.peek("users", "u1").is_some());
        assert!(store.peek("platform", "config").is_some());

        let log = store.query_collection("platform/config/auditLog").await.unwrap();
        assert_eq!(log.len(), 1);
        assert_ne!(log[0].id, "ignored");
        assert!(!log[0].fields.contains_key("id"));
    }

    #[tokio::test]
    async fn test_missing_id_rejected() {
        let fixture = Fixture::from_json(r#"{"users": [{"name": "No Id"}]}"#).unwrap();
        let store = MemoryStore::new();
        assert!(fixture.apply(&store).await.is_err());
    }

    #[test]
    fn test_demo_seed_parses() {
        let fixture = Fixture::from_json(include_str!("../../../demos/seed.json")).unwrap();
        assert_eq!(fixture.workspaces.len(), 3);
        assert_eq!(fixture.users.len(), 4);
        assert!(fixture.platform_config.is_some());
        assert_eq!(fixture.audit_log.len(), 2);
    }
}
