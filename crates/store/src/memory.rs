//! In-process document store backed by DashMap.
//!
//! Besides serving the CLI's `memory` backend it records every call it
//! receives and can be told to fail or delay specific operations, which the
//! console's tests rely on.

use std::time::Duration;

use async_trait::async_trait;
use console_core::{StoreError, StoreResult};
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::document::{Document, DocumentStore, Fields};

/// Store operation kinds, used for call recording and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Query,
    Get,
    Add,
    Update,
    Set,
}

/// One call received by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub path: String,
    pub id: Option<String>,
    pub payload: Option<Fields>,
}

/// Lock-free in-memory collections, insertion ordered per collection.
#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, Vec<Document>>,
    faults: DashSet<(StoreOp, String)>,
    delays: DashMap<(StoreOp, String), Duration>,
    calls: Mutex<Vec<StoreCall>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `op` against `path` fail with [`StoreError::Unavailable`]
    /// until [`MemoryStore::heal`] is called.
    pub fn fail(&self, op: StoreOp, path: impl Into<String>) {
        self.faults.insert((op, path.into()));
    }

    pub fn heal(&self, op: StoreOp, path: &str) {
        self.faults.remove(&(op, path.to_string()));
    }

    /// Delay every `op` against `path` before it executes.
    pub fn delay(&self, op: StoreOp, path: impl Into<String>, by: Duration) {
        self.delays.insert((op, path.into()), by);
    }

    pub fn clear_delay(&self, op: StoreOp, path: &str) {
        self.delays.remove(&(op, path.to_string()));
    }

    /// All calls received so far, oldest first.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Calls of one kind, oldest first.
    pub fn calls_of(&self, op: StoreOp) -> Vec<StoreCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.op == op)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Number of documents currently in a collection.
    pub fn len(&self, path: &str) -> usize {
        self.collections.get(path).map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, path: &str) -> bool {
        self.len(path) == 0
    }

    /// Direct read that bypasses recording, faults and delays.
    pub fn peek(&self, collection: &str, id: &str) -> Option<Document> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned())
    }

    async fn enter(
        &self,
        op: StoreOp,
        path: &str,
        id: Option<&str>,
        payload: Option<&Fields>,
    ) -> StoreResult<()> {
        self.calls.lock().push(StoreCall {
            op,
            path: path.to_string(),
            id: id.map(str::to_string),
            payload: payload.cloned(),
        });

        let delay = self
            .delays
            .get(&(op, path.to_string()))
            .map(|d| *d.value());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.faults.contains(&(op, path.to_string())) {
            debug!(op = ?op, path = path, "Injected store failure");
            return Err(StoreError::Unavailable(format!(
                "injected failure for {op:?} on {path}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query_collection(&self, path: &str) -> StoreResult<Vec<Document>> {
        self.enter(StoreOp::Query, path, None, None).await?;
        Ok(self
            .collections
            .get(path)
            .map(|docs| docs.value().clone())
            .unwrap_or_default())
    }

    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.enter(StoreOp::Get, collection, Some(id), None).await?;
        Ok(self.peek(collection, id))
    }

    async fn add_document(&self, path: &str, fields: Fields) -> StoreResult<String> {
        self.enter(StoreOp::Add, path, None, Some(&fields)).await?;
        let id = Uuid::new_v4().to_string();
        self.collections
            .entry(path.to_string())
            .or_default()
            .push(Document::new(id.clone(), fields));
        Ok(id)
    }

    async fn update_document(&self, collection: &str, id: &str, patch: Fields) -> StoreResult<()> {
        self.enter(StoreOp::Update, collection, Some(id), Some(&patch))
            .await?;
        let not_found = || StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        };
        let mut docs = self.collections.get_mut(collection).ok_or_else(not_found)?;
        let doc = docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(not_found)?;
        for (key, value) in patch {
            if key != "id" {
                doc.fields.insert(key, value);
            }
        }
        Ok(())
    }

    async fn set_document(&self, collection: &str, id: &str, mut fields: Fields) -> StoreResult<()> {
        self.enter(StoreOp::Set, collection, Some(id), Some(&fields))
            .await?;
        fields.remove("id");
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        match docs.iter().position(|d| d.id == id) {
            Some(idx) => docs[idx].fields = fields,
            None => docs.push(Document::new(id, fields)),
        }
        Ok(())
    }
}

/// Build a field map from a JSON object literal; non-objects yield an empty map.
pub fn fields_of(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_assigns_ids_in_insertion_order() {
        let store = MemoryStore::new();
        let a = store
            .add_document("log", fields_of(json!({"n": 1})))
            .await
            .unwrap();
        let b = store
            .add_document("log", fields_of(json!({"n": 2})))
            .await
            .unwrap();
        assert_ne!(a, b);

        let docs = store.query_collection("log").await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, a);
        assert_eq!(docs[1].fields["n"], 2);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        store
            .set_document("users", "u1", fields_of(json!({"name": "Ann", "status": "active"})))
            .await
            .unwrap();
        store
            .update_document("users", "u1", fields_of(json!({"status": "suspended"})))
            .await
            .unwrap();

        let doc = store.get_document("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], "Ann");
        assert_eq!(doc.fields["status"], "suspended");
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = MemoryStore::new();
        let err = store
            .update_document("users", "ghost", fields_of(json!({"status": "active"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_fault_injection_and_heal() {
        let store = MemoryStore::new();
        store.fail(StoreOp::Query, "users");
        assert!(matches!(
            store.query_collection("users").await,
            Err(StoreError::Unavailable(_))
        ));
        // Other paths and ops are unaffected.
        assert!(store.query_collection("workspaces").await.is_ok());

        store.heal(StoreOp::Query, "users");
        assert!(store.query_collection("users").await.is_ok());
    }

    #[tokio::test]
    async fn test_calls_are_recorded() {
        let store = MemoryStore::new();
        store
            .set_document("workspaces", "w1", fields_of(json!({"name": "Acme"})))
            .await
            .unwrap();
        store.clear_calls();

        store
            .update_document("workspaces", "w1", fields_of(json!({"status": "suspended"})))
            .await
            .unwrap();
        let updates = store.calls_of(StoreOp::Update);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].id.as_deref(), Some("w1"));
        assert_eq!(
            updates[0].payload.as_ref().unwrap()["status"],
            "suspended"
        );
    }

    #[tokio::test]
    async fn test_set_replaces_existing() {
        let store = MemoryStore::new();
        store
            .set_document("platform", "config", fields_of(json!({"a": 1, "b": 2})))
            .await
            .unwrap();
        store
            .set_document("platform", "config", fields_of(json!({"a": 3})))
            .await
            .unwrap();
        let doc = store.peek("platform", "config").unwrap();
        assert_eq!(doc.fields.len(), 1);
        assert_eq!(store.len("platform"), 1);
    }
}
