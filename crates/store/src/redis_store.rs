//! Redis-backed document store.
//!
//! Each collection path maps to a hash `<prefix>:<path>` holding documents as
//! JSON strings keyed by id, plus a list `<prefix>:<path>:ids` recording
//! insertion order.

use std::collections::HashMap;

use async_trait::async_trait;
use console_core::{StoreError, StoreResult};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};
use uuid::Uuid;

use crate::document::{Document, DocumentStore, Fields};

/// Shares one auto-reconnecting multiplexed connection across all calls.
pub struct RedisStore {
    manager: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    /// Connect and verify connectivity with `PING`.
    pub async fn connect(url: &str, prefix: impl Into<String>) -> StoreResult<Self> {
        info!(url = %url, "Connecting to Redis");

        let client = redis::Client::open(url).map_err(backend_error)?;
        let mut manager = ConnectionManager::new(client)
            .await
            .map_err(backend_error)?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut manager)
            .await
            .map_err(backend_error)?;
        info!(response = %pong, "Redis connection established");

        Ok(Self {
            manager,
            prefix: prefix.into(),
        })
    }

    fn docs_key(&self, path: &str) -> String {
        docs_key(&self.prefix, path)
    }

    fn ids_key(&self, path: &str) -> String {
        ids_key(&self.prefix, path)
    }

    /// Handle onto the shared connection. Cloning is cheap.
    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

fn docs_key(prefix: &str, path: &str) -> String {
    format!("{prefix}:{path}")
}

fn ids_key(prefix: &str, path: &str) -> String {
    format!("{prefix}:{path}:ids")
}

fn backend_error(err: redis::RedisError) -> StoreError {
    if err.is_io_error()
        || err.is_timeout()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
    {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Backend(err.to_string())
    }
}

fn encode(fields: &Fields) -> StoreResult<String> {
    serde_json::to_string(fields).map_err(|e| StoreError::Backend(e.to_string()))
}

fn decode(path: &str, raw: &str) -> StoreResult<Fields> {
    serde_json::from_str(raw).map_err(|source| StoreError::Decode {
        path: path.to_string(),
        source,
    })
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn query_collection(&self, path: &str) -> StoreResult<Vec<Document>> {
        let mut conn = self.conn();
        let ids: Vec<String> = conn
            .lrange(self.ids_key(path), 0, -1)
            .await
            .map_err(backend_error)?;
        let mut raw_docs: HashMap<String, String> = conn
            .hgetall(self.docs_key(path))
            .await
            .map_err(backend_error)?;

        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(raw) = raw_docs.remove(&id) {
                let fields = decode(path, &raw)?;
                docs.push(Document::new(id, fields));
            }
        }
        debug!(path = path, count = docs.len(), "Collection queried");
        Ok(docs)
    }

    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let mut conn = self.conn();
        let raw: Option<String> = conn
            .hget(self.docs_key(collection), id)
            .await
            .map_err(backend_error)?;
        match raw {
            Some(raw) => Ok(Some(Document::new(id, decode(collection, &raw)?))),
            None => Ok(None),
        }
    }

    async fn add_document(&self, path: &str, fields: Fields) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        let json = encode(&fields)?;
        let mut conn = self.conn();
        redis::pipe()
            .atomic()
            .hset(self.docs_key(path), &id, json)
            .ignore()
            .rpush(self.ids_key(path), &id)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(backend_error)?;
        Ok(id)
    }

    async fn update_document(&self, collection: &str, id: &str, patch: Fields) -> StoreResult<()> {
        let mut conn = self.conn();
        let key = self.docs_key(collection);
        let raw: Option<String> = conn.hget(&key, id).await.map_err(backend_error)?;
        let raw = raw.ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;

        // Read-merge-write without WATCH: concurrent patches to one document race.
        let mut fields = decode(collection, &raw)?;
        for (k, v) in patch {
            if k != "id" {
                fields.insert(k, v);
            }
        }
        conn.hset::<_, _, _, ()>(&key, id, encode(&fields)?)
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn set_document(&self, collection: &str, id: &str, mut fields: Fields) -> StoreResult<()> {
        fields.remove("id");
        let json = encode(&fields)?;
        let mut conn = self.conn();
        let created: bool = conn
            .hset(self.docs_key(collection), id, json)
            .await
            .map_err(backend_error)?;
        if created {
            conn.rpush::<_, _, ()>(self.ids_key(collection), id)
                .await
                .map_err(backend_error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Requires a local Redis: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_roundtrip_against_local_redis() {
        let prefix = format!("console-test-{}", Uuid::new_v4());
        let store = RedisStore::connect("redis://localhost:6379", prefix)
            .await
            .unwrap();

        let mut fields = Fields::new();
        fields.insert("name".into(), "Acme".into());
        store.set_document("workspaces", "w1", fields).await.unwrap();

        let mut patch = Fields::new();
        patch.insert("status".into(), "suspended".into());
        store.update_document("workspaces", "w1", patch).await.unwrap();

        let docs = store.query_collection("workspaces").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].fields["name"], "Acme");
        assert_eq!(docs[0].fields["status"], "suspended");
    }

    #[test]
    fn test_keys_are_prefixed() {
        assert_eq!(docs_key("console", "users"), "console:users");
        assert_eq!(
            ids_key("console", "platform/config/auditLog"),
            "console:platform/config/auditLog:ids"
        );
    }
}
