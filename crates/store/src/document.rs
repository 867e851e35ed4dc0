//! Store trait and document helpers.

use async_trait::async_trait;
use console_core::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Field map of a stored document. The document id is never part of it.
pub type Fields = serde_json::Map<String, Value>;

/// A document as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decode into a domain type, exposing the document id as its `id` field.
    pub fn decode<T: DeserializeOwned>(self, path: &str) -> StoreResult<T> {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id));
        serde_json::from_value(Value::Object(fields)).map_err(|source| StoreError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

/// Remote document store used by the console.
///
/// Paths name a collection (`users`) or a sub-collection
/// (`platform/config/auditLog`). Implementations return documents of a
/// collection in insertion order.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Full scan of a collection. No filtering or pagination.
    async fn query_collection(&self, path: &str) -> StoreResult<Vec<Document>>;

    /// Fetch one document, `None` when it does not exist.
    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Append a document; the store assigns and returns its id.
    async fn add_document(&self, path: &str, fields: Fields) -> StoreResult<String>;

    /// Merge `patch` into the existing document's top-level fields.
    ///
    /// Fails with [`StoreError::NotFound`] when the document does not exist.
    async fn update_document(&self, collection: &str, id: &str, patch: Fields) -> StoreResult<()>;

    /// Create or fully replace a document under a caller-chosen id.
    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;
}

/// Query a collection and decode its documents.
///
/// Documents that do not decode are logged, counted and left out; only a
/// failed query fails the call.
pub async fn query_as<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    path: &str,
) -> StoreResult<Vec<T>> {
    let docs = store.query_collection(path).await?;
    let mut decoded = Vec::with_capacity(docs.len());
    for doc in docs {
        let id = doc.id.clone();
        match doc.decode(path) {
            Ok(value) => decoded.push(value),
            Err(e) => skipped(path, &id, &e),
        }
    }
    Ok(decoded)
}

/// Fetch and decode one document. A document that does not decode reads as
/// absent.
pub async fn get_as<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
) -> StoreResult<Option<T>> {
    match store.get_document(collection, id).await? {
        Some(doc) => match doc.decode(collection) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                skipped(collection, id, &e);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

fn skipped(path: &str, id: &str, err: &StoreError) {
    warn!(path = path, id = id, error = %err, "Skipping undecodable document");
    metrics::counter!("console.store.documents_skipped", "path" => path.to_string())
        .increment(1);
}

/// Serialize a value into a field map, dropping any `id` field.
pub fn to_fields<T: Serialize>(value: &T) -> StoreResult<Fields> {
    match serde_json::to_value(value) {
        Ok(Value::Object(mut fields)) => {
            fields.remove("id");
            Ok(fields)
        }
        Ok(other) => Err(StoreError::Backend(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(source) => Err(StoreError::Decode {
            path: String::new(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{fields_of, MemoryStore, StoreOp};
    use console_core::types::User;
    use serde_json::json;

    #[test]
    fn test_decode_injects_id() {
        let fields = match json!({"name": "Ann", "email": "ann@example.com"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let user: User = Document::new("u1", fields).decode("users").unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.name, "Ann");
    }

    #[test]
    fn test_decode_failure_names_path() {
        let fields = match json!({"name": 42}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let err = Document::new("u1", fields).decode::<User>("users").unwrap_err();
        assert!(matches!(err, StoreError::Decode { ref path, .. } if path == "users"));
    }

    #[tokio::test]
    async fn test_query_as_skips_undecodable_documents() {
        let store = MemoryStore::new();
        store
            .set_document("users", "u1", fields_of(json!({"name": "Ann", "email": null})))
            .await
            .unwrap();
        store
            .set_document("users", "u2", fields_of(json!({"name": ["not", "a", "name"]})))
            .await
            .unwrap();
        store
            .set_document("users", "u3", fields_of(json!({"name": "Cy"})))
            .await
            .unwrap();

        let users: Vec<User> = query_as(&store, "users").await.unwrap();
        let ids: Vec<_> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u3"]);
        assert_eq!(users[0].email, "");
    }

    #[tokio::test]
    async fn test_get_as_reads_undecodable_as_absent() {
        let store = MemoryStore::new();
        store
            .set_document("users", "u1", fields_of(json!({"email": 7})))
            .await
            .unwrap();
        let user: Option<User> = get_as(&store, "users", "u1").await.unwrap();
        assert!(user.is_none());

        store.fail(StoreOp::Get, "users");
        assert!(get_as::<User>(&store, "users", "u1").await.is_err());
    }

    #[test]
    fn test_to_fields_strips_id() {
        let user = User {
            id: "u1".into(),
            name: "Ann".into(),
            email: "ann@example.com".into(),
            status: Default::default(),
        };
        let fields = to_fields(&user).unwrap();
        assert!(!fields.contains_key("id"));
        assert_eq!(fields["status"], "active");

        assert!(to_fields(&"plain string").is_err());
    }
}
