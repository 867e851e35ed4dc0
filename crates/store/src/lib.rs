#![warn(clippy::unwrap_used)]

//! Document-store collaborator: the async [`DocumentStore`] trait the console
//! talks to, plus an in-process backend and a Redis backend.

pub mod document;
pub mod fixture;
pub mod memory;
pub mod redis_store;

pub use document::{get_as, query_as, to_fields, Document, DocumentStore, Fields};
pub use fixture::Fixture;
pub use memory::{fields_of, MemoryStore, StoreCall, StoreOp};
pub use redis_store::RedisStore;
