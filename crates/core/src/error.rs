use thiserror::Error;

pub type ConsoleResult<T> = Result<T, ConsoleError>;
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of any read or write against the document store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to decode document at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// An impersonation target that cannot be resolved from the loaded snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(String),

    #[error("No owner found for workspace {workspace_id}")]
    NoOwner { workspace_id: String },

    #[error("Owner user {user_id} of workspace {workspace_id} not found")]
    OwnerNotFound {
        workspace_id: String,
        user_id: String,
    },
}

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for ConsoleError {
    fn from(err: config::ConfigError) -> Self {
        ConsoleError::Config(err.to_string())
    }
}
