//! View state holder. Keeps the last committed snapshot of the four
//! collections and replaces it wholesale on every successful reload.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use console_core::types::{collections, AuditLogEntry, PlatformConfig, User, Workspace};
use console_core::StoreResult;
use console_store::{get_as, query_as, DocumentStore};
use parking_lot::RwLock;
use tracing::{error, info};

/// Self-consistent copy of the store contents the views render from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub workspaces: Vec<Workspace>,
    pub users: Vec<User>,
    /// `None` when the `platform/config` document does not exist.
    pub platform_config: Option<PlatformConfig>,
    pub audit_log: Vec<AuditLogEntry>,
    /// Revision of the reload that produced this snapshot; 0 before the first commit.
    pub revision: u64,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn workspace(&self, id: &str) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.id == id)
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

/// Single-writer holder of the current [`Snapshot`].
///
/// Reloads are never cancelled. When two overlap, whichever finishes last is
/// committed, even if it started first.
pub struct ViewState {
    store: Arc<dyn DocumentStore>,
    current: RwLock<Arc<Snapshot>>,
    next_revision: AtomicU64,
}

impl ViewState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            current: RwLock::new(Arc::new(Snapshot::default())),
            next_revision: AtomicU64::new(0),
        }
    }

    /// The last committed snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    /// Fetch all four collections concurrently and commit them as one
    /// snapshot. If any fetch fails nothing is committed.
    pub async fn reload(&self) -> StoreResult<Arc<Snapshot>> {
        let revision = self.next_revision.fetch_add(1, Ordering::SeqCst) + 1;
        let store = self.store.as_ref();

        let fetched = tokio::try_join!(
            query_as::<Workspace>(store, collections::WORKSPACES),
            query_as::<User>(store, collections::USERS),
            get_as::<PlatformConfig>(
                store,
                collections::PLATFORM,
                collections::PLATFORM_CONFIG_ID
            ),
            query_as::<AuditLogEntry>(store, collections::AUDIT_LOG),
        );

        match fetched {
            Ok((workspaces, users, platform_config, audit_log)) => {
                let snapshot = Arc::new(Snapshot {
                    workspaces,
                    users,
                    platform_config,
                    audit_log,
                    revision,
                    loaded_at: Some(Utc::now()),
                });
                *self.current.write() = snapshot.clone();
                metrics::counter!("console.reload.committed").increment(1);
                info!(
                    revision,
                    workspaces = snapshot.workspaces.len(),
                    users = snapshot.users.len(),
                    audit_entries = snapshot.audit_log.len(),
                    "Snapshot committed"
                );
                Ok(snapshot)
            }
            Err(e) => {
                metrics::counter!("console.reload.failed").increment(1);
                error!(error = %e, revision, "Reload abandoned, keeping previous snapshot");
                Err(e)
            }
        }
    }
}
