//! Audit recorder: builds immutable audit entries and appends them to the
//! platform audit log.

use std::sync::Arc;

use chrono::Utc;
use console_core::types::{collections, AuditAction, AuditLogEntry, TargetType};
use console_core::StoreResult;
use console_store::{to_fields, DocumentStore};
use tracing::{error, info};

pub struct AuditRecorder {
    store: Arc<dyn DocumentStore>,
    actor_label: String,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn DocumentStore>, actor_label: impl Into<String>) -> Self {
        Self {
            store,
            actor_label: actor_label.into(),
        }
    }

    /// Label written to `performedBy`. Fixed per console, not per session.
    pub fn actor_label(&self) -> &str {
        &self.actor_label
    }

    /// Build an unsaved entry stamped with the current time.
    pub fn build_entry(
        &self,
        action: AuditAction,
        target_type: TargetType,
        target_id: &str,
        details: String,
    ) -> AuditLogEntry {
        AuditLogEntry {
            id: String::new(),
            timestamp: Some(Utc::now()),
            action,
            performed_by: self.actor_label.clone(),
            target_type,
            target_id: target_id.to_string(),
            details,
        }
    }

    /// Append one entry and return it with its store-assigned id.
    pub async fn record(
        &self,
        action: AuditAction,
        target_type: TargetType,
        target_id: &str,
        details: String,
    ) -> StoreResult<AuditLogEntry> {
        let mut entry = self.build_entry(action, target_type, target_id, details);
        let fields = to_fields(&entry)?;

        match self.store.add_document(collections::AUDIT_LOG, fields).await {
            Ok(id) => {
                entry.id = id;
                info!(
                    entry_id = %entry.id,
                    action = %entry.action,
                    target_type = %entry.target_type,
                    target_id = %entry.target_id,
                    "Audit entry recorded"
                );
                Ok(entry)
            }
            Err(e) => {
                error!(
                    error = %e,
                    action = %entry.action,
                    target_id = %entry.target_id,
                    "Failed to append audit entry"
                );
                metrics::counter!("console.audit.append_failed").increment(1);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_store::{MemoryStore, StoreOp};

    #[tokio::test]
    async fn test_record_appends_entry() {
        let store = Arc::new(MemoryStore::new());
        let recorder = AuditRecorder::new(store.clone(), "Super Admin");

        let entry = recorder
            .record(
                AuditAction::SuspendUser,
                TargetType::User,
                "u1",
                "Suspended user: Ann (ann@example.com)".into(),
            )
            .await
            .unwrap();

        assert!(!entry.id.is_empty());
        assert_eq!(entry.performed_by, "Super Admin");

        let stored = store.peek(collections::AUDIT_LOG, &entry.id).unwrap();
        assert_eq!(stored.fields["action"], "SUSPEND_USER");
        assert_eq!(stored.fields["targetType"], "user");
        assert_eq!(stored.fields["performedBy"], "Super Admin");
        assert!(stored.fields["timestamp"].is_string());
        assert!(!stored.fields.contains_key("id"));
    }

    #[tokio::test]
    async fn test_record_propagates_store_failure() {
        let store = Arc::new(MemoryStore::new());
        store.fail(StoreOp::Add, collections::AUDIT_LOG);
        let recorder = AuditRecorder::new(store.clone(), "Super Admin");

        let result = recorder
            .record(
                AuditAction::Impersonate,
                TargetType::Workspace,
                "w1",
                "x".into(),
            )
            .await;
        assert!(result.is_err());
        assert!(store.is_empty(collections::AUDIT_LOG));
    }

    #[test]
    fn test_build_entry_uses_actor_label() {
        let recorder = AuditRecorder::new(Arc::new(MemoryStore::new()), "Ops Oncall");
        let entry = recorder.build_entry(
            AuditAction::ReactivateWorkspace,
            TargetType::Workspace,
            "w1",
            "Reactivated workspace: Acme".into(),
        );
        assert_eq!(entry.performed_by, "Ops Oncall");
        assert!(entry.id.is_empty());
    }
}
