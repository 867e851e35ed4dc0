//! Privileged console actions: suspend and reactivate workspaces and users,
//! and impersonate a workspace owner.
//!
//! Each command patches the store (impersonation does not), appends an audit
//! entry, and returns a typed outcome. Reloading the view state is left to
//! the caller.

use std::fmt;
use std::sync::Arc;

use console_core::types::{
    collections, AuditAction, AuditLogEntry, EntityStatus, TargetType, User, Workspace,
};
use console_core::{ConsoleResult, LookupError, StoreError};
use console_store::{DocumentStore, Fields};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::audit::AuditRecorder;
use crate::view_state::Snapshot;

const UNKNOWN: &str = "unknown";

/// An operator-triggered action. Ids come from the rendered snapshot and may
/// be stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    SuspendWorkspace(String),
    ReactivateWorkspace(String),
    SuspendUser(String),
    ReactivateUser(String),
    ImpersonateOwner(String),
}

impl AdminCommand {
    pub fn action(&self) -> AuditAction {
        match self {
            AdminCommand::SuspendWorkspace(_) => AuditAction::SuspendWorkspace,
            AdminCommand::ReactivateWorkspace(_) => AuditAction::ReactivateWorkspace,
            AdminCommand::SuspendUser(_) => AuditAction::SuspendUser,
            AdminCommand::ReactivateUser(_) => AuditAction::ReactivateUser,
            AdminCommand::ImpersonateOwner(_) => AuditAction::Impersonate,
        }
    }

    pub fn target_type(&self) -> TargetType {
        match self {
            AdminCommand::SuspendUser(_) | AdminCommand::ReactivateUser(_) => TargetType::User,
            _ => TargetType::Workspace,
        }
    }

    pub fn target_id(&self) -> &str {
        match self {
            AdminCommand::SuspendWorkspace(id)
            | AdminCommand::ReactivateWorkspace(id)
            | AdminCommand::SuspendUser(id)
            | AdminCommand::ReactivateUser(id)
            | AdminCommand::ImpersonateOwner(id) => id,
        }
    }

    /// Whether the command patches the store.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, AdminCommand::ImpersonateOwner(_))
    }
}

impl fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action(), self.target_id())
    }
}

/// What happened to the audit entry of an applied action.
#[derive(Debug)]
pub enum AuditOutcome {
    Recorded(AuditLogEntry),
    /// The action took effect but its audit entry could not be appended.
    Missing(StoreError),
}

/// Owner identity resolved for an impersonation hand-off.
#[derive(Debug, Clone, PartialEq)]
pub struct Impersonation {
    pub user: User,
    pub workspace: Workspace,
}

/// Result of an applied command.
#[derive(Debug)]
pub struct ActionOutcome {
    pub command: AdminCommand,
    pub audit: AuditOutcome,
    pub impersonation: Option<Impersonation>,
}

impl ActionOutcome {
    pub fn audit_entry(&self) -> Option<&AuditLogEntry> {
        match &self.audit {
            AuditOutcome::Recorded(entry) => Some(entry),
            AuditOutcome::Missing(_) => None,
        }
    }

    /// True when the store change and its audit entry were both written.
    pub fn is_complete(&self) -> bool {
        matches!(self.audit, AuditOutcome::Recorded(_))
    }
}

pub struct ActionDispatcher {
    store: Arc<dyn DocumentStore>,
    recorder: AuditRecorder,
}

impl ActionDispatcher {
    pub fn new(store: Arc<dyn DocumentStore>, recorder: AuditRecorder) -> Self {
        Self { store, recorder }
    }

    pub fn recorder(&self) -> &AuditRecorder {
        &self.recorder
    }

    /// Execute one command against the store, resolving names and owners
    /// from `snapshot`.
    pub async fn dispatch(
        &self,
        command: &AdminCommand,
        snapshot: &Snapshot,
    ) -> ConsoleResult<ActionOutcome> {
        let action = command.action();
        metrics::counter!("console.actions.dispatched", "action" => action.to_string())
            .increment(1);

        let result = match command {
            AdminCommand::SuspendWorkspace(id) => {
                let details = format!("Suspended workspace: {}", workspace_name(snapshot, id));
                self.set_status(command, collections::WORKSPACES, EntityStatus::Suspended, details)
                    .await
            }
            AdminCommand::ReactivateWorkspace(id) => {
                let details = format!("Reactivated workspace: {}", workspace_name(snapshot, id));
                self.set_status(command, collections::WORKSPACES, EntityStatus::Active, details)
                    .await
            }
            AdminCommand::SuspendUser(id) => {
                let details = format!("Suspended user: {}", describe_user(snapshot, id));
                self.set_status(command, collections::USERS, EntityStatus::Suspended, details)
                    .await
            }
            AdminCommand::ReactivateUser(id) => {
                let details = format!("Reactivated user: {}", describe_user(snapshot, id));
                self.set_status(command, collections::USERS, EntityStatus::Active, details)
                    .await
            }
            AdminCommand::ImpersonateOwner(id) => self.impersonate_owner(command, id, snapshot).await,
        };

        if result.is_err() {
            metrics::counter!("console.actions.failed", "action" => action.to_string())
                .increment(1);
        }
        result
    }

    async fn set_status(
        &self,
        command: &AdminCommand,
        collection: &str,
        status: EntityStatus,
        details: String,
    ) -> ConsoleResult<ActionOutcome> {
        let id = command.target_id();
        let mut patch = Fields::new();
        patch.insert("status".to_string(), Value::String(status.as_str().to_string()));

        if let Err(e) = self.store.update_document(collection, id, patch).await {
            error!(error = %e, command = %command, "Status change failed");
            return Err(e.into());
        }
        info!(collection = collection, id = id, status = %status, "Status changed");

        let audit = self.append_audit(command, details).await;
        Ok(ActionOutcome {
            command: command.clone(),
            audit,
            impersonation: None,
        })
    }

    async fn impersonate_owner(
        &self,
        command: &AdminCommand,
        workspace_id: &str,
        snapshot: &Snapshot,
    ) -> ConsoleResult<ActionOutcome> {
        let target = match resolve_owner(snapshot, workspace_id) {
            Ok(target) => target,
            Err(e) => {
                warn!(error = %e, workspace_id = workspace_id, "Impersonation target unresolved");
                return Err(e.into());
            }
        };

        let details = format!(
            "Impersonated owner {} of workspace {}",
            target.user.name, target.workspace.name
        );
        let audit = self.append_audit(command, details).await;
        info!(
            workspace_id = workspace_id,
            user_id = %target.user.id,
            "Owner impersonation authorized"
        );
        Ok(ActionOutcome {
            command: command.clone(),
            audit,
            impersonation: Some(target),
        })
    }

    async fn append_audit(&self, command: &AdminCommand, details: String) -> AuditOutcome {
        match self
            .recorder
            .record(
                command.action(),
                command.target_type(),
                command.target_id(),
                details,
            )
            .await
        {
            Ok(entry) => AuditOutcome::Recorded(entry),
            Err(e) => {
                warn!(command = %command, "Action applied without an audit entry");
                AuditOutcome::Missing(e)
            }
        }
    }
}

/// Find the workspace and its owner's user record in `snapshot`.
///
/// With several owners the first in user-id order is taken.
pub fn resolve_owner(snapshot: &Snapshot, workspace_id: &str) -> Result<Impersonation, LookupError> {
    let workspace = snapshot
        .workspace(workspace_id)
        .ok_or_else(|| LookupError::WorkspaceNotFound(workspace_id.to_string()))?;

    let owner = workspace.owner_entry().ok_or_else(|| LookupError::NoOwner {
        workspace_id: workspace_id.to_string(),
    })?;
    let owners = workspace.owner_count();
    if owners > 1 {
        warn!(workspace_id = workspace_id, owners, "Workspace has multiple owners");
    }

    let user = snapshot
        .user(&owner.user_id)
        .ok_or_else(|| LookupError::OwnerNotFound {
            workspace_id: workspace_id.to_string(),
            user_id: owner.user_id.clone(),
        })?;

    Ok(Impersonation {
        user: user.clone(),
        workspace: workspace.clone(),
    })
}

fn workspace_name(snapshot: &Snapshot, id: &str) -> String {
    snapshot
        .workspace(id)
        .map(|w| w.name.clone())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn describe_user(snapshot: &Snapshot, id: &str) -> String {
    snapshot
        .user(id)
        .map(|u| format!("{} ({})", u.name, u.email))
        .unwrap_or_else(|| UNKNOWN.to_string())
}
