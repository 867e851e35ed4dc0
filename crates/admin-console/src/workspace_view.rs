//! Workspace management table.

use console_core::types::{EntityStatus, User, Workspace};
use serde::Serialize;

use crate::filter::{FilterCounts, StatusFilter};
use crate::view_state::Snapshot;

const UNKNOWN_OWNER: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkspaceRow {
    pub id: String,
    pub name: String,
    pub owner_name: String,
    pub member_count: usize,
    pub status: EntityStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkspacesView {
    pub filter: StatusFilter,
    pub counts: FilterCounts,
    pub rows: Vec<WorkspaceRow>,
}

/// Rows for every workspace matching `filter`, in store order.
pub fn workspaces_view(snapshot: &Snapshot, filter: StatusFilter) -> WorkspacesView {
    let counts = FilterCounts::tally(snapshot.workspaces.iter().map(|w| w.status));
    let rows = snapshot
        .workspaces
        .iter()
        .filter(|w| filter.matches(w.status))
        .map(|w| WorkspaceRow {
            id: w.id.clone(),
            name: w.name.clone(),
            owner_name: owner_name(w, &snapshot.users),
            member_count: w.member_count(),
            status: w.status,
        })
        .collect();

    WorkspacesView {
        filter,
        counts,
        rows,
    }
}

/// Display name of the workspace owner, or "Unknown" when there is no owner
/// entry or the owner's user record has no name.
pub fn owner_name(workspace: &Workspace, users: &[User]) -> String {
    workspace
        .owner_entry()
        .and_then(|owner| users.iter().find(|u| u.id == owner.user_id))
        .map(|u| u.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_OWNER)
        .to_string()
}
