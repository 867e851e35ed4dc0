//! Platform overview — workspace and user totals plus the most recent
//! entries of each collection.

use console_core::types::EntityStatus;
use serde::Serialize;

use crate::filter::FilterCounts;
use crate::view_state::Snapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentWorkspace {
    pub id: String,
    pub name: String,
    pub member_count: usize,
    pub status: EntityStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub status: EntityStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub workspaces: FilterCounts,
    pub users: FilterCounts,
    pub recent_workspaces: Vec<RecentWorkspace>,
    pub recent_users: Vec<RecentUser>,
}

/// Build the overview. "Recent" is the first `recent_limit` entries in store
/// order.
pub fn dashboard_view(snapshot: &Snapshot, recent_limit: usize) -> DashboardView {
    DashboardView {
        workspaces: FilterCounts::tally(snapshot.workspaces.iter().map(|w| w.status)),
        users: FilterCounts::tally(snapshot.users.iter().map(|u| u.status)),
        recent_workspaces: snapshot
            .workspaces
            .iter()
            .take(recent_limit)
            .map(|w| RecentWorkspace {
                id: w.id.clone(),
                name: w.name.clone(),
                member_count: w.member_count(),
                status: w.status,
            })
            .collect(),
        recent_users: snapshot
            .users
            .iter()
            .take(recent_limit)
            .map(|u| RecentUser {
                id: u.id.clone(),
                name: u.name.clone(),
                email: u.email.clone(),
                status: u.status,
            })
            .collect(),
    }
}
