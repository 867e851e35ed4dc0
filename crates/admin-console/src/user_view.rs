//! User management table.

use console_core::types::{EntityStatus, Workspace};
use serde::Serialize;

use crate::filter::{FilterCounts, StatusFilter};
use crate::view_state::Snapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Workspaces listing the user as a member, under any role.
    pub workspace_count: usize,
    pub status: EntityStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsersView {
    pub filter: StatusFilter,
    pub counts: FilterCounts,
    pub rows: Vec<UserRow>,
}

pub fn users_view(snapshot: &Snapshot, filter: StatusFilter) -> UsersView {
    let counts = FilterCounts::tally(snapshot.users.iter().map(|u| u.status));
    let rows = snapshot
        .users
        .iter()
        .filter(|u| filter.matches(u.status))
        .map(|u| UserRow {
            id: u.id.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
            workspace_count: workspace_count(&u.id, &snapshot.workspaces),
            status: u.status,
        })
        .collect();

    UsersView {
        filter,
        counts,
        rows,
    }
}

pub fn workspace_count(user_id: &str, workspaces: &[Workspace]) -> usize {
    workspaces.iter().filter(|w| w.has_member(user_id)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_users_view() {
        let snap = Snapshot {
            users: serde_json::from_value(json!([
                {"id": "u1", "name": "Ann", "email": "ann@example.com"},
                {"id": "u2", "name": "Bob", "email": "bob@example.com", "status": "suspended"},
                {"id": "u3", "name": "Cy", "email": "cy@example.com", "status": "active"}
            ]))
            .unwrap(),
            workspaces: serde_json::from_value(json!([
                {"id": "w1", "name": "A", "members": {"u1": {"role": "owner"}, "u2": {"role": "member"}}},
                {"id": "w2", "name": "B", "members": {"u1": {"role": "member"}}}
            ]))
            .unwrap(),
            ..Default::default()
        };

        let all = users_view(&snap, StatusFilter::All);
        assert_eq!(all.rows[0].workspace_count, 2);
        assert_eq!(all.rows[1].workspace_count, 1);
        assert_eq!(all.rows[2].workspace_count, 0);

        let active = users_view(&snap, StatusFilter::Active);
        let suspended = users_view(&snap, StatusFilter::Suspended);
        let mut ids: Vec<_> = active
            .rows
            .iter()
            .chain(suspended.rows.iter())
            .map(|r| r.id.clone())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["u1", "u2", "u3"]);
        assert_eq!(suspended.rows.len(), 1);
        assert_eq!(all.counts.suspended, 1);
    }
}
