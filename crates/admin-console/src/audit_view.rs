//! Audit trail, newest entries first.

use chrono::{DateTime, Local, Utc};
use console_core::types::AuditLogEntry;
use serde::Serialize;

use crate::view_state::Snapshot;

pub const EMPTY_MESSAGE: &str = "No audit log entries found";
const UNKNOWN_TIME: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRow {
    pub id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub display_time: String,
    pub action: String,
    pub performed_by: String,
    pub target_type: String,
    pub target_id: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditView {
    pub rows: Vec<AuditRow>,
}

impl AuditView {
    /// Placeholder text when there is nothing to show.
    pub fn empty_message(&self) -> Option<&'static str> {
        self.rows.is_empty().then_some(EMPTY_MESSAGE)
    }
}

/// Entries ordered by timestamp, newest first. Entries without a readable
/// timestamp come last. The sort is stable, so equal timestamps keep store
/// order.
pub fn sorted_entries(log: &[AuditLogEntry]) -> Vec<&AuditLogEntry> {
    let mut entries: Vec<_> = log.iter().collect();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries
}

pub fn audit_view(snapshot: &Snapshot) -> AuditView {
    let rows = sorted_entries(&snapshot.audit_log)
        .into_iter()
        .map(|e| AuditRow {
            id: e.id.clone(),
            timestamp: e.timestamp,
            display_time: e
                .timestamp
                .as_ref()
                .map(format_timestamp)
                .unwrap_or_else(|| UNKNOWN_TIME.to_string()),
            action: e.action.to_string(),
            performed_by: e.performed_by.clone(),
            target_type: e.target_type.to_string(),
            target_id: e.target_id.clone(),
            details: e.details.clone(),
        })
        .collect();
    AuditView { rows }
}

/// Render a timestamp in the operator's local time zone.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use console_core::types::{AuditAction, TargetType};

    fn entry(id: &str, ts: DateTime<Utc>) -> AuditLogEntry {
        AuditLogEntry {
            id: id.into(),
            timestamp: Some(ts),
            action: AuditAction::SuspendUser,
            performed_by: "Super Admin".into(),
            target_type: TargetType::User,
            target_id: "u1".into(),
            details: String::new(),
        }
    }

    #[test]
    fn test_newest_first_regardless_of_store_order() {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let log = vec![
            entry("mid", base),
            entry("old", base - Duration::hours(3)),
            entry("new", base + Duration::minutes(5)),
            entry("tie", base),
        ];

        let sorted = sorted_entries(&log);
        let ids: Vec<_> = sorted.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "tie", "old"]);
        assert!(sorted.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_empty_log_message() {
        let view = audit_view(&Snapshot::default());
        assert_eq!(view.empty_message(), Some(EMPTY_MESSAGE));
    }

    #[test]
    fn test_rows_carry_wire_codes() {
        let snap = Snapshot {
            audit_log: vec![entry("a1", Utc::now())],
            ..Default::default()
        };
        let view = audit_view(&snap);
        assert_eq!(view.empty_message(), None);
        assert_eq!(view.rows[0].action, "SUSPEND_USER");
        assert_eq!(view.rows[0].target_type, "user");
        assert_eq!(view.rows[0].display_time.len(), "2024-05-01 12:00:00".len());
    }

    #[test]
    fn test_entries_without_timestamp_sort_last() {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut undated = entry("undated", base);
        undated.timestamp = None;
        let snap = Snapshot {
            audit_log: vec![undated, entry("old", base), entry("new", base + Duration::days(1))],
            ..Default::default()
        };

        let view = audit_view(&snap);
        let ids: Vec<_> = view.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
        assert_eq!(view.rows[2].display_time, "unknown");
    }
}
