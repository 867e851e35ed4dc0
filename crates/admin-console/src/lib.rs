//! Super-admin console for the multi-tenant platform. Dispatches privileged
//! actions against the document store, records them in the audit log, and
//! renders read-only views over the last committed snapshot.
//!
//! # Modules
//!
//! - [`audit`] — Audit recorder (append-only entries in `platform/config/auditLog`)
//! - [`dispatcher`] — Suspend / reactivate / impersonate commands and their outcomes
//! - [`view_state`] — Snapshot holder and the all-or-nothing reload protocol
//! - [`filter`] — Active / suspended status filter shared by the table views
//! - [`dashboard`] — Platform overview counts and recent entities
//! - [`workspace_view`] — Workspace table
//! - [`user_view`] — User table
//! - [`audit_view`] — Audit trail, newest first
//! - [`config_view`] — Feature flags and default permissions
//! - [`session`] — Session collaborator (logout, impersonation hand-off)
//! - [`panel`] — Ties state, dispatcher, session and view selection together

pub mod audit;
pub mod audit_view;
pub mod config_view;
pub mod dashboard;
pub mod dispatcher;
pub mod filter;
pub mod panel;
pub mod session;
pub mod user_view;
pub mod view_state;
pub mod workspace_view;

pub use audit::AuditRecorder;
pub use dispatcher::{ActionDispatcher, ActionOutcome, AdminCommand, AuditOutcome, Impersonation};
pub use filter::{FilterCounts, StatusFilter};
pub use panel::{SuperAdminPanel, View, ViewModel};
pub use session::SessionHandler;
pub use view_state::{Snapshot, ViewState};
