//! Super-admin panel: the console's top-level state machine.
//!
//! Owns the view state, the action dispatcher and the session handler, and
//! sequences each command as dispatch → (reload | impersonation hand-off).

use std::sync::Arc;

use console_core::config::ConsoleConfig;
use console_core::{ConsoleResult, StoreResult};
use console_store::DocumentStore;
use serde::Serialize;
use tracing::{error, info};

use crate::audit::AuditRecorder;
use crate::audit_view::{audit_view, AuditView};
use crate::config_view::{config_view, ConfigView};
use crate::dashboard::{dashboard_view, DashboardView};
use crate::dispatcher::{ActionDispatcher, ActionOutcome, AdminCommand};
use crate::filter::StatusFilter;
use crate::session::SessionHandler;
use crate::user_view::{users_view, UsersView};
use crate::view_state::{Snapshot, ViewState};
use crate::workspace_view::{workspaces_view, WorkspacesView};

/// Tabs of the console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Dashboard,
    Workspaces,
    Users,
    Audit,
    Config,
}

/// Rendered content of the selected view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum ViewModel {
    Dashboard(DashboardView),
    Workspaces(WorkspacesView),
    Users(UsersView),
    Audit(AuditView),
    Config(ConfigView),
}

pub struct SuperAdminPanel {
    state: ViewState,
    dispatcher: ActionDispatcher,
    session: Arc<dyn SessionHandler>,
    current_view: View,
    workspace_filter: StatusFilter,
    user_filter: StatusFilter,
    recent_limit: usize,
}

impl SuperAdminPanel {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        session: Arc<dyn SessionHandler>,
        config: &ConsoleConfig,
    ) -> Self {
        let recorder = AuditRecorder::new(store.clone(), config.actor_label.clone());
        Self {
            state: ViewState::new(store.clone()),
            dispatcher: ActionDispatcher::new(store, recorder),
            session,
            current_view: View::default(),
            workspace_filter: StatusFilter::All,
            user_filter: StatusFilter::All,
            recent_limit: config.recent_limit,
        }
    }

    /// Initial load. A failure leaves the empty snapshot in place.
    pub async fn mount(&self) -> StoreResult<Arc<Snapshot>> {
        info!("Super admin panel mounted");
        self.state.reload().await
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.snapshot()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn current_view(&self) -> View {
        self.current_view
    }

    pub fn select_view(&mut self, view: View) {
        self.current_view = view;
    }

    pub fn set_workspace_filter(&mut self, filter: StatusFilter) {
        self.workspace_filter = filter;
    }

    pub fn set_user_filter(&mut self, filter: StatusFilter) {
        self.user_filter = filter;
    }

    /// Dispatch `command` against the current snapshot.
    ///
    /// After an applied status change the snapshot is reloaded, also when its
    /// audit entry is missing; a failed reload is logged and leaves the old
    /// snapshot. After an authorized impersonation the session handler takes
    /// over and no reload happens.
    pub async fn handle(&self, command: AdminCommand) -> ConsoleResult<ActionOutcome> {
        let snapshot = self.state.snapshot();
        let outcome = match self.dispatcher.dispatch(&command, &snapshot).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, command = %command, "Action aborted");
                return Err(e);
            }
        };

        match &outcome.impersonation {
            Some(target) => self
                .session
                .on_impersonate_user(&target.user, &target.workspace),
            None => {
                // Failure is logged by the view state.
                let _ = self.state.reload().await;
            }
        }
        Ok(outcome)
    }

    pub fn logout(&self) {
        info!("Super admin logout");
        self.session.on_logout();
    }

    /// Render the selected view from the current snapshot.
    pub fn render(&self) -> ViewModel {
        let snapshot = self.state.snapshot();
        match self.current_view {
            View::Dashboard => ViewModel::Dashboard(dashboard_view(&snapshot, self.recent_limit)),
            View::Workspaces => {
                ViewModel::Workspaces(workspaces_view(&snapshot, self.workspace_filter))
            }
            View::Users => ViewModel::Users(users_view(&snapshot, self.user_filter)),
            View::Audit => ViewModel::Audit(audit_view(&snapshot)),
            View::Config => ViewModel::Config(config_view(&snapshot)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_core::types::{collections, User, Workspace};
    use console_store::{fields_of, MemoryStore, StoreOp};
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingSession {
        logouts: Mutex<usize>,
        impersonated: Mutex<Vec<(String, String)>>,
    }

    impl SessionHandler for RecordingSession {
        fn on_logout(&self) {
            *self.logouts.lock() += 1;
        }

        fn on_impersonate_user(&self, user: &User, workspace: &Workspace) {
            self.impersonated
                .lock()
                .push((user.id.clone(), workspace.id.clone()));
        }
    }

    async fn setup() -> (Arc<MemoryStore>, Arc<RecordingSession>, SuperAdminPanel) {
        let store = Arc::new(MemoryStore::new());
        store
            .set_document(
                collections::WORKSPACES,
                "w1",
                fields_of(json!({"name": "Acme", "status": "active", "members": {"u1": {"role": "owner"}}})),
            )
            .await
            .unwrap();
        store
            .set_document(
                collections::USERS,
                "u1",
                fields_of(json!({"name": "Ann", "email": "ann@example.com"})),
            )
            .await
            .unwrap();
        let session = Arc::new(RecordingSession::default());
        let panel = SuperAdminPanel::new(store.clone(), session.clone(), &ConsoleConfig::default());
        panel.mount().await.unwrap();
        (store, session, panel)
    }

    #[tokio::test]
    async fn test_mutation_triggers_reload() {
        let (_store, session, panel) = setup().await;
        let before = panel.snapshot().revision;

        panel
            .handle(AdminCommand::SuspendWorkspace("w1".into()))
            .await
            .unwrap();

        let snap = panel.snapshot();
        assert!(snap.revision > before);
        assert!(snap.workspaces[0].status.is_suspended());
        assert_eq!(snap.audit_log.len(), 1);
        assert!(session.impersonated.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_action_does_not_reload() {
        let (store, _session, panel) = setup().await;
        store.fail(StoreOp::Update, collections::USERS);
        let before = panel.snapshot();

        assert!(panel
            .handle(AdminCommand::SuspendUser("u1".into()))
            .await
            .is_err());
        assert!(Arc::ptr_eq(&before, &panel.snapshot()));
    }

    #[tokio::test]
    async fn test_impersonation_hands_off_to_session() {
        let (store, session, panel) = setup().await;
        store.clear_calls();

        let outcome = panel
            .handle(AdminCommand::ImpersonateOwner("w1".into()))
            .await
            .unwrap();
        assert!(outcome.is_complete());
        assert_eq!(
            *session.impersonated.lock(),
            vec![("u1".to_string(), "w1".to_string())]
        );
        // Only the audit append reached the store; no reload queries.
        assert!(store.calls_of(StoreOp::Query).is_empty());
        assert_eq!(store.calls_of(StoreOp::Add).len(), 1);
    }

    #[tokio::test]
    async fn test_view_selection_and_logout() {
        let (_store, session, mut panel) = setup().await;
        assert_eq!(panel.current_view(), View::Dashboard);
        assert!(matches!(panel.render(), ViewModel::Dashboard(_)));

        panel.select_view(View::Workspaces);
        panel.set_workspace_filter(StatusFilter::Suspended);
        match panel.render() {
            ViewModel::Workspaces(view) => {
                assert!(view.rows.is_empty());
                assert_eq!(view.counts.all, 1);
            }
            other => panic!("unexpected view {other:?}"),
        }

        panel.select_view(View::Config);
        assert_eq!(panel.render(), ViewModel::Config(ConfigView::Unavailable));

        panel.logout();
        assert_eq!(*session.logouts.lock(), 1);
    }
}
