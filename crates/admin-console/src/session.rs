//! Session collaborator. The console never authenticates or switches
//! identities itself; it hands those decisions to the session layer.

use console_core::types::{User, Workspace};

pub trait SessionHandler: Send + Sync {
    /// End the super-admin session.
    fn on_logout(&self);

    /// Switch the active session to `user` inside `workspace`. The console
    /// does not resume after this call.
    fn on_impersonate_user(&self, user: &User, workspace: &Workspace);
}
