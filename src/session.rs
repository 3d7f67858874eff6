//! Signed-in identity, as seen by the dashboard.
//!
//! The dashboard never reads identity from globals; it is handed a
//! [`Session`] whenever the authentication collaborator reports a change.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::SignOutError;
use crate::models::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub uid: UserId,
    pub email: String,
}

impl User {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        User {
            uid: UserId(uid.into()),
            email: email.into(),
        }
    }
}

/// Authentication state: who is signed in, and whether that is still being
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub user: Option<User>,
    pub loading: bool,
}

impl Session {
    pub fn signed_in(user: User) -> Self {
        Session { user: Some(user), loading: false }
    }

    pub fn signed_out() -> Self {
        Session { user: None, loading: false }
    }

    pub fn loading() -> Self {
        Session { user: None, loading: true }
    }

    /// The user, once loading has finished.
    pub fn current_user(&self) -> Option<&User> {
        if self.loading {
            None
        } else {
            self.user.as_ref()
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Live view of the authentication state.
    fn session(&self) -> watch::Receiver<Session>;

    /// Ends the current session.
    async fn sign_out(&self) -> Result<(), SignOutError>;
}

/// Auth provider for a single local identity taken from configuration.
pub struct LocalAuth {
    identity: User,
    state: watch::Sender<Session>,
}

impl LocalAuth {
    /// Starts signed in as `identity`.
    pub fn new(identity: User) -> Self {
        let (state, _) = watch::channel(Session::signed_in(identity.clone()));
        LocalAuth { identity, state }
    }

    /// Signs the configured identity back in.
    pub fn sign_in(&self) {
        tracing::info!(uid = %self.identity.uid, "signed in");
        self.state.send_replace(Session::signed_in(self.identity.clone()));
    }

    pub fn identity(&self) -> &User {
        &self.identity
    }
}

#[async_trait]
impl AuthProvider for LocalAuth {
    fn session(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    async fn sign_out(&self) -> Result<(), SignOutError> {
        tracing::info!(uid = %self.identity.uid, "signed out");
        self.state.send_replace(Session::signed_out());
        Ok(())
    }
}
