// Auth boundary - who is signed in, and the stream of changes to that
pub mod local;
pub mod rest;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::remote::RemoteError;
use crate::session::identity::Profile;
use crate::session::provider::ProviderSession;
use crate::session::Session;

/// Capacity of each auth service's change channel.
const AUTH_EVENT_CAPACITY: usize = 16;

/// One auth state change: the new profile, or `None` after sign-out.
pub type AuthEvent = Option<Profile>;

/// How a sign-in attempt continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInFlow {
    /// Send the browser here; completion arrives through the callback.
    Redirect(String),
    /// Already signed in; the change stream has been notified.
    Completed,
}

/// How a sign-out continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutFlow {
    /// Send the browser here so the identity provider ends its own session.
    Redirect(String),
    Completed,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Profile of the current session, if any.
    async fn current_session(&self) -> Result<Option<Profile>, RemoteError>;

    /// Receive every auth state change from now on.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    /// Start signing in, optionally with a named provider.
    async fn sign_in(&self, provider: Option<&str>) -> Result<SignInFlow, RemoteError>;

    /// Finish a redirect flow with the code handed to the callback.
    async fn complete_sign_in(&self, code: &str) -> Result<(), RemoteError>;

    async fn sign_out(&self) -> Result<(), RemoteError>;
}

/// Sender side of an auth change stream. Sending with no subscribers is
/// not an error.
pub(crate) struct AuthEvents {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self { tx }
    }

    pub(crate) fn emit(&self, event: AuthEvent) {
        let _ = self.tx.send(event);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }
}

/// Per-page auth wiring, chosen once from config.
#[derive(Clone)]
pub enum AuthMode {
    /// Local dev auth: sign in by typing a handle.
    Local,
    /// Hosted auth service with OAuth redirects.
    Rest(rest::RestAuthConfig),
    /// External identity provider SDK posts its user object to us.
    Provider {
        login_url: Option<String>,
        logout_url: Option<String>,
    },
}

impl AuthMode {
    /// Open a fresh session for a newly mounted page.
    pub async fn open_session(&self) -> Session {
        match self {
            AuthMode::Local => Session::attach(Arc::new(local::LocalAuth::new())).await,
            AuthMode::Rest(config) => {
                Session::attach(Arc::new(rest::RestAuth::new(config.clone()))).await
            }
            AuthMode::Provider {
                login_url,
                logout_url,
            } => Session::Provider(ProviderSession::new(login_url.clone(), logout_url.clone())),
        }
    }
}
