use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::identity::{resolve_session, Identity};
use crate::auth::{AuthService, SignInFlow};
use crate::remote::RemoteError;

/// Mirrors the auth service's view of the current user.
pub struct SessionHolder {
    auth: Arc<dyn AuthService>,
    identity: Arc<watch::Sender<Identity>>,
}

/// Live auth-change subscription. Cancelled at most once, either
/// explicitly or when dropped.
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Stop forwarding auth changes. Returns `false` if already cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                tracing::debug!("Auth subscription released");
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl SessionHolder {
    /// Look up the current session once, then follow the change stream.
    pub async fn attach(auth: Arc<dyn AuthService>) -> (Self, Subscription) {
        // Subscribe first so a change racing the lookup is not lost
        let mut events = auth.subscribe();

        let initial = match auth.current_session().await {
            Ok(profile) => resolve_session(profile.as_ref()),
            Err(e) => {
                tracing::warn!("Session lookup failed: {}", e);
                Identity::Absent
            }
        };

        let (tx, _rx) = watch::channel(initial);
        let identity = Arc::new(tx);

        let forward = identity.clone();
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(profile) => {
                        forward.send_replace(resolve_session(profile.as_ref()));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Skipped {} auth events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        (
            Self { auth, identity },
            Subscription { task: Some(task) },
        )
    }

    pub fn identity(&self) -> Identity {
        self.identity.borrow().clone()
    }

    /// Receiver that observes every identity replacement.
    pub fn watch(&self) -> watch::Receiver<Identity> {
        self.identity.subscribe()
    }

    /// Start signing in. A flow that completes in place is applied before
    /// returning, so the caller sees the new identity immediately.
    pub async fn sign_in(&self, provider: Option<&str>) -> Result<SignInFlow, RemoteError> {
        let flow = self.auth.sign_in(provider).await?;
        if flow == SignInFlow::Completed {
            self.refresh().await;
        }
        Ok(flow)
    }

    /// Finish a redirect sign-in and apply the resulting session right away
    /// instead of waiting for the forwarded event.
    pub async fn complete_sign_in(&self, code: &str) -> Result<(), RemoteError> {
        self.auth.complete_sign_in(code).await?;
        self.refresh().await;
        Ok(())
    }

    /// Re-read the current session. Failures count as signed out.
    pub async fn refresh(&self) -> Identity {
        let identity = match self.auth.current_session().await {
            Ok(profile) => resolve_session(profile.as_ref()),
            Err(e) => {
                tracing::warn!("Session lookup failed: {}", e);
                Identity::Absent
            }
        };
        self.identity.send_replace(identity.clone());
        identity
    }

    /// Local identity is cleared before the remote call returns.
    pub async fn sign_out(&self) {
        self.identity.send_replace(Identity::Absent);
        if let Err(e) = self.auth.sign_out().await {
            tracing::warn!("Sign-out failed: {}", e);
        }
        // Events queued before the sign-out may have been forwarded meanwhile
        self.identity.send_replace(Identity::Absent);
    }
}
