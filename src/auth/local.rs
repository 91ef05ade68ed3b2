use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use super::{AuthEvent, AuthEvents, AuthService, SignInFlow};
use crate::remote::RemoteError;
use crate::session::identity::Profile;

/// In-process auth for the local backend. Signing in takes the handle
/// directly; there is no password and no redirect.
pub struct LocalAuth {
    current: RwLock<Option<Profile>>,
    events: AuthEvents,
}

impl LocalAuth {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            events: AuthEvents::new(),
        }
    }
}

impl Default for LocalAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthService for LocalAuth {
    async fn current_session(&self) -> Result<Option<Profile>, RemoteError> {
        Ok(self.current.read().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_in(&self, handle: Option<&str>) -> Result<SignInFlow, RemoteError> {
        let handle = handle
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RemoteError::NotFound("sign-in handle".to_string()))?;

        let profile = Profile::with_handle(handle);
        *self.current.write().await = Some(profile.clone());
        tracing::info!("Local sign-in as {}", handle);
        self.events.emit(Some(profile));
        Ok(SignInFlow::Completed)
    }

    async fn complete_sign_in(&self, _code: &str) -> Result<(), RemoteError> {
        Err(RemoteError::NotFound("local auth has no sign-in callback".to_string()))
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        *self.current.write().await = None;
        self.events.emit(None);
        Ok(())
    }
}
