pub mod holder;
pub mod identity;
pub mod provider;

use std::sync::Arc;

use crate::auth::{AuthService, SignInFlow, SignOutFlow};
use crate::remote::RemoteError;
use holder::{SessionHolder, Subscription};
use identity::Identity;
use provider::{ProviderSession, ProviderUser};

/// The identity source owned by one page.
pub enum Session {
    /// Backend auth, followed through a change subscription.
    Backend {
        holder: SessionHolder,
        subscription: Subscription,
    },
    /// Identity pushed to us by an external provider SDK.
    Provider(ProviderSession),
}

impl Session {
    pub async fn attach(auth: Arc<dyn AuthService>) -> Self {
        let (holder, subscription) = SessionHolder::attach(auth).await;
        Session::Backend {
            holder,
            subscription,
        }
    }

    pub fn identity(&self) -> Identity {
        match self {
            Session::Backend { holder, .. } => holder.identity(),
            Session::Provider(provider) => provider.identity(),
        }
    }

    pub async fn sign_in(&mut self, provider: Option<&str>) -> Result<SignInFlow, RemoteError> {
        match self {
            Session::Backend { holder, .. } => holder.sign_in(provider).await,
            Session::Provider(session) => {
                session.sign_in();
                Ok(match session.login_url() {
                    Some(url) => SignInFlow::Redirect(url.to_string()),
                    None => SignInFlow::Completed,
                })
            }
        }
    }

    pub async fn complete_sign_in(&self, code: &str) -> Result<(), RemoteError> {
        match self {
            Session::Backend { holder, .. } => holder.complete_sign_in(code).await,
            Session::Provider(_) => Err(RemoteError::NotFound(
                "provider sessions have no sign-in callback".to_string(),
            )),
        }
    }

    /// End the session. Local identity is cleared either way; provider
    /// sessions may also need the browser to visit the provider's logout.
    pub async fn sign_out(&mut self) -> SignOutFlow {
        match self {
            Session::Backend { holder, .. } => {
                holder.sign_out().await;
                SignOutFlow::Completed
            }
            Session::Provider(provider) => match provider.sign_out() {
                Some(url) => SignOutFlow::Redirect(url.to_string()),
                None => SignOutFlow::Completed,
            },
        }
    }

    /// Apply provider state. Returns `false` for backend sessions, which
    /// ignore it.
    pub fn update_provider(&mut self, ready: bool, user: Option<ProviderUser>) -> bool {
        match self {
            Session::Provider(provider) => {
                provider.update(ready, user);
                true
            }
            Session::Backend { .. } => false,
        }
    }

    /// Release the change subscription. Safe to call more than once.
    pub fn teardown(&mut self) {
        if let Session::Backend { subscription, .. } = self {
            subscription.cancel();
        }
    }

    pub fn is_subscribed(&self) -> bool {
        match self {
            Session::Backend { subscription, .. } => subscription.is_active(),
            Session::Provider(_) => false,
        }
    }
}
