// Delegated identity: an embedded wallet / social login SDK owns the
// session and reports `(ready, user)` to us.
use serde::{Deserialize, Serialize};

use super::identity::{resolve, Identity, Profile};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedSocial {
    pub username: Option<String>,
    pub profile_picture_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedWallet {
    pub address: Option<String>,
}

/// User object as the provider SDK serializes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUser {
    #[serde(default)]
    pub twitter: Option<LinkedSocial>,
    #[serde(default)]
    pub wallet: Option<LinkedWallet>,
}

impl ProviderUser {
    pub fn profile(&self) -> Profile {
        let social = self.twitter.as_ref();
        Profile {
            social_handle: social.and_then(|s| s.username.clone()),
            social_avatar: social.and_then(|s| s.profile_picture_url.clone()),
            wallet_address: self.wallet.as_ref().and_then(|w| w.address.clone()),
            metadata_name: None,
            metadata_avatar: None,
        }
    }
}

pub struct ProviderSession {
    ready: bool,
    user: Option<ProviderUser>,
    identity: Identity,
    /// Set by `sign_out`. The SDK may keep reporting its user until it has
    /// logged out too; those reports must not sign the page back in.
    signed_out: bool,
    login_url: Option<String>,
    logout_url: Option<String>,
}

impl ProviderSession {
    pub fn new(login_url: Option<String>, logout_url: Option<String>) -> Self {
        Self {
            ready: false,
            user: None,
            identity: Identity::Absent,
            signed_out: false,
            login_url,
            logout_url,
        }
    }

    /// Feed the provider's latest state. Recomputes only when something
    /// changed; returns whether it did. A report without a user means the
    /// provider session is over, so a later user is a fresh sign-in.
    pub fn update(&mut self, ready: bool, user: Option<ProviderUser>) -> bool {
        if self.ready == ready && self.user == user {
            return false;
        }
        self.ready = ready;
        self.user = user;
        if self.user.is_none() {
            self.signed_out = false;
        }
        self.recompute();
        true
    }

    fn recompute(&mut self) {
        self.identity = match (&self.user, self.ready, self.signed_out) {
            (Some(user), true, false) => resolve(&user.profile()),
            _ => Identity::Absent,
        };
    }

    pub fn identity(&self) -> Identity {
        self.identity.clone()
    }

    pub fn login_url(&self) -> Option<&str> {
        self.login_url.as_deref()
    }

    pub fn logout_url(&self) -> Option<&str> {
        self.logout_url.as_deref()
    }

    /// Accept the provider's user again after a sign-out.
    pub fn sign_in(&mut self) {
        self.signed_out = false;
        self.recompute();
    }

    /// Forget the user until the provider ends its session or the caller
    /// signs in again. Returns where the provider's own logout lives.
    pub fn sign_out(&mut self) -> Option<&str> {
        self.signed_out = true;
        self.identity = Identity::Absent;
        self.logout_url.as_deref()
    }
}
