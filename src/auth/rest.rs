// GoTrue-style hosted auth: OAuth with PKCE, bearer-token sessions
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{broadcast, RwLock};
use url::Url;

use super::{AuthEvent, AuthEvents, AuthService, SignInFlow};
use crate::remote::rest::check_status;
use crate::remote::RemoteError;
use crate::session::identity::Profile;

const VERIFIER_LEN: usize = 64;

#[derive(Clone)]
pub struct RestAuthConfig {
    pub client: Client,
    pub base: Url,
    /// Where the auth service sends the browser back to.
    pub redirect_url: String,
    /// Provider used when the sign-in request names none.
    pub default_provider: String,
}

/// Auth user record as returned by `/auth/v1/user` and the token endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    pub user_name: Option<String>,
    pub preferred_username: Option<String>,
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub picture: Option<String>,
    pub wallet_address: Option<String>,
}

impl AuthUser {
    pub fn profile(&self) -> Profile {
        let meta = &self.user_metadata;
        Profile {
            social_handle: meta
                .user_name
                .clone()
                .or_else(|| meta.preferred_username.clone()),
            social_avatar: meta.avatar_url.clone(),
            wallet_address: meta.wallet_address.clone(),
            metadata_name: meta
                .full_name
                .clone()
                .or_else(|| meta.name.clone())
                .or_else(|| self.email.clone()),
            metadata_avatar: meta.picture.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

pub struct RestAuth {
    config: RestAuthConfig,
    access_token: RwLock<Option<String>>,
    verifier: RwLock<Option<String>>,
    events: AuthEvents,
}

impl RestAuth {
    pub fn new(config: RestAuthConfig) -> Self {
        Self {
            config,
            access_token: RwLock::new(None),
            verifier: RwLock::new(None),
            events: AuthEvents::new(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        Ok(self.config.base.join(path)?)
    }

    /// Authorize URL for a provider, carrying a fresh plain PKCE challenge.
    fn authorize_url(&self, provider: &str, verifier: &str) -> Result<Url, RemoteError> {
        let mut url = self.endpoint("auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", &self.config.redirect_url)
            .append_pair("code_challenge", verifier)
            .append_pair("code_challenge_method", "plain");
        Ok(url)
    }
}

fn generate_verifier() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
    let mut rng = rand::thread_rng();
    (0..VERIFIER_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

#[async_trait]
impl AuthService for RestAuth {
    async fn current_session(&self) -> Result<Option<Profile>, RemoteError> {
        let Some(token) = self.access_token.read().await.clone() else {
            return Ok(None);
        };

        let resp = self
            .config
            .client
            .get(self.endpoint("auth/v1/user")?)
            .bearer_auth(&token)
            .send()
            .await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            // Expired or revoked: forget it rather than retrying every mount
            *self.access_token.write().await = None;
            return Ok(None);
        }

        let user: AuthUser = check_status(resp).await?.json().await?;
        Ok(Some(user.profile()))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_in(&self, provider: Option<&str>) -> Result<SignInFlow, RemoteError> {
        let provider = provider
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(&self.config.default_provider);

        let verifier = generate_verifier();
        let url = self.authorize_url(provider, &verifier)?;
        *self.verifier.write().await = Some(verifier);

        tracing::debug!("Redirecting to {} sign-in", provider);
        Ok(SignInFlow::Redirect(url.to_string()))
    }

    async fn complete_sign_in(&self, code: &str) -> Result<(), RemoteError> {
        let verifier = self
            .verifier
            .write()
            .await
            .take()
            .ok_or_else(|| RemoteError::NotFound("pending sign-in".to_string()))?;

        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "pkce");

        let resp = self
            .config
            .client
            .post(url)
            .json(&json!({ "auth_code": code, "code_verifier": verifier }))
            .send()
            .await?;

        let token: TokenResponse = check_status(resp).await?.json().await?;
        *self.access_token.write().await = Some(token.access_token);
        self.events.emit(Some(token.user.profile()));
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        let token = self.access_token.write().await.take();
        self.events.emit(None);

        let Some(token) = token else {
            return Ok(());
        };

        let resp = self
            .config
            .client
            .post(self.endpoint("auth/v1/logout")?)
            .bearer_auth(&token)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> RestAuth {
        RestAuth::new(RestAuthConfig {
            client: Client::new(),
            base: Url::parse("https://project.example.co/").unwrap(),
            redirect_url: "http://localhost:3000/auth/callback".to_string(),
            default_provider: "twitter".to_string(),
        })
    }

    #[test]
    fn profile_prefers_user_name_then_preferred_username() {
        let user: AuthUser = serde_json::from_str(
            r#"{"email":"a@example.com","user_metadata":{
                "preferred_username":"alice_p","full_name":"Alice A",
                "avatar_url":"http://a.png"}}"#,
        )
        .unwrap();
        let profile = user.profile();
        assert_eq!(profile.social_handle.as_deref(), Some("alice_p"));
        assert_eq!(profile.metadata_name.as_deref(), Some("Alice A"));
        assert_eq!(profile.social_avatar.as_deref(), Some("http://a.png"));
    }

    #[test]
    fn profile_falls_back_to_email() {
        let user: AuthUser = serde_json::from_str(r#"{"email":"a@example.com"}"#).unwrap();
        assert_eq!(user.profile().metadata_name.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn verifier_uses_unreserved_characters() {
        let v = generate_verifier();
        assert_eq!(v.len(), VERIFIER_LEN);
        assert!(v
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-._~".contains(c)));
    }

    #[tokio::test]
    async fn sign_in_redirects_to_authorize_with_default_provider() {
        let auth = auth();
        let flow = auth.sign_in(None).await.unwrap();
        let SignInFlow::Redirect(location) = flow else {
            panic!("expected redirect");
        };
        let url = Url::parse(&location).unwrap();
        assert_eq!(url.path(), "/auth/v1/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("provider".to_string(), "twitter".to_string())));
        assert!(pairs.contains(&(
            "redirect_to".to_string(),
            "http://localhost:3000/auth/callback".to_string()
        )));
    }

    #[tokio::test]
    async fn complete_without_pending_sign_in_fails() {
        let auth = auth();
        assert!(matches!(
            auth.complete_sign_in("code").await,
            Err(RemoteError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn signed_out_session_is_none_without_network() {
        let auth = auth();
        assert_eq!(auth.current_session().await.unwrap(), None);
        auth.sign_out().await.unwrap();
    }
}
