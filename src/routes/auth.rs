use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;

use crate::auth::{SignInFlow, SignOutFlow};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentPage;
use crate::session::provider::ProviderUser;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginForm {
    /// Handle for local sign-in.
    pub handle: Option<String>,
    /// OAuth provider name for hosted sign-in.
    pub provider: Option<String>,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Deserialize)]
pub struct ProviderState {
    pub ready: bool,
    pub user: Option<ProviderUser>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/callback", get(callback))
        .route("/auth/logout", post(logout))
        .route("/auth/provider", post(provider_state))
}

async fn login(current: CurrentPage, Form(form): Form<LoginForm>) -> Redirect {
    let mut page = current.page.lock().await;
    let selector = form.handle.as_deref().or(form.provider.as_deref());

    match page.sign_in(selector).await {
        Ok(SignInFlow::Redirect(url)) => Redirect::to(&url),
        Ok(SignInFlow::Completed) => Redirect::to("/"),
        Err(e) => {
            tracing::warn!("Sign-in failed: {}", e);
            Redirect::to("/")
        }
    }
}

/// A failed code exchange surfaces as an upstream error.
async fn callback(
    current: CurrentPage,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Redirect> {
    match (query.code, query.error_description) {
        (Some(code), _) => {
            let page = current.page.lock().await;
            page.complete_sign_in(&code).await?;
        }
        (None, Some(reason)) => tracing::warn!("Sign-in declined: {}", reason),
        (None, None) => tracing::warn!("Sign-in callback without a code"),
    }
    Ok(Redirect::to("/"))
}

async fn logout(current: CurrentPage) -> Redirect {
    match current.page.lock().await.sign_out().await {
        SignOutFlow::Redirect(url) => Redirect::to(&url),
        SignOutFlow::Completed => Redirect::to("/"),
    }
}

/// State pushed by the identity provider SDK running in the browser.
async fn provider_state(current: CurrentPage, Json(body): Json<ProviderState>) -> AppResult<Response> {
    let mut page = current.page.lock().await;
    if !page.update_provider(body.ready, body.user) {
        return Err(AppError::BadRequest(
            "Identity provider is not enabled".into(),
        ));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}
