use axum::extract::Path;
use axum::response::Redirect;
use axum::routing::post;
use axum::{Form, Router};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extractors::CurrentPage;
use crate::feed::PostId;
use crate::routes::home;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    /// Checkbox: present ("on") only when ticked.
    pub anonymous: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/refresh", post(home::refresh))
        .route("/posts", post(submit))
        .route("/posts/{id}/like", post(like))
        .route("/compose/open", post(open_compose))
        .route("/compose/close", post(close_compose))
}

/// Copy the form into the draft, then submit it. A rejected or failed
/// submit leaves the draft in the open composer.
async fn submit(current: CurrentPage, Form(form): Form<SubmitForm>) -> Redirect {
    let mut page = current.page.lock().await;
    page.set_title(form.title);
    page.set_link(form.link);
    page.set_anonymous(form.anonymous.is_some());
    page.submit().await;
    Redirect::to("/")
}

/// Ids the page has never shown are a 404; anything else the page
/// declines is silently ignored.
async fn like(current: CurrentPage, Path(id): Path<i64>) -> AppResult<Redirect> {
    let mut page = current.page.lock().await;
    let id = PostId(id);
    if page.post(id).is_none() {
        return Err(AppError::NotFound);
    }
    if let Some(post) = page.like(id).await {
        tracing::debug!("Post {} now has {} likes", post.id, post.likes);
    }
    Ok(Redirect::to("/"))
}

async fn open_compose(current: CurrentPage) -> Redirect {
    current.page.lock().await.open_dialog();
    Redirect::to("/")
}

async fn close_compose(current: CurrentPage) -> Redirect {
    current.page.lock().await.close_dialog();
    Redirect::to("/")
}
