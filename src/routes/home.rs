use askama::Template;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::AuthMode;
use crate::error::{AppError, AppResult};
use crate::extractors::{page_cookie, CurrentPage, PageKey};
use crate::feed::{FeedPage, Post};
use crate::state::AppState;

pub struct PostView {
    pub id: i64,
    pub title: String,
    pub link: String,
    /// `link` if it is an http(s) URL, otherwise `#`.
    pub href: String,
    pub likes: i64,
    pub anonymous: bool,
    pub author_name: String,
    pub author_image: String,
    pub author_initial: String,
    pub can_like: bool,
}

#[derive(Template)]
#[template(path = "pages/feed.html")]
pub struct FeedTemplate {
    pub signed_in: bool,
    pub name: String,
    pub image: String,
    pub initial: String,
    pub posts: Vec<PostView>,
    pub dialog_open: bool,
    pub draft_title: String,
    pub draft_link: String,
    pub draft_anonymous: bool,
    /// Local auth signs in with a typed handle instead of a redirect.
    pub asks_for_handle: bool,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

fn initial(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_default()
}

fn safe_href(link: &str) -> String {
    match url::Url::parse(link) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url.to_string(),
        _ => "#".to_string(),
    }
}

fn post_view(page: &FeedPage, post: &Post) -> PostView {
    let author_name = post.author_name().unwrap_or_default().to_string();
    PostView {
        id: post.id.0,
        title: post.title.clone(),
        link: post.link.clone(),
        href: safe_href(&post.link),
        likes: post.likes,
        anonymous: post.is_anonymous(),
        author_initial: initial(&author_name),
        author_name,
        author_image: post.author_image().unwrap_or_default().to_string(),
        can_like: page.can_like(post),
    }
}

pub fn feed_template(page: &FeedPage, auth: &AuthMode) -> FeedTemplate {
    let identity = page.identity();
    let name = identity.name().unwrap_or_default().to_string();
    let draft = page.draft();

    FeedTemplate {
        signed_in: identity.is_present(),
        initial: initial(&name),
        image: identity.image().unwrap_or_default().to_string(),
        name,
        posts: page.posts().iter().map(|p| post_view(page, p)).collect(),
        dialog_open: page.dialog_open(),
        draft_title: draft.title.clone(),
        draft_link: draft.link.clone(),
        draft_anonymous: draft.is_anonymous,
        asks_for_handle: matches!(auth, AuthMode::Local),
    }
}

/// Render the browser's page, mounting one first if it has none.
pub async fn index(State(state): State<AppState>, PageKey(key): PageKey) -> AppResult<Response> {
    let existing = match &key {
        Some(key) => state.pages.get(key).await,
        None => None,
    };

    let (new_key, page) = match existing {
        Some(page) => (None, page),
        None => {
            let (key, page) = state.mount_page().await;
            (Some(key), page)
        }
    };

    let template = {
        let page = page.lock().await;
        feed_template(&page, &state.auth)
    };

    let mut response = Html(template).into_response();
    if let Some(key) = new_key {
        let cookie = HeaderValue::from_str(&page_cookie(&state.config.pages.cookie_name, &key))
            .map_err(|e| AppError::Internal(e.to_string()))?;
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

/// Re-fetch the post list.
pub async fn refresh(current: CurrentPage) -> Redirect {
    current.page.lock().await.fetch_all().await;
    Redirect::to("/")
}
