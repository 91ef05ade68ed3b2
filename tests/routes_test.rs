use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use linkboard::auth::AuthMode;
use linkboard::config::Config;
use linkboard::db;
use linkboard::remote::sqlite::SqlitePostStore;
use linkboard::routes;
use linkboard::state::AppState;

fn app_with(auth: AuthMode) -> (Router, AppState) {
    let pool = db::memory_pool().unwrap();
    db::run_migrations(&pool).unwrap();
    let state = AppState::new(
        Config::default(),
        Arc::new(SqlitePostStore::new(pool)),
        auth,
    );
    (routes::app(state.clone()), state)
}

/// GET / and return the page cookie it hands out.
async fn mount(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn post_form(app: &Router, cookie: &str, uri: &str, form: &str) -> StatusCode {
    post_form_response(app, cookie, uri, form).await.status()
}

async fn post_form_response(
    app: &Router,
    cookie: &str,
    uri: &str,
    form: &str,
) -> axum::response::Response {
    app
        .clone()
        .oneshot(
            Request::post(uri)
                .header(header::COOKIE, cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn page_html(app: &Router, cookie: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::get("/")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn first_visit_mounts_a_page() {
    let (app, state) = app_with(AuthMode::Local);
    let cookie = mount(&app).await;

    assert!(cookie.starts_with("linkboard_page="));
    assert_eq!(state.pages.len().await, 1);

    let html = page_html(&app, &cookie).await;
    assert!(html.contains("Sign In"));
    assert!(html.contains("name=\"handle\""));
    assert_eq!(state.pages.len().await, 1);
}

#[tokio::test]
async fn sign_in_compose_and_submit() {
    let (app, _) = app_with(AuthMode::Local);
    let cookie = mount(&app).await;

    assert_eq!(
        post_form(&app, &cookie, "/auth/login", "handle=bob").await,
        StatusCode::SEE_OTHER
    );
    assert_eq!(
        post_form(&app, &cookie, "/compose/open", "").await,
        StatusCode::SEE_OTHER
    );

    let html = page_html(&app, &cookie).await;
    assert!(html.contains("Sign Out"));
    assert!(html.contains("Create a new post"));

    post_form(
        &app,
        &cookie,
        "/posts",
        "title=Episode+one&link=https%3A%2F%2Fexample.com%2F1",
    )
    .await;

    let html = page_html(&app, &cookie).await;
    assert!(html.contains("Episode one"));
    assert!(html.contains("bob"));
    assert!(!html.contains("Create a new post"));
}

#[tokio::test]
async fn incomplete_submit_keeps_composer_open() {
    let (app, state) = app_with(AuthMode::Local);
    let cookie = mount(&app).await;

    post_form(&app, &cookie, "/auth/login", "handle=bob").await;
    post_form(&app, &cookie, "/compose/open", "").await;
    post_form(&app, &cookie, "/posts", "title=No+link&link=").await;

    let key = cookie.trim_start_matches("linkboard_page=");
    let page = state.pages.get(key).await.unwrap();
    let page = page.lock().await;
    assert!(page.posts().is_empty());
    assert!(page.dialog_open());
    assert_eq!(page.draft().title, "No link");
}

#[tokio::test]
async fn like_from_other_browser_counts() {
    let (app, state) = app_with(AuthMode::Local);

    let alice = mount(&app).await;
    post_form(&app, &alice, "/auth/login", "handle=alice").await;
    post_form(&app, &alice, "/posts", "title=Mine&link=http%3A%2F%2Fa").await;

    let bob = mount(&app).await;
    post_form(&app, &bob, "/auth/login", "handle=bob").await;

    // Alice liking her own post is ignored
    post_form(&app, &alice, "/posts/1/like", "").await;
    post_form(&app, &bob, "/posts/1/like", "").await;

    let key = bob.trim_start_matches("linkboard_page=");
    let page = state.pages.get(key).await.unwrap();
    assert_eq!(page.lock().await.posts()[0].likes, 1);
}

#[tokio::test]
async fn liking_a_post_the_page_never_showed_is_not_found() {
    let (app, _) = app_with(AuthMode::Local);
    let cookie = mount(&app).await;
    post_form(&app, &cookie, "/auth/login", "handle=bob").await;

    let status = post_form(&app, &cookie, "/posts/99/like", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_code_exchange_is_a_gateway_error() {
    let (app, _) = app_with(AuthMode::Local);
    let cookie = mount(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::get("/auth/callback?code=abc")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn unknown_page_is_sent_home() {
    let (app, _) = app_with(AuthMode::Local);
    let status = post_form(&app, "linkboard_page=nope", "/posts/1/like", "").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn logout_clears_identity() {
    let (app, _) = app_with(AuthMode::Local);
    let cookie = mount(&app).await;

    post_form(&app, &cookie, "/auth/login", "handle=bob").await;
    post_form(&app, &cookie, "/auth/logout", "").await;

    let html = page_html(&app, &cookie).await;
    assert!(html.contains("Sign In"));
    assert!(!html.contains("Sign Out"));
}

async fn push_provider_state(app: &Router, cookie: &str, body: &'static str) -> StatusCode {
    app.clone()
        .oneshot(
            Request::post("/auth/provider")
                .header(header::COOKIE, cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

const WALLET_USER: &str = r#"{"ready":true,"user":{"wallet":{"address":"0xfeed"}}}"#;

#[tokio::test]
async fn provider_state_signs_in() {
    let (app, _) = app_with(AuthMode::Provider {
        login_url: None,
        logout_url: None,
    });
    let cookie = mount(&app).await;

    assert_eq!(
        push_provider_state(&app, &cookie, WALLET_USER).await,
        StatusCode::NO_CONTENT
    );

    let html = page_html(&app, &cookie).await;
    assert!(html.contains("0xfeed"));
    assert!(!html.contains("name=\"handle\""));
}

#[tokio::test]
async fn provider_sign_out_holds_until_next_sign_in() {
    let (app, _) = app_with(AuthMode::Provider {
        login_url: None,
        logout_url: Some("https://login.example/logout".to_string()),
    });
    let cookie = mount(&app).await;
    push_provider_state(&app, &cookie, WALLET_USER).await;

    let response = post_form_response(&app, &cookie, "/auth/logout", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://login.example/logout"
    );

    // The SDK has not caught up yet and reports the same user again
    push_provider_state(&app, &cookie, WALLET_USER).await;
    let html = page_html(&app, &cookie).await;
    assert!(html.contains("Sign In"));
    assert!(!html.contains("0xfeed"));

    post_form(&app, &cookie, "/auth/login", "").await;
    let html = page_html(&app, &cookie).await;
    assert!(html.contains("Sign Out"));
    assert!(html.contains("0xfeed"));
}

#[tokio::test]
async fn provider_state_rejected_for_backend_auth() {
    let (app, _) = app_with(AuthMode::Local);
    let cookie = mount(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::post("/auth/provider")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"ready":true,"user":null}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
