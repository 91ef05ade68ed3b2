pub mod auth;
pub mod feed;
pub mod home;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .merge(feed::router())
        .merge(auth::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
