// Remote data service boundary - posts table CRUD
pub mod rest;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::feed::post::{NewPost, Post, PostId};

/// Every remote call either succeeds or fails; callers do not branch on the
/// variant, it only feeds the log line.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Posts table operations. Implementations decide how atomic the like
/// increment is; `current` is the caller's last known counter value.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// All posts, newest (highest id) first.
    async fn list_posts(&self) -> Result<Vec<Post>, RemoteError>;

    /// Raise `likes` of one post by exactly one.
    async fn increment_likes(&self, id: PostId, current: i64) -> Result<(), RemoteError>;

    /// Insert a post with `likes = 0`; returns the assigned id.
    async fn insert_post(&self, post: NewPost) -> Result<PostId, RemoteError>;
}
