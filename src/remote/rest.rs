// PostgREST-style client for a hosted posts table
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde_json::json;
use std::time::Duration;
use url::Url;

use super::{PostStore, RemoteError};
use crate::feed::post::{NewPost, NewPostRow, Post, PostId, PostRow};

/// Build the HTTP client shared by the REST post store and the REST auth
/// service. `apikey` and the bearer token are sent on every request; a key
/// that cannot be a header value is rejected here.
pub fn http_client(api_key: &str, timeout: Duration) -> Result<Client, RemoteError> {
    let mut headers = HeaderMap::new();
    headers.insert("apikey", HeaderValue::from_str(api_key)?);
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key))?,
    );

    let client = Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Normalize a base URL so relative joins append instead of replacing the
/// last path segment.
pub fn base_url(raw: &str) -> Result<Url, RemoteError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Turn a non-2xx response into `RemoteError::Status`.
pub(crate) async fn check_status(resp: Response) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

pub struct RestPostStore {
    client: Client,
    base: Url,
    table: String,
    increment_rpc: Option<String>,
}

impl RestPostStore {
    pub fn new(client: Client, base: Url, table: impl Into<String>) -> Self {
        Self {
            client,
            base,
            table: table.into(),
            increment_rpc: None,
        }
    }

    /// Use a server-side function for likes instead of read-modify-write.
    pub fn with_increment_rpc(mut self, function: impl Into<String>) -> Self {
        self.increment_rpc = Some(function.into());
        self
    }

    fn table_url(&self) -> Result<Url, RemoteError> {
        Ok(self.base.join(&format!("rest/v1/{}", self.table))?)
    }
}

#[async_trait]
impl PostStore for RestPostStore {
    async fn list_posts(&self) -> Result<Vec<Post>, RemoteError> {
        let resp = self
            .client
            .get(self.table_url()?)
            .query(&[("select", "*"), ("order", "id.desc")])
            .send()
            .await?;

        let rows: Vec<PostRow> = check_status(resp).await?.json().await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn increment_likes(&self, id: PostId, current: i64) -> Result<(), RemoteError> {
        if let Some(function) = &self.increment_rpc {
            let url = self.base.join(&format!("rest/v1/rpc/{}", function))?;
            let resp = self
                .client
                .post(url)
                .json(&json!({ "post_id": id.0 }))
                .send()
                .await?;
            check_status(resp).await?;
            return Ok(());
        }

        let resp = self
            .client
            .patch(self.table_url()?)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&json!({ "likes": current + 1 }))
            .send()
            .await?;

        let rows: Vec<PostRow> = check_status(resp).await?.json().await?;
        if rows.is_empty() {
            return Err(RemoteError::NotFound(format!("post {}", id)));
        }
        Ok(())
    }

    async fn insert_post(&self, post: NewPost) -> Result<PostId, RemoteError> {
        let row = NewPostRow::from(post);
        let resp = self
            .client
            .post(self.table_url()?)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await?;

        let rows: Vec<PostRow> = check_status(resp).await?.json().await?;
        rows.first()
            .map(|r| PostId(r.id))
            .ok_or_else(|| RemoteError::NotFound("inserted row".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = base_url("https://project.example.co/api").unwrap();
        assert_eq!(url.as_str(), "https://project.example.co/api/");
        let joined = url.join("rest/v1/posts").unwrap();
        assert_eq!(joined.as_str(), "https://project.example.co/api/rest/v1/posts");
    }

    #[test]
    fn client_rejects_unusable_api_key() {
        let result = http_client("anon\nkey", Duration::from_secs(1));
        assert!(matches!(result, Err(RemoteError::Header(_))));
        assert!(http_client("anon-key", Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn base_url_rejects_garbage() {
        assert!(matches!(base_url("not a url"), Err(RemoteError::Url(_))));
    }
}
