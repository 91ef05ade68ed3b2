use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::pages::SharedPage;
use crate::state::AppState;

/// Value of the page cookie, if the browser sent one.
pub struct PageKey(pub Option<String>);

impl FromRequestParts<AppState> for PageKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = cookie_value(parts, &state.config.pages.cookie_name).map(str::to_string);
        Ok(PageKey(key))
    }
}

/// The mounted page this browser is talking to. Requests without one are
/// sent back to `/`, which mounts a fresh page.
pub struct CurrentPage {
    pub page: SharedPage,
}

impl FromRequestParts<AppState> for CurrentPage {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = cookie_value(parts, &state.config.pages.cookie_name)
            .ok_or(AppError::PageExpired)?;
        let page = state.pages.get(key).await.ok_or(AppError::PageExpired)?;
        Ok(CurrentPage { page })
    }
}

fn cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}

/// `Set-Cookie` value binding the browser to a page.
pub fn page_cookie(name: &str, key: &str) -> String {
    format!("{}={}; HttpOnly; SameSite=Lax; Path=/", name, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_cookie(cookie: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(header::COOKIE, cookie)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn finds_named_cookie_among_others() {
        let parts = parts_with_cookie("theme=dark; linkboard_page=abc123; other=1");
        assert_eq!(cookie_value(&parts, "linkboard_page"), Some("abc123"));
    }

    #[test]
    fn missing_or_empty_cookie_is_none() {
        let parts = parts_with_cookie("theme=dark; linkboard_page=");
        assert_eq!(cookie_value(&parts, "linkboard_page"), None);
        assert_eq!(cookie_value(&parts, "absent"), None);
    }

    #[test]
    fn page_cookie_is_http_only() {
        let cookie = page_cookie("linkboard_page", "k");
        assert!(cookie.starts_with("linkboard_page=k;"));
        assert!(cookie.contains("HttpOnly"));
    }
}
