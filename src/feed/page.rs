use std::sync::Arc;

use super::post::{Author, Draft, NewPost, Post, PostId};
use crate::auth::{SignInFlow, SignOutFlow};
use crate::remote::{PostStore, RemoteError};
use crate::session::identity::Identity;
use crate::session::provider::ProviderUser;
use crate::session::Session;

/// Whether authors may like their own posts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LikePolicy {
    #[default]
    ForbidSelfLike,
    AllowSelfLike,
}

impl LikePolicy {
    pub fn from_guard(self_like_guard: bool) -> Self {
        if self_like_guard {
            LikePolicy::ForbidSelfLike
        } else {
            LikePolicy::AllowSelfLike
        }
    }

    /// Under the guard, a post written under any of the caller's names is
    /// off limits.
    pub fn permits(&self, post: &Post, caller: &Identity) -> bool {
        match self {
            LikePolicy::ForbidSelfLike => !post
                .author_name()
                .is_some_and(|author| caller.is_known_as(author)),
            LikePolicy::AllowSelfLike => true,
        }
    }
}

/// One mounted feed page: the post list, the composer and the caller's
/// session. All state changes go through these methods, and local state
/// only changes after the store reports success.
pub struct FeedPage {
    store: Arc<dyn PostStore>,
    session: Session,
    policy: LikePolicy,
    posts: Vec<Post>,
    draft: Draft,
    dialog_open: bool,
}

impl FeedPage {
    /// Create the page and load the feed once.
    pub async fn mount(store: Arc<dyn PostStore>, session: Session, policy: LikePolicy) -> Self {
        let mut page = Self {
            store,
            session,
            policy,
            posts: Vec::new(),
            draft: Draft::default(),
            dialog_open: false,
        };
        page.fetch_all().await;
        page
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn dialog_open(&self) -> bool {
        self.dialog_open
    }

    pub fn policy(&self) -> LikePolicy {
        self.policy
    }

    pub fn identity(&self) -> Identity {
        self.session.identity()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Whether the current caller could like `post` right now.
    pub fn can_like(&self, post: &Post) -> bool {
        let identity = self.identity();
        identity.is_present() && self.policy.permits(post, &identity)
    }

    /// The locally held post with this id.
    pub fn post(&self, id: PostId) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    /// Replace the list with the store's. A failed fetch keeps the old list.
    pub async fn fetch_all(&mut self) -> &[Post] {
        match self.store.list_posts().await {
            Ok(posts) => {
                tracing::debug!("Fetched {} posts", posts.len());
                self.posts = posts;
            }
            Err(e) => tracing::warn!("Error fetching posts: {}", e),
        }
        &self.posts
    }

    /// Like a post. Returns the patched post, or `None` when nothing changed:
    /// no session, unknown post, self-like, or a failed update.
    pub async fn like(&mut self, id: PostId) -> Option<Post> {
        let identity = self.identity();
        let Some(caller) = identity.name() else {
            tracing::debug!("Ignoring like of {} without a session", id);
            return None;
        };

        let post = self.post(id)?;
        if !self.policy.permits(post, &identity) {
            tracing::debug!("Ignoring self-like of {} by {}", id, caller);
            return None;
        }
        let current = post.likes;

        if let Err(e) = self.store.increment_likes(id, current).await {
            tracing::warn!("Error updating likes: {}", e);
            return None;
        }

        let post = self.posts.iter_mut().find(|p| p.id == id)?;
        post.likes += 1;
        Some(post.clone())
    }

    /// Submit the current draft. Returns whether a post was stored.
    pub async fn submit(&mut self) -> bool {
        if !self.draft.is_complete() {
            return false;
        }

        let author = if self.draft.is_anonymous {
            None
        } else {
            match self.identity() {
                Identity::Present { name, image, .. } if !name.is_empty() => {
                    Some(Author { name, image })
                }
                _ => None,
            }
        };

        let new_post = NewPost {
            title: self.draft.title.trim().to_string(),
            link: self.draft.link.trim().to_string(),
            author,
        };

        match self.store.insert_post(new_post).await {
            Ok(id) => {
                tracing::info!("Created post {}", id);
                self.draft = Draft::default();
                self.dialog_open = false;
                self.fetch_all().await;
                true
            }
            Err(e) => {
                tracing::warn!("Error inserting post: {}", e);
                false
            }
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
    }

    pub fn set_link(&mut self, link: impl Into<String>) {
        self.draft.link = link.into();
    }

    pub fn set_anonymous(&mut self, anonymous: bool) {
        self.draft.is_anonymous = anonymous;
    }

    pub fn open_dialog(&mut self) {
        self.dialog_open = true;
    }

    /// Hides the composer; the draft survives for the next open.
    pub fn close_dialog(&mut self) {
        self.dialog_open = false;
    }

    pub async fn sign_in(&mut self, provider: Option<&str>) -> Result<SignInFlow, RemoteError> {
        self.session.sign_in(provider).await
    }

    pub async fn complete_sign_in(&self, code: &str) -> Result<(), RemoteError> {
        self.session.complete_sign_in(code).await
    }

    pub async fn sign_out(&mut self) -> SignOutFlow {
        self.session.sign_out().await
    }

    pub fn update_provider(&mut self, ready: bool, user: Option<ProviderUser>) -> bool {
        self.session.update_provider(ready, user)
    }

    /// Release the page's standing resources.
    pub fn teardown(&mut self) {
        self.session.teardown();
    }
}
