pub mod page;
pub mod post;

pub use page::{FeedPage, LikePolicy};
pub use post::{Author, Draft, NewPost, Post, PostId};
