// Domain types - plain data, no I/O
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned post id. Newer posts have larger ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub i64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attribution of a post. Name and avatar travel together so a post is
/// either fully attributed or fully anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PostRow", into = "PostRow")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub link: String,
    pub likes: i64,
    pub author: Option<Author>,
}

impl Post {
    pub fn author_name(&self) -> Option<&str> {
        self.author.as_ref().map(|a| a.name.as_str())
    }

    pub fn author_image(&self) -> Option<&str> {
        self.author.as_ref().map(|a| a.image.as_str())
    }

    pub fn is_anonymous(&self) -> bool {
        self.author.is_none()
    }
}

/// Flat row shape shared by the table and the REST wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub likes: i64,
    pub author_name: Option<String>,
    pub author_image: Option<String>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: PostId(row.id),
            title: row.title,
            link: row.link,
            likes: row.likes.max(0),
            author: author_from_columns(row.author_name, row.author_image),
        }
    }
}

impl From<Post> for PostRow {
    fn from(post: Post) -> Self {
        let (author_name, author_image) = author_into_columns(post.author);
        PostRow {
            id: post.id.0,
            title: post.title,
            link: post.link,
            likes: post.likes,
            author_name,
            author_image,
        }
    }
}

/// A post about to be inserted. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub link: String,
    pub author: Option<Author>,
}

/// Insert payload in row shape. `likes` always starts at zero.
#[derive(Debug, Clone, Serialize)]
pub struct NewPostRow {
    pub title: String,
    pub link: String,
    pub likes: i64,
    pub author_name: Option<String>,
    pub author_image: Option<String>,
}

impl From<NewPost> for NewPostRow {
    fn from(post: NewPost) -> Self {
        let (author_name, author_image) = author_into_columns(post.author);
        NewPostRow {
            title: post.title,
            link: post.link,
            likes: 0,
            author_name,
            author_image,
        }
    }
}

/// Transient composition form state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub link: String,
    pub is_anonymous: bool,
}

impl Draft {
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.link.trim().is_empty()
    }
}

/// A name without an image still counts as attributed (empty avatar);
/// an image without a name does not.
pub(crate) fn author_from_columns(name: Option<String>, image: Option<String>) -> Option<Author> {
    match name {
        Some(name) if !name.is_empty() => Some(Author {
            name,
            image: image.unwrap_or_default(),
        }),
        _ => None,
    }
}

pub(crate) fn author_into_columns(author: Option<Author>) -> (Option<String>, Option<String>) {
    match author {
        Some(a) => (Some(a.name), Some(a.image)),
        None => (None, None),
    }
}
