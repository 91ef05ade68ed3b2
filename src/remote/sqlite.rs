// Local SQLite implementation of the posts table
use async_trait::async_trait;
use rusqlite::params;

use super::{PostStore, RemoteError};
use crate::feed::post::{NewPost, NewPostRow, Post, PostId, PostRow};
use crate::state::DbPool;

pub struct SqlitePostStore {
    pool: DbPool,
}

impl SqlitePostStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for SqlitePostStore {
    async fn list_posts(&self) -> Result<Vec<Post>, RemoteError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, title, link, likes, author_name, author_image
             FROM posts
             ORDER BY id DESC",
        )?;

        let posts = stmt
            .query_map([], |row| {
                Ok(PostRow {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    link: row.get(2)?,
                    likes: row.get(3)?,
                    author_name: row.get(4)?,
                    author_image: row.get(5)?,
                })
            })?
            .map(|row| row.map(Post::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    async fn increment_likes(&self, id: PostId, _current: i64) -> Result<(), RemoteError> {
        let conn = self.pool.get()?;

        // Single statement, so concurrent likers never lose an update
        let rows = conn.execute(
            "UPDATE posts SET likes = likes + 1 WHERE id = ?1",
            params![id.0],
        )?;

        if rows == 0 {
            return Err(RemoteError::NotFound(format!("post {}", id)));
        }
        Ok(())
    }

    async fn insert_post(&self, post: NewPost) -> Result<PostId, RemoteError> {
        let row = NewPostRow::from(post);
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO posts (title, link, likes, author_name, author_image)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                row.title,
                row.link,
                row.likes,
                row.author_name,
                row.author_image
            ],
        )?;

        Ok(PostId(conn.last_insert_rowid()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::feed::post::Author;

    fn store() -> SqlitePostStore {
        let pool = db::memory_pool().unwrap();
        db::run_migrations(&pool).unwrap();
        SqlitePostStore::new(pool)
    }

    fn new_post(title: &str, author: Option<&str>) -> NewPost {
        NewPost {
            title: title.to_string(),
            link: format!("http://example.com/{}", title),
            author: author.map(|name| Author {
                name: name.to_string(),
                image: format!("http://img/{}", name),
            }),
        }
    }

    #[tokio::test]
    async fn list_orders_newest_first() {
        let store = store();
        let first = store.insert_post(new_post("a", Some("alice"))).await.unwrap();
        let second = store.insert_post(new_post("b", None)).await.unwrap();
        assert!(second > first);

        let posts = store.list_posts().await.unwrap();
        let ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn insert_starts_at_zero_likes_and_keeps_author_pair() {
        let store = store();
        store.insert_post(new_post("a", Some("alice"))).await.unwrap();
        store.insert_post(new_post("b", None)).await.unwrap();

        let posts = store.list_posts().await.unwrap();
        assert!(posts.iter().all(|p| p.likes == 0));
        assert_eq!(posts[0].author, None);
        assert_eq!(posts[1].author_name(), Some("alice"));
        assert_eq!(posts[1].author_image(), Some("http://img/alice"));
    }

    #[tokio::test]
    async fn increment_ignores_stale_counter() {
        let store = store();
        let id = store.insert_post(new_post("a", None)).await.unwrap();

        store.increment_likes(id, 0).await.unwrap();
        store.increment_likes(id, 0).await.unwrap();

        let posts = store.list_posts().await.unwrap();
        assert_eq!(posts[0].likes, 2);
    }

    #[tokio::test]
    async fn increment_missing_post_fails() {
        let store = store();
        let result = store.increment_likes(PostId(99), 0).await;
        assert!(matches!(result, Err(RemoteError::NotFound(_))));
    }
}
