// src/repositories/pg_store.rs
use async_trait::async_trait;
use deadpool_postgres::Pool;
use log::info;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::errors::{BlogError, BlogResult};
use crate::models::comment::{Comment, CommentView, NewComment};
use crate::models::follow::Follow;
use crate::models::group::{Group, NewGroup};
use crate::models::post::{NewPost, Post, PostChanges, PostFilter, PostView};
use crate::models::user::{NewUser, User, UserPublic};
use crate::repositories::blog_store::BlogStore;

const SCHEMA: &str = include_str!("../../migrations/0001_initial.sql");

const POST_VIEW_SELECT: &str = "SELECT p.id, p.text, p.pub_date, p.image, \
     u.id AS author_id, u.username, \
     g.id AS group_id, g.title, g.slug, g.description \
     FROM posts p \
     JOIN users u ON u.id = p.author_id \
     LEFT JOIN groups g ON g.id = p.group_id";

/// Apply the schema once at startup. Every statement is idempotent.
pub async fn apply_schema(pool: &Pool) -> BlogResult<()> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;
    tx.batch_execute(SCHEMA).await?;
    tx.commit().await?;
    info!("database schema is up to date");
    Ok(())
}

enum FilterArg {
    Nothing,
    Id(i64),
    User(Uuid),
}

fn filter_clause(filter: PostFilter) -> (&'static str, FilterArg) {
    match filter {
        PostFilter::All => ("TRUE", FilterArg::Nothing),
        PostFilter::Group(id) => ("p.group_id = $1", FilterArg::Id(id)),
        PostFilter::Author(id) => ("p.author_id = $1", FilterArg::User(id)),
        PostFilter::FollowedBy(id) => (
            "p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = $1)",
            FilterArg::User(id),
        ),
    }
}

fn user_from_row(row: &Row) -> Result<User, tokio_postgres::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

fn group_from_row(row: &Row) -> Result<Group, tokio_postgres::Error> {
    Ok(Group {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
    })
}

fn post_from_row(row: &Row) -> Result<Post, tokio_postgres::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        pub_date: row.try_get("pub_date")?,
        author_id: row.try_get("author_id")?,
        group_id: row.try_get("group_id")?,
        image: row.try_get("image")?,
    })
}

fn post_view_from_row(row: &Row) -> Result<PostView, tokio_postgres::Error> {
    let group_id: Option<i64> = row.try_get("group_id")?;
    let group = match group_id {
        Some(id) => Some(Group {
            id,
            title: row.try_get("title")?,
            slug: row.try_get("slug")?,
            description: row.try_get("description")?,
        }),
        None => None,
    };
    Ok(PostView {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        pub_date: row.try_get("pub_date")?,
        author: UserPublic {
            id: row.try_get("author_id")?,
            username: row.try_get("username")?,
        },
        group,
        image: row.try_get("image")?,
    })
}

fn is_unique_violation(err: &tokio_postgres::Error) -> bool {
    err.code() == Some(&SqlState::UNIQUE_VIOLATION)
}

/// Repository untuk semua table blog via deadpool-postgres
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlogStore for PgStore {
    async fn create_user(&self, user: NewUser) -> BlogResult<User> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4) \
                 RETURNING id, username, email, password_hash, created_at",
                &[&Uuid::new_v4(), &user.username, &user.email, &user.password_hash],
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    BlogError::Conflict(format!("username {} is taken", user.username))
                } else {
                    BlogError::Database(e)
                }
            })?;
        Ok(user_from_row(&row)?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> BlogResult<Option<User>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
                &[&id],
            )
            .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn find_user_by_username(&self, username: &str) -> BlogResult<Option<User>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
                &[&username],
            )
            .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> BlogResult<()> {
        let client = self.pool.get().await?;
        let updated = client
            .execute("UPDATE users SET password_hash = $2 WHERE id = $1", &[&id, &password_hash])
            .await?;
        if updated == 0 {
            return Err(BlogError::NotFound("user"));
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> BlogResult<bool> {
        let client = self.pool.get().await?;
        let deleted = client.execute("DELETE FROM users WHERE id = $1", &[&id]).await?;
        Ok(deleted > 0)
    }

    async fn create_group(&self, group: NewGroup) -> BlogResult<Group> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO groups (title, slug, description) VALUES ($1, $2, $3) \
                 RETURNING id, title, slug, description",
                &[&group.title, &group.slug, &group.description],
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    BlogError::Conflict(format!("slug {} is taken", group.slug))
                } else {
                    BlogError::Database(e)
                }
            })?;
        Ok(group_from_row(&row)?)
    }

    async fn find_group_by_slug(&self, slug: &str) -> BlogResult<Option<Group>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt("SELECT id, title, slug, description FROM groups WHERE slug = $1", &[&slug])
            .await?;
        Ok(row.as_ref().map(group_from_row).transpose()?)
    }

    async fn find_group_by_id(&self, id: i64) -> BlogResult<Option<Group>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt("SELECT id, title, slug, description FROM groups WHERE id = $1", &[&id])
            .await?;
        Ok(row.as_ref().map(group_from_row).transpose()?)
    }

    async fn list_groups(&self) -> BlogResult<Vec<Group>> {
        let client = self.pool.get().await?;
        let rows = client
            .query("SELECT id, title, slug, description FROM groups ORDER BY title", &[])
            .await?;
        Ok(rows.iter().map(group_from_row).collect::<Result<_, _>>()?)
    }

    async fn delete_group(&self, id: i64) -> BlogResult<bool> {
        let client = self.pool.get().await?;
        let deleted = client.execute("DELETE FROM groups WHERE id = $1", &[&id]).await?;
        Ok(deleted > 0)
    }

    async fn create_post(&self, post: NewPost) -> BlogResult<Post> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO posts (text, author_id, group_id, image) VALUES ($1, $2, $3, $4) \
                 RETURNING id, text, pub_date, author_id, group_id, image",
                &[&post.text, &post.author_id, &post.group_id, &post.image],
            )
            .await?;
        Ok(post_from_row(&row)?)
    }

    async fn find_post(&self, id: i64) -> BlogResult<Option<PostView>> {
        let client = self.pool.get().await?;
        let sql = format!("{} WHERE p.id = $1", POST_VIEW_SELECT);
        let row = client.query_opt(sql.as_str(), &[&id]).await?;
        Ok(row.as_ref().map(post_view_from_row).transpose()?)
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> BlogResult<()> {
        let client = self.pool.get().await?;
        let updated = client
            .execute(
                "UPDATE posts SET text = $2, group_id = $3, image = COALESCE($4, image) WHERE id = $1",
                &[&id, &changes.text, &changes.group_id, &changes.image],
            )
            .await?;
        if updated == 0 {
            return Err(BlogError::NotFound("post"));
        }
        Ok(())
    }

    async fn delete_post(&self, id: i64) -> BlogResult<bool> {
        let client = self.pool.get().await?;
        let deleted = client.execute("DELETE FROM posts WHERE id = $1", &[&id]).await?;
        Ok(deleted > 0)
    }

    async fn count_posts(&self, filter: PostFilter) -> BlogResult<usize> {
        let client = self.pool.get().await?;
        let (clause, arg) = filter_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM posts p WHERE {}", clause);
        let row = match &arg {
            FilterArg::Nothing => client.query_one(sql.as_str(), &[]).await?,
            FilterArg::Id(id) => client.query_one(sql.as_str(), &[id]).await?,
            FilterArg::User(id) => client.query_one(sql.as_str(), &[id]).await?,
        };
        let count: i64 = row.try_get(0)?;
        Ok(count as usize)
    }

    async fn list_posts(&self, filter: PostFilter, offset: usize, limit: usize) -> BlogResult<Vec<PostView>> {
        let client = self.pool.get().await?;
        let (clause, arg) = filter_clause(filter);
        let offset = offset as i64;
        let limit = limit as i64;

        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(3);
        match &arg {
            FilterArg::Nothing => {}
            FilterArg::Id(id) => params.push(id),
            FilterArg::User(id) => params.push(id),
        }
        let limit_at = params.len() + 1;
        params.push(&limit);
        params.push(&offset);

        let sql = format!(
            "{} WHERE {} ORDER BY p.pub_date DESC, p.id DESC LIMIT ${} OFFSET ${}",
            POST_VIEW_SELECT,
            clause,
            limit_at,
            limit_at + 1
        );
        let rows = client.query(sql.as_str(), &params).await?;
        Ok(rows.iter().map(post_view_from_row).collect::<Result<_, _>>()?)
    }

    async fn create_comment(&self, comment: NewComment) -> BlogResult<Comment> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO comments (post_id, author_id, text) VALUES ($1, $2, $3) \
                 RETURNING id, post_id, author_id, text, created",
                &[&comment.post_id, &comment.author_id, &comment.text],
            )
            .await?;
        Ok(Comment {
            id: row.try_get("id")?,
            post_id: row.try_get("post_id")?,
            author_id: row.try_get("author_id")?,
            text: row.try_get("text")?,
            created: row.try_get("created")?,
        })
    }

    async fn list_comments(&self, post_id: i64) -> BlogResult<Vec<CommentView>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT c.id, c.text, c.created, u.id AS author_id, u.username \
                 FROM comments c JOIN users u ON u.id = c.author_id \
                 WHERE c.post_id = $1 ORDER BY c.created DESC, c.id DESC",
                &[&post_id],
            )
            .await?;
        let mut comments = Vec::with_capacity(rows.len());
        for row in &rows {
            comments.push(CommentView {
                id: row.try_get("id")?,
                text: row.try_get("text")?,
                created: row.try_get("created")?,
                author: UserPublic {
                    id: row.try_get("author_id")?,
                    username: row.try_get("username")?,
                },
            });
        }
        Ok(comments)
    }

    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> BlogResult<bool> {
        let Some(edge) = Follow::new(user_id, author_id) else {
            return Ok(false);
        };
        let client = self.pool.get().await?;
        let inserted = client
            .execute(
                "INSERT INTO follows (user_id, author_id) VALUES ($1, $2) \
                 ON CONFLICT ON CONSTRAINT uq_user_author DO NOTHING",
                &[&edge.user_id, &edge.author_id],
            )
            .await?;
        Ok(inserted > 0)
    }

    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> BlogResult<bool> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute(
                "DELETE FROM follows WHERE user_id = $1 AND author_id = $2",
                &[&user_id, &author_id],
            )
            .await?;
        Ok(deleted > 0)
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> BlogResult<bool> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
                &[&user_id, &author_id],
            )
            .await?;
        Ok(row.try_get(0)?)
    }

    async fn count_follows(&self) -> BlogResult<usize> {
        let client = self.pool.get().await?;
        let row = client.query_one("SELECT COUNT(*) FROM follows", &[]).await?;
        let count: i64 = row.try_get(0)?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_filter_uses_follow_subquery() {
        let (clause, arg) = filter_clause(PostFilter::FollowedBy(Uuid::nil()));
        assert!(clause.contains("FROM follows"));
        assert!(matches!(arg, FilterArg::User(id) if id.is_nil()));
    }

    #[test]
    fn schema_declares_cascade_rules() {
        assert!(SCHEMA.contains("group_id BIGINT REFERENCES groups (id) ON DELETE SET NULL"));
        assert!(SCHEMA.contains("CONSTRAINT uq_user_author UNIQUE (user_id, author_id)"));
        assert!(SCHEMA.contains("CHECK (user_id <> author_id)"));
    }
}
