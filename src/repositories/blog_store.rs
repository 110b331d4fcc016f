// src/repositories/blog_store.rs
use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::BlogResult;
use crate::models::comment::{Comment, CommentView, NewComment};
use crate::models::group::{Group, NewGroup};
use crate::models::post::{NewPost, Post, PostChanges, PostFilter, PostView};
use crate::models::user::{NewUser, User};

/// Persistence used by the handlers. Every method is one atomic write or a
/// read; callers never see a half-applied change.
#[async_trait]
pub trait BlogStore: Send + Sync {
    // users
    /// Fails with `BlogError::Conflict` when the username is taken.
    async fn create_user(&self, user: NewUser) -> BlogResult<User>;
    async fn find_user_by_id(&self, id: Uuid) -> BlogResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> BlogResult<Option<User>>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> BlogResult<()>;
    /// Administrative removal; no route calls it. Cascades to posts, comments and follow edges.
    async fn delete_user(&self, id: Uuid) -> BlogResult<bool>;

    // groups
    async fn create_group(&self, group: NewGroup) -> BlogResult<Group>;
    async fn find_group_by_slug(&self, slug: &str) -> BlogResult<Option<Group>>;
    async fn find_group_by_id(&self, id: i64) -> BlogResult<Option<Group>>;
    async fn list_groups(&self) -> BlogResult<Vec<Group>>;
    /// Administrative removal; no route calls it. Referencing posts keep
    /// living with their group cleared.
    async fn delete_group(&self, id: i64) -> BlogResult<bool>;

    // posts
    async fn create_post(&self, post: NewPost) -> BlogResult<Post>;
    async fn find_post(&self, id: i64) -> BlogResult<Option<PostView>>;
    async fn update_post(&self, id: i64, changes: PostChanges) -> BlogResult<()>;
    async fn delete_post(&self, id: i64) -> BlogResult<bool>;
    async fn count_posts(&self, filter: PostFilter) -> BlogResult<usize>;
    /// Newest first.
    async fn list_posts(&self, filter: PostFilter, offset: usize, limit: usize) -> BlogResult<Vec<PostView>>;

    // comments
    async fn create_comment(&self, comment: NewComment) -> BlogResult<Comment>;
    /// Newest first, unpaginated.
    async fn list_comments(&self, post_id: i64) -> BlogResult<Vec<CommentView>>;

    // follows
    /// Returns `true` when a new edge was stored. Self-follows store nothing.
    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> BlogResult<bool>;
    /// Returns `true` when an edge was removed.
    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> BlogResult<bool>;
    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> BlogResult<bool>;
    async fn count_follows(&self) -> BlogResult<usize>;
}
