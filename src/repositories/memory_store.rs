// src/repositories/memory_store.rs - in-process store for development and tests
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashSet;
use uuid::Uuid;

use crate::errors::{BlogError, BlogResult};
use crate::models::comment::{Comment, CommentView, NewComment};
use crate::models::follow::Follow;
use crate::models::group::{Group, NewGroup};
use crate::models::post::{NewPost, Post, PostChanges, PostFilter, PostView};
use crate::models::user::{NewUser, User, UserPublic};
use crate::repositories::blog_store::BlogStore;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: HashSet<Follow>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn matches(&self, post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(id) => post.group_id == Some(id),
            PostFilter::Author(id) => post.author_id == id,
            PostFilter::FollowedBy(user_id) => self.follows.contains(&Follow {
                user_id,
                author_id: post.author_id,
            }),
        }
    }

    fn view(&self, post: &Post) -> Option<PostView> {
        let author = self.users.iter().find(|u| u.id == post.author_id)?;
        let group = post
            .group_id
            .and_then(|gid| self.groups.iter().find(|g| g.id == gid).cloned());
        Some(PostView {
            id: post.id,
            text: post.text.clone(),
            pub_date: post.pub_date,
            author: UserPublic::from(author),
            group,
            image: post.image.clone(),
        })
    }

    /// Newest first; ids break ties between posts created in the same instant.
    fn sorted_posts(&self, filter: PostFilter) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self.posts.iter().filter(|p| self.matches(p, filter)).collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        posts
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> BlogResult<User> {
        let mut t = self.tables.write();
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(BlogError::Conflict(format!("username {} is taken", user.username)));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> BlogResult<Option<User>> {
        Ok(self.tables.read().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> BlogResult<Option<User>> {
        Ok(self.tables.read().users.iter().find(|u| u.username == username).cloned())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> BlogResult<()> {
        let mut t = self.tables.write();
        let user = t.users.iter_mut().find(|u| u.id == id).ok_or(BlogError::NotFound("user"))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> BlogResult<bool> {
        let mut t = self.tables.write();
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        if t.users.len() == before {
            return Ok(false);
        }
        let owned: HashSet<i64> = t.posts.iter().filter(|p| p.author_id == id).map(|p| p.id).collect();
        t.posts.retain(|p| p.author_id != id);
        t.comments.retain(|c| c.author_id != id && !owned.contains(&c.post_id));
        t.follows.retain(|f| f.user_id != id && f.author_id != id);
        Ok(true)
    }

    async fn create_group(&self, group: NewGroup) -> BlogResult<Group> {
        let mut t = self.tables.write();
        if t.groups.iter().any(|g| g.slug == group.slug) {
            return Err(BlogError::Conflict(format!("slug {} is taken", group.slug)));
        }
        let group = Group {
            id: t.next_id(),
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        t.groups.push(group.clone());
        Ok(group)
    }

    async fn find_group_by_slug(&self, slug: &str) -> BlogResult<Option<Group>> {
        Ok(self.tables.read().groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn find_group_by_id(&self, id: i64) -> BlogResult<Option<Group>> {
        Ok(self.tables.read().groups.iter().find(|g| g.id == id).cloned())
    }

    async fn list_groups(&self) -> BlogResult<Vec<Group>> {
        let mut groups = self.tables.read().groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }

    async fn delete_group(&self, id: i64) -> BlogResult<bool> {
        let mut t = self.tables.write();
        let before = t.groups.len();
        t.groups.retain(|g| g.id != id);
        if t.groups.len() == before {
            return Ok(false);
        }
        for post in t.posts.iter_mut().filter(|p| p.group_id == Some(id)) {
            post.group_id = None;
        }
        Ok(true)
    }

    async fn create_post(&self, post: NewPost) -> BlogResult<Post> {
        let mut t = self.tables.write();
        if !t.users.iter().any(|u| u.id == post.author_id) {
            return Err(BlogError::NotFound("user"));
        }
        let post = Post {
            id: t.next_id(),
            text: post.text,
            pub_date: Utc::now(),
            author_id: post.author_id,
            group_id: post.group_id,
            image: post.image,
        };
        t.posts.push(post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: i64) -> BlogResult<Option<PostView>> {
        let t = self.tables.read();
        Ok(t.posts.iter().find(|p| p.id == id).and_then(|p| t.view(p)))
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> BlogResult<()> {
        let mut t = self.tables.write();
        let post = t.posts.iter_mut().find(|p| p.id == id).ok_or(BlogError::NotFound("post"))?;
        post.text = changes.text;
        post.group_id = changes.group_id;
        if changes.image.is_some() {
            post.image = changes.image;
        }
        Ok(())
    }

    async fn delete_post(&self, id: i64) -> BlogResult<bool> {
        let mut t = self.tables.write();
        let before = t.posts.len();
        t.posts.retain(|p| p.id != id);
        t.comments.retain(|c| c.post_id != id);
        Ok(t.posts.len() != before)
    }

    async fn count_posts(&self, filter: PostFilter) -> BlogResult<usize> {
        let t = self.tables.read();
        Ok(t.posts.iter().filter(|p| t.matches(p, filter)).count())
    }

    async fn list_posts(&self, filter: PostFilter, offset: usize, limit: usize) -> BlogResult<Vec<PostView>> {
        let t = self.tables.read();
        Ok(t.sorted_posts(filter)
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|p| t.view(p))
            .collect())
    }

    async fn create_comment(&self, comment: NewComment) -> BlogResult<Comment> {
        let mut t = self.tables.write();
        if !t.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(BlogError::NotFound("post"));
        }
        let comment = Comment {
            id: t.next_id(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created: Utc::now(),
        };
        t.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, post_id: i64) -> BlogResult<Vec<CommentView>> {
        let t = self.tables.read();
        let mut comments: Vec<&Comment> = t.comments.iter().filter(|c| c.post_id == post_id).collect();
        comments.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        Ok(comments
            .into_iter()
            .filter_map(|c| {
                let author = t.users.iter().find(|u| u.id == c.author_id)?;
                Some(CommentView {
                    id: c.id,
                    text: c.text.clone(),
                    created: c.created,
                    author: UserPublic::from(author),
                })
            })
            .collect())
    }

    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> BlogResult<bool> {
        let Some(edge) = Follow::new(user_id, author_id) else {
            return Ok(false);
        };
        Ok(self.tables.write().follows.insert(edge))
    }

    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> BlogResult<bool> {
        Ok(self.tables.write().follows.remove(&Follow { user_id, author_id }))
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> BlogResult<bool> {
        Ok(self.tables.read().follows.contains(&Follow { user_id, author_id }))
    }

    async fn count_follows(&self) -> BlogResult<usize> {
        Ok(self.tables.read().follows.len())
    }
}
