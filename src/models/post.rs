use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::models::group::Group;
use crate::models::user::UserPublic;

/// Number of characters shown when a post is printed as a one-liner.
pub const CHARS_IN_STR: usize = 15;

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub text: String,
    pub author_id: Uuid,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Fields an author may change. `image: None` keeps the stored image.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// A post joined with its author and group, as listed on pages.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: UserPublic,
    pub group: Option<Group>,
    pub image: Option<String>,
}

impl PostView {
    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author.id == user_id
    }
}

impl fmt::Display for PostView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.text.chars().take(CHARS_IN_STR).collect();
        f.write_str(&short)
    }
}

/// Which posts a listing selects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(Uuid),
    /// Posts by every author the given user follows.
    FollowedBy(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_truncates_to_fifteen_chars() {
        let post = PostView {
            id: 1,
            text: "Тестовый текст тестового поста".to_string(),
            pub_date: Utc::now(),
            author: UserPublic { id: Uuid::new_v4(), username: "leo".into() },
            group: None,
            image: None,
        };
        assert_eq!(post.to_string(), "Тестовый текст ");
    }
}
