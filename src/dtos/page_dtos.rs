// Page contexts handed to the template layer.
use serde::Serialize;

use crate::dtos::auth_dtos::SignupFormOut;
use crate::dtos::post_dtos::{CommentForm, FormErrors, PostForm};
use crate::models::comment::CommentView;
use crate::models::group::Group;
use crate::models::post::PostView;
use crate::models::user::UserPublic;
use crate::services::pagination::Page;

#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct GroupPage {
    pub group: Group,
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub author: UserPublic,
    pub page_obj: Page<PostView>,
    pub following: bool,
}

#[derive(Debug, Serialize)]
pub struct FollowPage {
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct PostDetailPage {
    pub post: PostView,
    /// total posts by the same author
    pub count: usize,
    /// viewer wrote this post; only toggles the edit button
    pub is_author: bool,
    pub form: CommentForm,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
pub struct PostFormPage {
    pub form: PostForm,
    pub errors: FormErrors,
    pub groups: Vec<Group>,
    pub is_edit: bool,
    pub id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SignupPage {
    pub form: SignupFormOut,
    pub errors: FormErrors,
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub username: String,
    pub next: Option<String>,
    pub errors: FormErrors,
}

#[derive(Debug, Serialize)]
pub struct FormPage {
    pub errors: FormErrors,
}

#[derive(Debug, Serialize)]
pub struct StaticPage {
    pub template: &'static str,
    pub title: &'static str,
}
