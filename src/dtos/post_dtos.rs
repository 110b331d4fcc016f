use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::post::PostView;
use crate::services::media_storage::{CheckedImage, ImageUpload};

/// Field name -> messages, the way a form template shows them.
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Submitted post form (create and edit share it).
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    /// group id, blank for none
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default, skip_serializing)]
    pub image_data: Option<String>,
    #[serde(default, skip_serializing)]
    pub image_content_type: Option<String>,
    #[serde(default, skip_serializing)]
    pub image_name: Option<String>,
}

/// Post form after field validation. The group still has to be looked up.
#[derive(Debug)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<CheckedImage>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl PostForm {
    pub fn from_post(post: &PostView) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group.as_ref().map(|g| g.id.to_string()),
            ..Self::default()
        }
    }

    pub fn clean(&self) -> Result<CleanPost, FormErrors> {
        let mut errors = FormErrors::default();

        let text = self.text.trim().to_string();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }

        let group_id = match non_blank(&self.group) {
            None => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("group", INVALID_CHOICE);
                    None
                }
            },
        };

        let image = match non_blank(&self.image_data) {
            None => None,
            Some(data) => {
                let upload = ImageUpload {
                    data: data.to_string(),
                    content_type: non_blank(&self.image_content_type).unwrap_or_default().to_string(),
                    file_name: self.image_name.clone(),
                };
                match upload.check() {
                    Ok(checked) => Some(checked),
                    Err(msg) => {
                        errors.add("image", msg);
                        None
                    }
                }
            }
        };

        if errors.is_empty() {
            Ok(CleanPost { text, group_id, image })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    /// Trimmed text, or `None` when there is nothing to store.
    pub fn clean(&self) -> Option<String> {
        let text = self.text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SMALL_GIF;

    #[test]
    fn text_is_required() {
        let errors = PostForm { text: "   ".into(), ..Default::default() }.clean().unwrap_err();
        assert!(errors.has("text"));
    }

    #[test]
    fn blank_group_means_none() {
        let form = PostForm { text: "hello".into(), group: Some("".into()), ..Default::default() };
        let clean = form.clean().unwrap();
        assert_eq!(clean.group_id, None);
        assert_eq!(clean.text, "hello");
    }

    #[test]
    fn garbage_group_is_rejected() {
        let form = PostForm { text: "hello".into(), group: Some("cats".into()), ..Default::default() };
        assert!(form.clean().unwrap_err().has("group"));
    }

    #[test]
    fn image_needs_image_content_type() {
        let mut form = PostForm {
            text: "pic".into(),
            image_data: Some(SMALL_GIF.into()),
            image_content_type: Some("application/pdf".into()),
            ..Default::default()
        };
        assert!(form.clean().unwrap_err().has("image"));

        form.image_content_type = Some("image/gif".into());
        assert!(form.clean().unwrap().image.is_some());
    }

    #[test]
    fn comment_text_is_trimmed() {
        assert_eq!(CommentForm { text: "  nice  ".into() }.clean().as_deref(), Some("nice"));
        assert_eq!(CommentForm { text: "\n".into() }.clean(), None);
    }
}
