//! Form binding: raw submitted fields in, cleaned values or field errors out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Group;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Longest image reference a post may carry.
pub const IMAGE_MAX_LEN: usize = 100;

/// Field name to error messages, in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> + '_ {
        self.0.iter().map(|(field, messages)| (*field, messages.as_slice()))
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

/// Strip a field; empty means absent.
fn cleaned(raw: &str) -> Option<&str> {
    Some(raw.trim()).filter(|s| !s.is_empty())
}

/// Post form as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostInput {
    pub text: String,
    pub group: String,
    pub image: String,
}

/// Validated post fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostForm {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

impl PostInput {
    /// Validate against the groups a post may be filed under.
    pub fn validate(&self, groups: &[Group]) -> Result<PostForm, FormErrors> {
        let mut errors = FormErrors::default();

        let text = cleaned(&self.text);
        if text.is_none() {
            errors.add("text", REQUIRED);
        }

        let group_id = match cleaned(&self.group) {
            None => None,
            Some(raw) => {
                let known = Uuid::parse_str(raw)
                    .ok()
                    .filter(|id| groups.iter().any(|g| g.id == *id));
                if known.is_none() {
                    errors.add("group", INVALID_CHOICE);
                }
                known
            }
        };

        let image = cleaned(&self.image);
        if let Some(image) = image {
            let len = image.chars().count();
            if len > IMAGE_MAX_LEN {
                errors.add(
                    "image",
                    format!(
                        "Ensure this filename has at most {IMAGE_MAX_LEN} characters (it has {len})."
                    ),
                );
            }
        }

        errors.into_result(|| PostForm {
            text: text.unwrap_or_default().to_string(),
            group_id,
            image: image.map(str::to_string),
        })
    }
}

/// Comment form as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentInput {
    pub text: String,
}

impl CommentInput {
    /// The cleaned comment text.
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::default();
        let text = cleaned(&self.text);
        if text.is_none() {
            errors.add("text", REQUIRED);
        }
        errors.into_result(|| text.unwrap_or_default().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> Group {
        Group::new("Тестовая группа", Some("test-slug"), "").unwrap()
    }

    #[test]
    fn test_valid_post_is_stripped() {
        let g = group();
        let input = PostInput {
            text: "  Текст поста \n".into(),
            group: g.id.to_string(),
            image: "posts/small.gif".into(),
        };
        let form = input.validate(&[g.clone()]).unwrap();
        assert_eq!(form.text, "Текст поста");
        assert_eq!(form.group_id, Some(g.id));
        assert_eq!(form.image.as_deref(), Some("posts/small.gif"));
    }

    #[test]
    fn test_blank_text_is_required() {
        let input = PostInput {
            text: "   ".into(),
            ..Default::default()
        };
        let errors = input.validate(&[]).unwrap_err();
        assert_eq!(errors.field("text"), [REQUIRED.to_string()]);
    }

    #[test]
    fn test_group_is_optional() {
        let input = PostInput {
            text: "no group".into(),
            ..Default::default()
        };
        let form = input.validate(&[]).unwrap();
        assert_eq!(form.group_id, None);
        assert_eq!(form.image, None);
    }

    #[test]
    fn test_unknown_group_rejected() {
        let input = PostInput {
            text: "text".into(),
            group: Uuid::new_v4().to_string(),
            ..Default::default()
        };
        let errors = input.validate(&[group()]).unwrap_err();
        assert_eq!(errors.field("group"), [INVALID_CHOICE.to_string()]);
        assert!(errors.field("text").is_empty());
    }

    #[test]
    fn test_malformed_group_rejected() {
        let input = PostInput {
            text: "text".into(),
            group: "not-a-uuid".into(),
            ..Default::default()
        };
        assert!(input.validate(&[group()]).is_err());
    }

    #[test]
    fn test_overlong_image_rejected() {
        let input = PostInput {
            text: "text".into(),
            image: "x".repeat(IMAGE_MAX_LEN + 1),
            ..Default::default()
        };
        let errors = input.validate(&[]).unwrap_err();
        assert_eq!(errors.field("image").len(), 1);
    }

    #[test]
    fn test_comment_requires_text() {
        assert!(CommentInput { text: "\t".into() }.validate().is_err());
        assert_eq!(
            CommentInput { text: " hi ".into() }.validate().unwrap(),
            "hi"
        );
    }
}
