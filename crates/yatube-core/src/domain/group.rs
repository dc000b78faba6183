use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::slug::{SLUG_MAX_LEN, slugify};

/// Longest accepted group title, in characters.
pub const TITLE_MAX_LEN: usize = 200;

/// A named, slug-addressed collection of posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    /// Create a group. When `slug` is empty or missing it is derived from the
    /// title and cut to [`SLUG_MAX_LEN`] characters.
    pub fn new(
        title: impl Into<String>,
        slug: Option<&str>,
        description: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::Validation("group title is required".into()));
        }
        if title.chars().count() > TITLE_MAX_LEN {
            return Err(DomainError::Validation(format!(
                "group title must be at most {TITLE_MAX_LEN} characters"
            )));
        }

        let slug = match slug.map(str::trim).filter(|s| !s.is_empty()) {
            Some(explicit) => explicit.to_string(),
            None => slugify(&title).chars().take(SLUG_MAX_LEN).collect(),
        };
        if slug.is_empty() {
            return Err(DomainError::Validation(format!(
                "cannot derive a slug from title {title:?}"
            )));
        }
        if slug.chars().count() > SLUG_MAX_LEN {
            return Err(DomainError::Validation(format!(
                "group slug must be at most {SLUG_MAX_LEN} characters"
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            title,
            slug,
            description: description.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_derived_from_cyrillic_title() {
        let group = Group::new("Тестовая группа", None, "Тестовое описание").unwrap();
        assert_eq!(group.slug, "testovaya-gruppa");
    }

    #[test]
    fn test_derived_slug_is_truncated() {
        let title = "Очень длинное название группы, которое никак не помещается в адрес";
        let group = Group::new(title, None, "").unwrap();
        assert_eq!(group.slug.chars().count(), SLUG_MAX_LEN);
        assert!(slugify(title).starts_with(&group.slug));
    }

    #[test]
    fn test_explicit_slug_is_kept() {
        let group = Group::new("Тестовая группа", Some("test-slug"), "").unwrap();
        assert_eq!(group.slug, "test-slug");
    }

    #[test]
    fn test_blank_slug_falls_back_to_title() {
        let group = Group::new("Cats & Dogs", Some("  "), "").unwrap();
        assert_eq!(group.slug, "cats-and-dogs");
    }

    #[test]
    fn test_empty_title_rejected() {
        assert!(matches!(
            Group::new("   ", None, ""),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_underivable_slug_rejected() {
        assert!(matches!(
            Group::new("!!!", None, ""),
            Err(DomainError::Validation(_))
        ));
    }
}
