use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::forum::{ForumUpdate, NewForum};
use crate::domain::types::{CategoryId, ForumId, ForumName, Slug, TypeConstraintError};
use crate::forms::non_blank;

#[derive(Deserialize, Validate)]
pub struct AddForumForm {
    #[validate(range(min = 1))]
    pub category_id: i32,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub sub: Option<String>,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub sort: i32,
    pub keywords: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddForumFormPayload {
    pub category_id: CategoryId,
    pub name: ForumName,
    pub sub: Option<String>,
    pub visible: bool,
    pub sort: i32,
    pub keywords: Option<String>,
    pub description: Option<String>,
}

impl AddForumFormPayload {
    pub fn into_new_forum(self, now: chrono::NaiveDateTime) -> NewForum {
        NewForum {
            category_id: self.category_id,
            slug: Slug::from_name(self.name.as_str()),
            name: self.name,
            sub: self.sub,
            visible: self.visible,
            sort: self.sort,
            keywords: self.keywords,
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Error shared by the forum add and update forms.
#[derive(Debug, Error)]
pub enum ForumFormError {
    #[error("Forum form validation failed: {0}")]
    Validation(String),
    #[error("Forum form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for ForumFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for ForumFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<AddForumForm> for AddForumFormPayload {
    type Error = ForumFormError;

    fn try_from(value: AddForumForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            category_id: CategoryId::new(value.category_id)?,
            name: ForumName::new(value.name.trim())?,
            sub: non_blank(value.sub),
            visible: value.visible,
            sort: value.sort,
            keywords: non_blank(value.keywords),
            description: non_blank(value.description),
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct UpdateForumForm {
    #[validate(range(min = 1))]
    pub forum_id: i32,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub sub: Option<String>,
    #[serde(default)]
    pub visible: bool,
    pub keywords: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateForumFormPayload {
    pub forum_id: ForumId,
    pub update: ForumUpdate,
}

impl TryFrom<UpdateForumForm> for UpdateForumFormPayload {
    type Error = ForumFormError;

    fn try_from(value: UpdateForumForm) -> Result<Self, Self::Error> {
        value.validate()?;
        let name = ForumName::new(value.name.trim())?;
        Ok(Self {
            forum_id: ForumId::new(value.forum_id)?,
            update: ForumUpdate {
                slug: Slug::from_name(name.as_str()),
                name,
                sub: non_blank(value.sub),
                visible: value.visible,
                keywords: non_blank(value.keywords),
                description: non_blank(value.description),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_forum_requires_category() {
        let form = AddForumForm {
            category_id: 0,
            name: "Support".to_string(),
            sub: None,
            visible: true,
            sort: 0,
            keywords: None,
            description: None,
        };

        let payload: Result<AddForumFormPayload, _> = form.try_into();
        assert!(matches!(payload, Err(ForumFormError::Validation(_))));
    }

    #[test]
    fn update_forum_keeps_subtitle() {
        let form = UpdateForumForm {
            forum_id: 4,
            name: "Help Desk".to_string(),
            sub: Some(" Ask anything ".to_string()),
            visible: false,
            keywords: None,
            description: None,
        };

        let payload: UpdateForumFormPayload = form.try_into().unwrap();
        assert_eq!(payload.forum_id.get(), 4);
        assert_eq!(payload.update.slug.as_str(), "help-desk");
        assert_eq!(payload.update.sub.as_deref(), Some("Ask anything"));
        assert!(!payload.update.visible);
    }
}
