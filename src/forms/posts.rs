use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::types::{PostContent, PostId, ThreadId, ThreadName, TypeConstraintError};
use crate::forms::{escape_title, non_blank, sanitize_content};

#[derive(Deserialize, Validate)]
pub struct ReplyForm {
    #[validate(range(min = 1))]
    pub thread_id: i32,
    #[validate(length(min = 1))]
    pub content: String,
    #[serde(default)]
    pub subscribe: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplyFormPayload {
    pub thread_id: ThreadId,
    pub content: PostContent,
    pub subscribe: bool,
}

#[derive(Debug, Error)]
pub enum ReplyFormError {
    #[error("Reply form validation failed: {0}")]
    Validation(String),
    #[error("Reply form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for ReplyFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for ReplyFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<ReplyForm> for ReplyFormPayload {
    type Error = ReplyFormError;

    fn try_from(value: ReplyForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            thread_id: ThreadId::new(value.thread_id)?,
            content: PostContent::new(sanitize_content(&value.content))?,
            subscribe: value.subscribe,
        })
    }
}

/// Edit of a post. `topic` is only meaningful for the first post of a
/// thread, where it is required.
#[derive(Deserialize, Validate)]
pub struct EditPostForm {
    #[validate(range(min = 1))]
    pub post_id: i32,
    #[validate(length(min = 1))]
    pub content: String,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditPostFormPayload {
    pub post_id: PostId,
    pub content: PostContent,
    pub topic: Option<ThreadName>,
}

#[derive(Debug, Error)]
pub enum EditPostFormError {
    #[error("Edit post form validation failed: {0}")]
    Validation(String),
    #[error("Edit post form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for EditPostFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for EditPostFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<EditPostForm> for EditPostFormPayload {
    type Error = EditPostFormError;

    fn try_from(value: EditPostForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            post_id: PostId::new(value.post_id)?,
            content: PostContent::new(sanitize_content(&value.content))?,
            topic: non_blank(value.topic)
                .map(|topic| ThreadName::new(escape_title(&topic)))
                .transpose()?,
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct DeletePostsForm {
    #[validate(range(min = 1))]
    pub thread_id: i32,
    #[validate(length(min = 1))]
    pub post_ids: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeletePostsFormPayload {
    pub thread_id: ThreadId,
    pub post_ids: Vec<PostId>,
}

#[derive(Debug, Error)]
pub enum DeletePostsFormError {
    #[error("Delete posts form validation failed: {0}")]
    Validation(String),
    #[error("Delete posts form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for DeletePostsFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for DeletePostsFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<DeletePostsForm> for DeletePostsFormPayload {
    type Error = DeletePostsFormError;

    fn try_from(value: DeletePostsForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            thread_id: ThreadId::new(value.thread_id)?,
            post_ids: value
                .post_ids
                .into_iter()
                .map(PostId::new)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_form_drops_blank_topic() {
        let form = EditPostForm {
            post_id: 3,
            content: "updated body text".to_string(),
            topic: Some("  ".to_string()),
        };

        let payload: EditPostFormPayload = form.try_into().unwrap();
        assert_eq!(payload.topic, None);
    }

    #[test]
    fn edit_form_cleans_content_and_escapes_topic() {
        let form = EditPostForm {
            post_id: 3,
            content: "<img src=x onerror=\"alert(1)\">updated body text".to_string(),
            topic: Some("\"Quoted\" topic".to_string()),
        };

        let payload: EditPostFormPayload = form.try_into().unwrap();
        assert!(!payload.content.as_str().contains("onerror"));
        assert!(payload.content.as_str().ends_with("updated body text"));
        assert_eq!(payload.topic.unwrap().as_str(), "&quot;Quoted&quot; topic");
    }

    #[test]
    fn reply_form_keeps_plain_comparisons_readable() {
        let form = ReplyForm {
            thread_id: 1,
            content: "when count < limit do more".to_string(),
            subscribe: false,
        };

        let payload: ReplyFormPayload = form.try_into().unwrap();
        assert_eq!(payload.content.as_str(), "when count &lt; limit do more");
    }

    #[test]
    fn reply_form_rejects_non_positive_thread() {
        let form = ReplyForm {
            thread_id: -1,
            content: "a reasonable reply".to_string(),
            subscribe: false,
        };

        let payload: Result<ReplyFormPayload, _> = form.try_into();
        assert!(matches!(payload, Err(ReplyFormError::Validation(_))));
    }

    #[test]
    fn delete_form_requires_selection() {
        let form = DeletePostsForm {
            thread_id: 1,
            post_ids: vec![],
        };

        let payload: Result<DeletePostsFormPayload, _> = form.try_into();
        assert!(payload.is_err());
    }

    #[test]
    fn delete_form_rejects_invalid_ids() {
        let form = DeletePostsForm {
            thread_id: 1,
            post_ids: vec![2, 0],
        };

        let payload: Result<DeletePostsFormPayload, _> = form.try_into();
        assert!(matches!(payload, Err(DeletePostsFormError::TypeConstraint(_))));
    }
}
