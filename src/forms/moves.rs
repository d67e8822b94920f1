use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::types::{ForumId, PostId, ThreadId, ThreadName, TypeConstraintError};
use crate::forms::{escape_title, non_blank};

#[derive(Deserialize, Validate)]
pub struct MoveThreadForm {
    #[validate(range(min = 1))]
    pub thread_id: i32,
    #[validate(range(min = 1))]
    pub forum_id: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveThreadFormPayload {
    pub thread_id: ThreadId,
    pub forum_id: ForumId,
}

#[derive(Debug, Error)]
pub enum MoveThreadFormError {
    #[error("Move thread form validation failed: {0}")]
    Validation(String),
    #[error("Move thread form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for MoveThreadFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for MoveThreadFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<MoveThreadForm> for MoveThreadFormPayload {
    type Error = MoveThreadFormError;

    fn try_from(value: MoveThreadForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            thread_id: ThreadId::new(value.thread_id)?,
            forum_id: ForumId::new(value.forum_id)?,
        })
    }
}

/// Selected posts go either to an existing thread or to a new one created
/// from `new_thread_name` inside `new_thread_forum_id`.
#[derive(Deserialize, Validate)]
pub struct MovePostsForm {
    #[validate(range(min = 1))]
    pub thread_id: i32,
    #[validate(length(min = 1))]
    pub post_ids: Vec<i32>,
    pub destination_thread_id: Option<i32>,
    pub new_thread_name: Option<String>,
    pub new_thread_forum_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveTarget {
    Existing(ThreadId),
    NewThread { name: ThreadName, forum_id: ForumId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovePostsFormPayload {
    pub thread_id: ThreadId,
    pub post_ids: Vec<PostId>,
    pub target: MoveTarget,
}

#[derive(Debug, Error)]
pub enum MovePostsFormError {
    #[error("Move posts form validation failed: {0}")]
    Validation(String),
    #[error("Move posts form contains invalid data: {0}")]
    TypeConstraint(String),
    #[error("Move posts form needs a destination thread or a new thread name and forum")]
    MissingDestination,
}

impl From<ValidationErrors> for MovePostsFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for MovePostsFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<MovePostsForm> for MovePostsFormPayload {
    type Error = MovePostsFormError;

    fn try_from(value: MovePostsForm) -> Result<Self, Self::Error> {
        value.validate()?;

        let target = match (
            value.destination_thread_id,
            non_blank(value.new_thread_name),
            value.new_thread_forum_id,
        ) {
            (Some(thread_id), _, _) => MoveTarget::Existing(ThreadId::new(thread_id)?),
            (None, Some(name), Some(forum_id)) => MoveTarget::NewThread {
                name: ThreadName::new(escape_title(&name))?,
                forum_id: ForumId::new(forum_id)?,
            },
            _ => return Err(MovePostsFormError::MissingDestination),
        };

        Ok(Self {
            thread_id: ThreadId::new(value.thread_id)?,
            post_ids: value
                .post_ids
                .into_iter()
                .map(PostId::new)
                .collect::<Result<Vec<_>, _>>()?,
            target,
        })
    }
}
