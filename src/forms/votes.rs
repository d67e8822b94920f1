use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::types::{PostId, TypeConstraintError};
use crate::domain::vote::Thumb;

#[derive(Deserialize, Validate)]
pub struct VoteForm {
    #[validate(range(min = 1))]
    pub post_id: i32,
    /// `up` or `down`.
    pub thumb: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteFormPayload {
    pub post_id: PostId,
    pub thumb: Thumb,
}

#[derive(Debug, Error)]
pub enum VoteFormError {
    #[error("Vote form validation failed: {0}")]
    Validation(String),
    #[error("Vote form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for VoteFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for VoteFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<VoteForm> for VoteFormPayload {
    type Error = VoteFormError;

    fn try_from(value: VoteForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            post_id: PostId::new(value.post_id)?,
            thumb: Thumb::try_from(value.thumb.trim())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_direction() {
        let payload: VoteFormPayload = VoteForm {
            post_id: 7,
            thumb: "down".to_string(),
        }
        .try_into()
        .unwrap();
        assert_eq!(payload.thumb, Thumb::Down);
    }

    #[test]
    fn rejects_unknown_direction() {
        let payload: Result<VoteFormPayload, _> = VoteForm {
            post_id: 7,
            thumb: "sideways".to_string(),
        }
        .try_into();
        assert!(matches!(payload, Err(VoteFormError::TypeConstraint(_))));
    }
}
