//! Conversions from domain and form errors into the layer errors.
//!
//! The domain layer must not depend on service or repository error types,
//! so the glue lives here.

use crate::domain::types::TypeConstraintError;
use crate::forms::categories::{CategoryFormError, SortFormError};
use crate::forms::forums::ForumFormError;
use crate::forms::moves::{MovePostsFormError, MoveThreadFormError};
use crate::forms::posts::{DeletePostsFormError, EditPostFormError, ReplyFormError};
use crate::forms::search::SearchFormError;
use crate::forms::threads::CreateThreadFormError;
use crate::forms::votes::VoteFormError;
use crate::repository::errors::RepositoryError;
use crate::services::errors::ServiceError;

impl From<TypeConstraintError> for ServiceError {
    fn from(val: TypeConstraintError) -> Self {
        ServiceError::TypeConstraint(val.to_string())
    }
}

impl From<TypeConstraintError> for RepositoryError {
    fn from(val: TypeConstraintError) -> Self {
        RepositoryError::ValidationError(val.to_string())
    }
}

macro_rules! form_error_into_service_error {
    ($($error:ty),+ $(,)?) => {
        $(
            impl From<$error> for ServiceError {
                fn from(val: $error) -> Self {
                    ServiceError::Form(val.to_string())
                }
            }
        )+
    };
}

form_error_into_service_error!(
    CategoryFormError,
    SortFormError,
    ForumFormError,
    MoveThreadFormError,
    MovePostsFormError,
    ReplyFormError,
    EditPostFormError,
    DeletePostsFormError,
    SearchFormError,
    CreateThreadFormError,
    VoteFormError,
);
