use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::types::{ForumId, PostContent, ThreadName, TypeConstraintError};
use crate::forms::{escape_title, sanitize_content};

#[derive(Deserialize, Validate)]
pub struct CreateThreadForm {
    #[validate(range(min = 1))]
    pub forum_id: i32,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[serde(default)]
    pub subscribe: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateThreadFormPayload {
    pub forum_id: ForumId,
    pub name: ThreadName,
    pub content: PostContent,
    pub subscribe: bool,
}

#[derive(Debug, Error)]
pub enum CreateThreadFormError {
    #[error("Create thread form validation failed: {0}")]
    Validation(String),
    #[error("Create thread form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for CreateThreadFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for CreateThreadFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<CreateThreadForm> for CreateThreadFormPayload {
    type Error = CreateThreadFormError;

    fn try_from(value: CreateThreadForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            forum_id: ForumId::new(value.forum_id)?,
            name: ThreadName::new(escape_title(&value.name))?,
            content: PostContent::new(sanitize_content(&value.content))?,
            subscribe: value.subscribe,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, content: &str) -> CreateThreadForm {
        CreateThreadForm {
            forum_id: 1,
            name: name.to_string(),
            content: content.to_string(),
            subscribe: true,
        }
    }

    #[test]
    fn accepts_trimmed_input() {
        let payload: CreateThreadFormPayload =
            form("  Hello ", "  long enough content  ").try_into().unwrap();
        assert_eq!(payload.name.as_str(), "Hello");
        assert_eq!(payload.content.as_str(), "long enough content");
        assert!(payload.subscribe);
    }

    #[test]
    fn rejects_short_content() {
        let payload: Result<CreateThreadFormPayload, _> = form("Hello", "   tiny    ").try_into();
        assert!(matches!(payload, Err(CreateThreadFormError::TypeConstraint(_))));
    }

    #[test]
    fn strips_scripts_from_content() {
        let payload: CreateThreadFormPayload = form(
            "Hello",
            "<script>alert(1)</script><p onclick=\"steal()\">long enough content</p>",
        )
        .try_into()
        .unwrap();
        assert_eq!(payload.content.as_str(), "<p>long enough content</p>");
    }

    #[test]
    fn content_is_measured_after_cleaning() {
        let payload: Result<CreateThreadFormPayload, _> =
            form("Hello", "<script>document.cookie</script>hi").try_into();
        assert!(matches!(payload, Err(CreateThreadFormError::TypeConstraint(_))));
    }

    #[test]
    fn escapes_markup_in_name() {
        let payload: CreateThreadFormPayload = form("Fish & <b>Chips</b>", "long enough content")
            .try_into()
            .unwrap();
        assert!(payload.name.as_str().starts_with("Fish &amp; &lt;b&gt;Chips"));
        assert!(!payload.name.as_str().contains('<'));
    }

    #[test]
    fn rejects_overlong_name() {
        let name = "x".repeat(256);
        let payload: Result<CreateThreadFormPayload, _> =
            form(&name, "long enough content").try_into();
        assert!(payload.is_err());
    }
}
