use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::vocabulary::tokenize;
use crate::repository::DEFAULT_ITEMS_PER_PAGE;

#[derive(Deserialize, Validate)]
pub struct SearchForm {
    #[validate(length(min = 1, max = 255))]
    pub q: String,
    #[validate(range(min = 1))]
    pub page: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchFormPayload {
    /// Index words extracted from the query.
    pub words: Vec<String>,
    pub page: usize,
    pub per_page: usize,
}

#[derive(Debug, Error)]
pub enum SearchFormError {
    #[error("Search form validation failed: {0}")]
    Validation(String),
    #[error("Search query has no searchable words")]
    NoWords,
}

impl From<ValidationErrors> for SearchFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl TryFrom<SearchForm> for SearchFormPayload {
    type Error = SearchFormError;

    fn try_from(value: SearchForm) -> Result<Self, Self::Error> {
        value.validate()?;
        let words = tokenize(&value.q);
        if words.is_empty() {
            return Err(SearchFormError::NoWords);
        }
        Ok(Self {
            words,
            page: value.page.unwrap_or(1),
            per_page: DEFAULT_ITEMS_PER_PAGE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_query() {
        let payload: SearchFormPayload = SearchForm {
            q: "rust, borrow checker".to_string(),
            page: None,
        }
        .try_into()
        .unwrap();
        assert_eq!(payload.words, vec!["rust", "borrow", "checker"]);
        assert_eq!(payload.page, 1);
    }

    #[test]
    fn rejects_query_of_short_words() {
        let payload: Result<SearchFormPayload, _> = SearchForm {
            q: "a an".to_string(),
            page: Some(2),
        }
        .try_into();
        assert!(matches!(payload, Err(SearchFormError::NoWords)));
    }
}
