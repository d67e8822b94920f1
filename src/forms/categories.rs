use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::category::{CategoryUpdate, NewCategory};
use crate::domain::types::{CategoryId, CategoryName, Slug, TypeConstraintError};
use crate::forms::non_blank;

#[derive(Deserialize, Validate)]
pub struct AddCategoryForm {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub sort: i32,
    pub keywords: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddCategoryFormPayload {
    pub name: CategoryName,
    pub visible: bool,
    pub sort: i32,
    pub keywords: Option<String>,
    pub description: Option<String>,
}

impl AddCategoryFormPayload {
    pub fn into_new_category(self, now: chrono::NaiveDateTime) -> NewCategory {
        NewCategory {
            slug: Slug::from_name(self.name.as_str()),
            name: self.name,
            visible: self.visible,
            sort: self.sort,
            keywords: self.keywords,
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Error shared by the category add and update forms.
#[derive(Debug, Error)]
pub enum CategoryFormError {
    #[error("Category form validation failed: {0}")]
    Validation(String),
    #[error("Category form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for CategoryFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for CategoryFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<AddCategoryForm> for AddCategoryFormPayload {
    type Error = CategoryFormError;

    fn try_from(value: AddCategoryForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            name: CategoryName::new(value.name.trim())?,
            visible: value.visible,
            sort: value.sort,
            keywords: non_blank(value.keywords),
            description: non_blank(value.description),
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct UpdateCategoryForm {
    #[validate(range(min = 1))]
    pub category_id: i32,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub visible: bool,
    pub keywords: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCategoryFormPayload {
    pub category_id: CategoryId,
    pub update: CategoryUpdate,
}

impl TryFrom<UpdateCategoryForm> for UpdateCategoryFormPayload {
    type Error = CategoryFormError;

    fn try_from(value: UpdateCategoryForm) -> Result<Self, Self::Error> {
        value.validate()?;
        let name = CategoryName::new(value.name.trim())?;
        Ok(Self {
            category_id: CategoryId::new(value.category_id)?,
            update: CategoryUpdate {
                slug: Slug::from_name(name.as_str()),
                name,
                visible: value.visible,
                keywords: non_blank(value.keywords),
                description: non_blank(value.description),
            },
        })
    }
}

/// Sort position for a category or a forum.
#[derive(Deserialize, Validate)]
pub struct SortForm {
    #[validate(range(min = 1))]
    pub id: i32,
    pub sort: i32,
}

#[derive(Debug, Error)]
pub enum SortFormError {
    #[error("Sort form validation failed: {0}")]
    Validation(String),
}

impl From<ValidationErrors> for SortFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl SortForm {
    pub fn into_parts(self) -> Result<(i32, i32), SortFormError> {
        self.validate()?;
        Ok((self.id, self.sort))
    }
}
