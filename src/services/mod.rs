use std::fmt::Display;

use chrono::{NaiveDateTime, Utc};

use crate::access::{AccessControl, Permission, PermissionContext};
use crate::cache::Cache;
use crate::domain::auth::AuthenticatedUser;
use crate::domain::types::UserId;
use crate::repository::errors::RepositoryError;

pub use self::errors::{ServiceError, ServiceResult};

pub mod admin;
pub mod errors;
pub mod posts;
pub mod search;
pub mod stats;
pub mod subscriptions;
pub mod threads;
pub mod views;
pub mod votes;

#[cfg(test)]
pub(crate) mod test_support;

/// Current time as stored in the database.
pub(crate) fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Resolve the signed-in member or fail with `Unauthenticated`.
pub(crate) fn require_user(user: Option<&AuthenticatedUser>) -> ServiceResult<UserId> {
    let user = user.ok_or(ServiceError::Unauthenticated)?;
    user.user_id().map_err(|e| {
        log::error!("Invalid user id in user context: {e}");
        ServiceError::Internal
    })
}

/// Run the capability check, distinguishing guests from members lacking
/// the permission.
pub(crate) fn authorize<A: AccessControl>(
    access: &A,
    user: Option<&AuthenticatedUser>,
    permission: Permission,
    context: PermissionContext<'_>,
) -> ServiceResult<()> {
    if access.can(user, permission, context) {
        return Ok(());
    }
    match user {
        None => Err(ServiceError::Unauthenticated),
        Some(_) => Err(ServiceError::Unauthorized),
    }
}

/// Map a repository failure, logging the ones the caller cannot act on.
pub(crate) fn repository_failure(
    operation: &str,
    entity: impl Display,
    error: RepositoryError,
) -> ServiceError {
    match error {
        RepositoryError::NotFound => ServiceError::NotFound,
        RepositoryError::Conflict(message) => ServiceError::Conflict(message),
        other => {
            log::error!(target: "forum", "{operation} failed for {entity}: {other}");
            ServiceError::Internal
        }
    }
}

/// Post-commit cache invalidation. Failures are only logged.
pub(crate) struct Invalidation<'a, C: Cache> {
    cache: &'a C,
}

impl<'a, C: Cache> Invalidation<'a, C> {
    pub(crate) fn new(cache: &'a C) -> Self {
        Self { cache }
    }

    pub(crate) fn key(self, key: &str) -> Self {
        if let Err(e) = self.cache.delete(key) {
            log::warn!("Failed to invalidate cache key {key}: {e}");
        }
        self
    }

    pub(crate) fn element(self, key: &str, element: impl Display) -> Self {
        let element = element.to_string();
        if let Err(e) = self.cache.delete_element(key, &element) {
            log::warn!("Failed to invalidate cache element {key}/{element}: {e}");
        }
        self
    }
}
