use serde::{Deserialize, Serialize};

use crate::domain::types::{TypeConstraintError, UserId};

/// Role granting every administrative capability.
pub const ADMIN_ROLE: &str = "admin";
/// Role granting moderation of threads and posts.
pub const MODERATOR_ROLE: &str = "moderator";
/// Role held by every registered member able to post.
pub const MEMBER_ROLE: &str = "member";

/// Identity of the signed-in member as issued by the auth service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Subject claim, the member id in string form.
    pub sub: String,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
    pub exp: usize,
}

impl AuthenticatedUser {
    /// Parses the subject claim into a member id.
    pub fn user_id(&self) -> Result<UserId, TypeConstraintError> {
        let raw = self
            .sub
            .trim()
            .parse::<i32>()
            .map_err(|_| TypeConstraintError::InvalidValue(format!("user id: {}", self.sub)))?;
        UserId::new(raw)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
