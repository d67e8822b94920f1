//! Capability checks consumed before every mutating operation.

use crate::domain::auth::{ADMIN_ROLE, AuthenticatedUser, MEMBER_ROLE, MODERATOR_ROLE};
use crate::domain::post::Post;
use crate::domain::thread::Thread;

/// Named capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    CreateThread,
    CreatePost,
    UpdatePost,
    /// Granted through the author rule.
    UpdateOwnPost,
    DeletePost,
    /// Granted through the author rule.
    DeleteOwnPost,
    UpdateThread,
    DeleteThread,
    LockThread,
    PinThread,
    MoveThread,
    MovePost,
    Vote,
    /// Category and forum administration.
    ManageForum,
}

/// Entity the capability is checked against.
#[derive(Debug, Clone, Copy)]
pub enum PermissionContext<'a> {
    None,
    Thread(&'a Thread),
    Post(&'a Post),
}

/// Capability check provided by the host application.
pub trait AccessControl {
    /// `user` is `None` for guests.
    fn can(
        &self,
        user: Option<&AuthenticatedUser>,
        permission: Permission,
        context: PermissionContext<'_>,
    ) -> bool;
}

/// Role-based rules: admins may do everything, moderators everything except
/// administration, members may write and manage their own posts.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAccessControl;

impl RoleAccessControl {
    fn is_author(user: &AuthenticatedUser, context: PermissionContext<'_>) -> bool {
        let PermissionContext::Post(post) = context else {
            return false;
        };
        user.user_id()
            .map(|id| id == post.author_id)
            .unwrap_or(false)
    }
}

impl AccessControl for RoleAccessControl {
    fn can(
        &self,
        user: Option<&AuthenticatedUser>,
        permission: Permission,
        context: PermissionContext<'_>,
    ) -> bool {
        let Some(user) = user else {
            return false;
        };
        if user.has_role(ADMIN_ROLE) {
            return true;
        }
        if user.has_role(MODERATOR_ROLE) {
            return permission != Permission::ManageForum;
        }
        if !user.has_role(MEMBER_ROLE) {
            return false;
        }
        match permission {
            Permission::CreateThread | Permission::CreatePost | Permission::Vote => true,
            Permission::UpdateOwnPost | Permission::DeleteOwnPost => {
                Self::is_author(user, context)
            }
            _ => false,
        }
    }
}
