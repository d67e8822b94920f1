//! Fixtures shared by the service unit tests.

use crate::domain::auth::{ADMIN_ROLE, AuthenticatedUser, MEMBER_ROLE, MODERATOR_ROLE};
use crate::domain::types::{ForumId, PostContent, ThreadName, UserId};
use crate::forms::threads::CreateThreadFormPayload;

fn user(id: i32, role: &str) -> AuthenticatedUser {
    AuthenticatedUser {
        sub: id.to_string(),
        email: format!("user{id}@example.com"),
        name: format!("User {id}"),
        roles: vec![role.to_string()],
        exp: 0,
    }
}

pub fn member(id: i32) -> AuthenticatedUser {
    user(id, MEMBER_ROLE)
}

pub fn moderator(id: i32) -> AuthenticatedUser {
    user(id, MODERATOR_ROLE)
}

pub fn admin(id: i32) -> AuthenticatedUser {
    user(id, ADMIN_ROLE)
}

pub fn uid(id: i32) -> UserId {
    UserId::new(id).unwrap()
}

pub fn content(text: &str) -> PostContent {
    PostContent::new(text).unwrap()
}

pub fn new_thread(forum_id: ForumId, name: &str, body: &str) -> CreateThreadFormPayload {
    CreateThreadFormPayload {
        forum_id,
        name: ThreadName::new(name).unwrap(),
        content: content(body),
        subscribe: true,
    }
}
