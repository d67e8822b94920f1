use serde::{Deserialize, Serialize};

use crate::domain::types::{ThreadId, TypeConstraintError, UserId};

/// Whether the subscriber has seen the latest reply.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PostSeen {
    New,
    Seen,
}

impl PostSeen {
    /// Integer representation used in persistence.
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::New => 0,
            Self::Seen => 1,
        }
    }
}

impl TryFrom<i32> for PostSeen {
    type Error = TypeConstraintError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::New),
            1 => Ok(Self::Seen),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "subscription post_seen: {other}"
            ))),
        }
    }
}

/// A member watching a thread for replies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub id: i32,
    pub user_id: UserId,
    pub thread_id: ThreadId,
    pub post_seen: PostSeen,
}
