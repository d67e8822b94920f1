//! Like/dislike ledger rules and the per-member vote rate window.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{PostId, TypeConstraintError, UserId, VoteCount};

/// A member's vote on a post.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Thumb {
    Up,
    Down,
}

impl Thumb {
    /// Integer representation used in persistence.
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl TryFrom<i32> for Thumb {
    type Error = TypeConstraintError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            other => Err(TypeConstraintError::InvalidValue(format!("thumb: {other}"))),
        }
    }
}

impl TryFrom<&str> for Thumb {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(TypeConstraintError::InvalidValue(format!("thumb: {other}"))),
        }
    }
}

/// Stored vote of one member on one post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostThumb {
    pub id: i32,
    pub user_id: UserId,
    pub post_id: PostId,
    pub thumb: Thumb,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Post counters after a vote.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteTally {
    pub likes: VoteCount,
    pub dislikes: VoteCount,
}

impl VoteTally {
    pub fn score(self) -> i32 {
        self.likes.get() - self.dislikes.get()
    }
}

/// Ledger change implied by a vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteChange {
    /// Thumb to store, `None` when nothing changes.
    pub store: Option<Thumb>,
    pub likes_delta: i32,
    pub dislikes_delta: i32,
}

impl VoteChange {
    const NONE: Self = Self {
        store: None,
        likes_delta: 0,
        dislikes_delta: 0,
    };

    pub fn is_noop(self) -> bool {
        self.store.is_none()
    }
}

/// Computes the thumb and counter deltas for `requested` given the prior vote.
/// Repeating the current vote changes nothing.
pub fn plan_vote(prior: Option<Thumb>, requested: Thumb) -> VoteChange {
    match (prior, requested) {
        (None, Thumb::Up) => VoteChange {
            store: Some(Thumb::Up),
            likes_delta: 1,
            dislikes_delta: 0,
        },
        (None, Thumb::Down) => VoteChange {
            store: Some(Thumb::Down),
            likes_delta: 0,
            dislikes_delta: 1,
        },
        (Some(Thumb::Up), Thumb::Down) => VoteChange {
            store: Some(Thumb::Down),
            likes_delta: -1,
            dislikes_delta: 1,
        },
        (Some(Thumb::Down), Thumb::Up) => VoteChange {
            store: Some(Thumb::Up),
            likes_delta: 1,
            dislikes_delta: -1,
        },
        (Some(_), _) => VoteChange::NONE,
    }
}

/// Rolling vote allowance of a member, kept in the cache.
///
/// Expiry is lazy: an elapsed window is only discarded when the next vote
/// arrives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteWindow {
    pub count: u32,
    /// Unix timestamp after which the window resets.
    pub expire: i64,
}

impl VoteWindow {
    /// Returns the window in force at `now`, dropping an elapsed one.
    pub fn current(stored: Option<Self>, now: i64) -> Option<Self> {
        stored.filter(|window| window.expire >= now)
    }

    /// Records one more vote, opening a new window when none is active.
    pub fn record(current: Option<Self>, now: i64, window_secs: i64) -> Self {
        match current {
            Some(window) => Self {
                count: window.count + 1,
                expire: window.expire,
            },
            None => Self {
                count: 1,
                expire: now + window_secs,
            },
        }
    }

    pub fn is_exhausted(self, max_votes: u32) -> bool {
        self.count >= max_votes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_votes_create_thumbs() {
        let up = plan_vote(None, Thumb::Up);
        assert_eq!((up.store, up.likes_delta, up.dislikes_delta), (Some(Thumb::Up), 1, 0));
        let down = plan_vote(None, Thumb::Down);
        assert_eq!(
            (down.store, down.likes_delta, down.dislikes_delta),
            (Some(Thumb::Down), 0, 1)
        );
    }

    #[test]
    fn switching_moves_both_counters() {
        let change = plan_vote(Some(Thumb::Up), Thumb::Down);
        assert_eq!((change.likes_delta, change.dislikes_delta), (-1, 1));
        let change = plan_vote(Some(Thumb::Down), Thumb::Up);
        assert_eq!((change.likes_delta, change.dislikes_delta), (1, -1));
    }

    #[test]
    fn repeating_a_vote_is_noop() {
        assert!(plan_vote(Some(Thumb::Up), Thumb::Up).is_noop());
        assert!(plan_vote(Some(Thumb::Down), Thumb::Down).is_noop());
    }

    #[test]
    fn parses_thumb_directions() {
        assert_eq!(Thumb::try_from("up").unwrap(), Thumb::Up);
        assert_eq!(Thumb::try_from(-1).unwrap(), Thumb::Down);
        assert!(Thumb::try_from("sideways").is_err());
        assert!(Thumb::try_from(0).is_err());
    }

    #[test]
    fn window_expires_lazily() {
        let stored = VoteWindow {
            count: 10,
            expire: 1_000,
        };
        assert_eq!(VoteWindow::current(Some(stored), 1_000), Some(stored));
        assert_eq!(VoteWindow::current(Some(stored), 1_001), None);
        let fresh = VoteWindow::record(None, 2_000, 3_600);
        assert_eq!(fresh, VoteWindow { count: 1, expire: 5_600 });
        assert!(stored.is_exhausted(10));
        assert!(!fresh.is_exhausted(10));
    }
}
