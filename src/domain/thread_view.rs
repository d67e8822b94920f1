//! Per-member read tracking.
//!
//! A member's progress through a thread is two watermarks: the creation time
//! of the newest post seen and the newest creation-or-edit time seen. A
//! missing row means the member never opened the thread.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::post::Post;
use crate::domain::thread::Thread;
use crate::domain::types::{ThreadId, UserId};

/// Stored read state of one member for one thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadView {
    pub id: i32,
    pub user_id: UserId,
    pub thread_id: ThreadId,
    pub new_last_seen: NaiveDateTime,
    pub edited_last_seen: NaiveDateTime,
}

impl ThreadView {
    pub fn watermarks(&self) -> Watermarks {
        Watermarks {
            new_last_seen: self.new_last_seen,
            edited_last_seen: self.edited_last_seen,
        }
    }
}

/// Pair of read timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermarks {
    pub new_last_seen: NaiveDateTime,
    pub edited_last_seen: NaiveDateTime,
}

impl Watermarks {
    pub fn both(at: NaiveDateTime) -> Self {
        Self {
            new_last_seen: at,
            edited_last_seen: at,
        }
    }
}

/// Change to apply after a member has seen a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeenUpdate {
    /// First visit: insert a row with these watermarks.
    Create(Watermarks),
    /// At least one watermark lagged behind the post.
    Advance(Watermarks),
    /// Nothing new was seen.
    Unchanged,
}

impl SeenUpdate {
    /// Every update except [`SeenUpdate::Unchanged`] counts as one view,
    /// no matter how many watermarks moved.
    pub fn counts_as_view(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Decides how the member's watermarks move after seeing `post`.
pub fn plan_mark_seen(current: Option<Watermarks>, post: &Post) -> SeenUpdate {
    let last_change = post.last_change();
    let Some(current) = current else {
        return SeenUpdate::Create(Watermarks {
            new_last_seen: post.created_at,
            edited_last_seen: last_change,
        });
    };

    if post.edited {
        let edited_at = post.edited_at.unwrap_or(last_change);
        if current.edited_last_seen < edited_at {
            return SeenUpdate::Advance(Watermarks {
                new_last_seen: current.new_last_seen,
                edited_last_seen: edited_at,
            });
        }
        return SeenUpdate::Unchanged;
    }

    let mut next = current;
    if next.new_last_seen < post.created_at {
        next.new_last_seen = post.created_at;
    }
    if next.edited_last_seen < last_change {
        next.edited_last_seen = last_change;
    }
    if next == current {
        SeenUpdate::Unchanged
    } else {
        SeenUpdate::Advance(next)
    }
}

/// A thread is unread when never viewed or when either watermark is stale.
pub fn is_unread(current: Option<Watermarks>, thread: &Thread) -> bool {
    match current {
        None => true,
        Some(w) => w.new_last_seen < thread.new_post_at || w.edited_last_seen < thread.edited_post_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ForumId, PostContent, PostId, VoteCount};
    use chrono::DateTime;

    fn at(secs: i64) -> NaiveDateTime {
        DateTime::from_timestamp(secs, 0).unwrap().naive_utc()
    }

    fn post(created: i64, edited: Option<i64>) -> Post {
        Post {
            id: PostId::new(1).unwrap(),
            thread_id: ThreadId::new(1).unwrap(),
            forum_id: ForumId::new(1).unwrap(),
            author_id: UserId::new(1).unwrap(),
            content: PostContent::new("content of the post").unwrap(),
            likes: VoteCount::default(),
            dislikes: VoteCount::default(),
            edited: edited.is_some(),
            edited_at: edited.map(at),
            created_at: at(created),
            updated_at: at(created),
        }
    }

    #[test]
    fn first_visit_creates_row() {
        let update = plan_mark_seen(None, &post(100, Some(150)));
        assert_eq!(
            update,
            SeenUpdate::Create(Watermarks {
                new_last_seen: at(100),
                edited_last_seen: at(150),
            })
        );
        assert!(update.counts_as_view());
    }

    #[test]
    fn edited_post_only_moves_edited_watermark() {
        let current = Watermarks {
            new_last_seen: at(50),
            edited_last_seen: at(60),
        };
        let update = plan_mark_seen(Some(current), &post(100, Some(150)));
        assert_eq!(
            update,
            SeenUpdate::Advance(Watermarks {
                new_last_seen: at(50),
                edited_last_seen: at(150),
            })
        );
    }

    #[test]
    fn new_post_moves_lagging_watermarks() {
        let current = Watermarks {
            new_last_seen: at(50),
            edited_last_seen: at(200),
        };
        let update = plan_mark_seen(Some(current), &post(100, None));
        assert_eq!(
            update,
            SeenUpdate::Advance(Watermarks {
                new_last_seen: at(100),
                edited_last_seen: at(200),
            })
        );
    }

    #[test]
    fn marking_twice_is_idempotent() {
        let p = post(100, None);
        let SeenUpdate::Create(first) = plan_mark_seen(None, &p) else {
            panic!("expected create");
        };
        assert_eq!(plan_mark_seen(Some(first), &p), SeenUpdate::Unchanged);

        let edited = post(100, Some(300));
        let SeenUpdate::Advance(second) = plan_mark_seen(Some(first), &edited) else {
            panic!("expected advance");
        };
        assert_eq!(plan_mark_seen(Some(second), &edited), SeenUpdate::Unchanged);
    }

    #[test]
    fn unread_when_never_seen_or_stale() {
        let thread = Thread {
            id: ThreadId::new(1).unwrap(),
            category_id: crate::domain::types::CategoryId::new(1).unwrap(),
            forum_id: ForumId::new(1).unwrap(),
            name: crate::domain::types::ThreadName::new("Topic").unwrap(),
            slug: crate::domain::types::Slug::from_name("Topic"),
            author_id: UserId::new(1).unwrap(),
            posts: crate::domain::types::PostCount::new(1).unwrap(),
            views: crate::domain::types::ViewCount::default(),
            pinned: false,
            locked: false,
            new_post_at: at(100),
            edited_post_at: at(200),
            created_at: at(100),
            updated_at: at(100),
        };
        assert!(is_unread(None, &thread));
        assert!(is_unread(Some(Watermarks::both(at(150))), &thread));
        assert!(!is_unread(Some(Watermarks::both(at(200))), &thread));
        assert!(is_unread(
            Some(Watermarks {
                new_last_seen: at(99),
                edited_last_seen: at(300),
            }),
            &thread
        ));
    }
}
