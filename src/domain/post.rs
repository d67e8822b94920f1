use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    ForumId, PostContent, PostCount, PostId, ThreadId, ThreadName, UserId, VoteCount,
};

/// Markup inserted between merged consecutive replies of one author.
pub const POST_MERGE_SEPARATOR: &str = "<hr>";

/// Single message inside a thread.
///
/// `forum_id` mirrors the owning thread's forum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub thread_id: ThreadId,
    pub forum_id: ForumId,
    pub author_id: UserId,
    pub content: PostContent,
    pub likes: VoteCount,
    pub dislikes: VoteCount,
    pub edited: bool,
    pub edited_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Post {
    /// Most recent moment the content changed: creation or last edit.
    pub fn last_change(&self) -> NaiveDateTime {
        match self.edited_at {
            Some(edited_at) => self.created_at.max(edited_at),
            None => self.created_at,
        }
    }
}

/// Which validation rules apply to a post being written.
///
/// The first post of a thread carries the thread's topic; every later post
/// only carries content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    FirstPost,
    Reply,
}

/// Reply submitted to an existing thread.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReply {
    pub thread_id: ThreadId,
    pub author_id: UserId,
    pub content: PostContent,
    pub subscribe: bool,
    pub created_at: NaiveDateTime,
}

/// What a reply turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// A new post row was inserted.
    Created(PostId),
    /// The content was appended to the author's own latest post.
    Merged(PostId),
}

impl ReplyOutcome {
    pub fn post_id(self) -> PostId {
        match self {
            Self::Created(id) | Self::Merged(id) => id,
        }
    }
}

/// Appends `addition` to `previous` using [`POST_MERGE_SEPARATOR`].
pub fn merge_content(previous: &str, addition: &str) -> String {
    let mut merged =
        String::with_capacity(previous.len() + POST_MERGE_SEPARATOR.len() + addition.len());
    merged.push_str(previous);
    merged.push_str(POST_MERGE_SEPARATOR);
    merged.push_str(addition);
    merged
}

/// New content for an existing post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostEdit {
    pub post_id: PostId,
    pub content: PostContent,
    /// New thread topic; only present when editing a first post.
    pub topic: Option<ThreadName>,
    pub edited_at: NaiveDateTime,
}

/// Result of deleting one or more posts of a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostsDeleted {
    pub thread_id: ThreadId,
    pub forum_id: ForumId,
    pub deleted: PostCount,
    /// The thread lost its last post and was removed too.
    pub thread_deleted: bool,
}

/// Where selected posts are moved to.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveDestination {
    Existing(ThreadId),
    NewThread {
        name: ThreadName,
        forum_id: ForumId,
        author_id: UserId,
    },
}

/// Request to move posts out of `source`.
#[derive(Debug, Clone, PartialEq)]
pub struct PostsMove {
    pub source: ThreadId,
    pub post_ids: Vec<PostId>,
    pub destination: MoveDestination,
    pub moved_at: NaiveDateTime,
}

/// Result of moving posts between threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostsMoved {
    pub source: ThreadId,
    pub source_forum: ForumId,
    pub destination: ThreadId,
    pub destination_forum: ForumId,
    pub moved: PostCount,
    pub source_deleted: bool,
}

/// Compact description of a recent post, safe to cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatestPost {
    pub id: PostId,
    pub thread_id: ThreadId,
    pub title: String,
    pub author_id: UserId,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn merge_joins_with_separator() {
        assert_eq!(merge_content("first", "more"), "first<hr>more");
    }

    #[test]
    fn last_change_prefers_later_edit() {
        let created = DateTime::from_timestamp(100, 0).unwrap().naive_utc();
        let edited = DateTime::from_timestamp(200, 0).unwrap().naive_utc();
        let mut post = Post {
            id: PostId::new(1).unwrap(),
            thread_id: ThreadId::new(1).unwrap(),
            forum_id: ForumId::new(1).unwrap(),
            author_id: UserId::new(1).unwrap(),
            content: PostContent::new("some content here").unwrap(),
            likes: VoteCount::default(),
            dislikes: VoteCount::default(),
            edited: false,
            edited_at: None,
            created_at: created,
            updated_at: created,
        };
        assert_eq!(post.last_change(), created);
        post.edited_at = Some(edited);
        assert_eq!(post.last_change(), edited);
    }
}
