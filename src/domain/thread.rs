use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    CategoryId, ForumId, PostContent, PostCount, PostId, Slug, ThreadId, ThreadName, UserId,
    ViewCount,
};

/// Discussion inside a forum. Always owns at least one post.
///
/// `category_id` mirrors the owning forum's category and must be rewritten
/// together with `forum_id` whenever the thread moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub category_id: CategoryId,
    pub forum_id: ForumId,
    pub name: ThreadName,
    pub slug: Slug,
    pub author_id: UserId,
    pub posts: PostCount,
    pub views: ViewCount,
    pub pinned: bool,
    pub locked: bool,
    /// Creation time of the newest post.
    pub new_post_at: NaiveDateTime,
    /// Time of the newest post creation or edit.
    pub edited_post_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Thread together with its first post, created as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct NewThread {
    pub forum_id: ForumId,
    pub name: ThreadName,
    pub author_id: UserId,
    pub content: PostContent,
    /// Subscribe the author to replies.
    pub subscribe: bool,
    pub created_at: NaiveDateTime,
}

/// Identifiers produced by a successful thread creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadCreated {
    pub thread_id: ThreadId,
    pub post_id: PostId,
}

/// Counter snapshot of a thread removed from the forum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadDeleted {
    pub thread_id: ThreadId,
    pub forum_id: ForumId,
    pub posts: PostCount,
}

/// Result of relocating a thread to another forum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadMoved {
    pub thread_id: ThreadId,
    pub from_forum: ForumId,
    pub to_forum: ForumId,
    pub posts: PostCount,
}
