use chrono::NaiveDateTime;

use crate::db::{DbConnection, DbPool};
use crate::domain::category::{Category, CategoryUpdate, NewCategory};
use crate::domain::forum::{Forum, ForumUpdate, NewForum};
use crate::domain::post::{
    LatestPost, NewReply, Post, PostEdit, PostsDeleted, PostsMove, PostsMoved, ReplyOutcome,
};
use crate::domain::subscription::Subscription;
use crate::domain::thread::{NewThread, Thread, ThreadCreated, ThreadDeleted, ThreadMoved};
use crate::domain::thread_view::{SeenUpdate, ThreadView};
use crate::domain::types::{CategoryId, ForumId, PostId, ThreadId, UserId};
use crate::domain::vote::{PostThumb, Thumb, VoteTally};

use self::errors::RepositoryResult;

pub mod category;
pub mod counters;
pub mod errors;
pub mod forum;
pub mod maintenance;
pub mod post;
pub mod subscription;
pub mod thread;
pub mod thread_view;
pub mod vocabulary;
pub mod vote;

/// Default page size for listings.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 20;

/// Page selection for listing queries. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    pub(crate) fn offset(self) -> i64 {
        ((self.page.max(1) - 1) * self.per_page) as i64
    }

    pub(crate) fn limit(self) -> i64 {
        self.per_page as i64
    }
}

/// Repository implementation backed by Diesel and SQLite.
///
/// The underlying `r2d2::Pool` is cheap to clone, allowing the repository to
/// be passed around freely between handlers.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository from an established database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a pooled database connection.
    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Query parameters for listing categories.
#[derive(Debug, Clone, Default)]
pub struct CategoryListQuery {
    /// Hide categories flagged invisible (guest view).
    pub visible_only: bool,
    pub pagination: Option<Pagination>,
}

impl CategoryListQuery {
    pub fn visible_only(mut self) -> Self {
        self.visible_only = true;
        self
    }
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Query parameters for listing forums.
#[derive(Debug, Clone, Default)]
pub struct ForumListQuery {
    pub category_id: Option<CategoryId>,
    pub visible_only: bool,
    pub pagination: Option<Pagination>,
}

impl ForumListQuery {
    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }
    pub fn visible_only(mut self) -> Self {
        self.visible_only = true;
        self
    }
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Query parameters for listing threads.
#[derive(Debug, Clone, Default)]
pub struct ThreadListQuery {
    pub forum_id: Option<ForumId>,
    pub author_id: Option<UserId>,
    pub pagination: Option<Pagination>,
}

impl ThreadListQuery {
    pub fn forum(mut self, forum_id: ForumId) -> Self {
        self.forum_id = Some(forum_id);
        self
    }
    pub fn author(mut self, author_id: UserId) -> Self {
        self.author_id = Some(author_id);
        self
    }
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Query parameters for listing posts.
#[derive(Debug, Clone, Default)]
pub struct PostListQuery {
    pub thread_id: Option<ThreadId>,
    pub author_id: Option<UserId>,
    /// Only posts in visible forums of visible categories.
    pub visible_only: bool,
    pub pagination: Option<Pagination>,
}

impl PostListQuery {
    pub fn thread(mut self, thread_id: ThreadId) -> Self {
        self.thread_id = Some(thread_id);
        self
    }
    pub fn author(mut self, author_id: UserId) -> Self {
        self.author_id = Some(author_id);
        self
    }
    pub fn visible_only(mut self) -> Self {
        self.visible_only = true;
        self
    }
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Query parameters for vocabulary search.
#[derive(Debug, Clone, Default)]
pub struct PostSearchQuery {
    /// Index words; a post matches when linked to any of them.
    pub words: Vec<String>,
    pub visible_only: bool,
    pub pagination: Option<Pagination>,
}

impl PostSearchQuery {
    pub fn new(words: Vec<String>) -> Self {
        Self {
            words,
            ..Self::default()
        }
    }
    pub fn visible_only(mut self) -> Self {
        self.visible_only = true;
        self
    }
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Query parameters for the unread-threads listing of one member.
#[derive(Debug, Clone)]
pub struct UnreadThreadsQuery {
    pub user_id: UserId,
    pub pagination: Option<Pagination>,
}

impl UnreadThreadsQuery {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            pagination: None,
        }
    }
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Read-only operations for category entities.
pub trait CategoryReader {
    /// List categories ordered by sort position.
    fn list_categories(&self, query: CategoryListQuery)
    -> RepositoryResult<(usize, Vec<Category>)>;
    fn get_category_by_id(&self, id: CategoryId) -> RepositoryResult<Option<Category>>;
}

/// Write operations for category entities.
pub trait CategoryWriter {
    fn create_category(&self, category: &NewCategory) -> RepositoryResult<Category>;
    fn update_category(&self, id: CategoryId, update: &CategoryUpdate) -> RepositoryResult<usize>;
    fn set_category_sort(&self, id: CategoryId, sort: i32) -> RepositoryResult<usize>;
    /// Delete a category with all of its forums, threads and posts.
    fn delete_category(&self, id: CategoryId) -> RepositoryResult<usize>;
}

/// Read-only operations for forum entities.
pub trait ForumReader {
    /// List forums ordered by sort position.
    fn list_forums(&self, query: ForumListQuery) -> RepositoryResult<(usize, Vec<Forum>)>;
    fn get_forum_by_id(&self, id: ForumId) -> RepositoryResult<Option<Forum>>;
}

/// Write operations for forum entities.
pub trait ForumWriter {
    fn create_forum(&self, forum: &NewForum) -> RepositoryResult<Forum>;
    fn update_forum(&self, id: ForumId, update: &ForumUpdate) -> RepositoryResult<usize>;
    fn set_forum_sort(&self, id: ForumId, sort: i32) -> RepositoryResult<usize>;
    /// Delete a forum with all of its threads and posts.
    fn delete_forum(&self, id: ForumId) -> RepositoryResult<usize>;
}

/// Read-only operations for thread entities.
pub trait ThreadReader {
    /// List threads, pinned first, then by latest activity.
    fn list_threads(&self, query: ThreadListQuery) -> RepositoryResult<(usize, Vec<Thread>)>;
    fn get_thread_by_id(&self, id: ThreadId) -> RepositoryResult<Option<Thread>>;
    /// Count threads, optionally only those started by `author`.
    fn count_threads(&self, author: Option<UserId>) -> RepositoryResult<usize>;
}

/// Thread life-cycle mutations. Every method is one transaction.
pub trait ThreadWriter {
    /// Insert a thread with its first post.
    fn create_thread(&self, thread: &NewThread) -> RepositoryResult<ThreadCreated>;
    fn set_thread_locked(&self, id: ThreadId, locked: bool) -> RepositoryResult<usize>;
    fn set_thread_pinned(&self, id: ThreadId, pinned: bool) -> RepositoryResult<usize>;
    /// Relocate a thread and all of its posts to `target`.
    fn move_thread(&self, id: ThreadId, target: ForumId) -> RepositoryResult<ThreadMoved>;
    /// Delete a thread and everything attached to it.
    fn delete_thread(&self, id: ThreadId) -> RepositoryResult<ThreadDeleted>;
}

/// Read-only operations for post entities.
pub trait PostReader {
    /// List posts in ascending id order.
    fn list_posts(&self, query: PostListQuery) -> RepositoryResult<(usize, Vec<Post>)>;
    fn get_post_by_id(&self, id: PostId) -> RepositoryResult<Option<Post>>;
    /// The lowest-id post of a thread.
    fn get_first_post(&self, thread_id: ThreadId) -> RepositoryResult<Option<Post>>;
    /// Count posts, optionally only those written by `author`.
    fn count_posts(&self, author: Option<UserId>) -> RepositoryResult<usize>;
    /// Newest posts first.
    fn list_latest_posts(&self, limit: i64, visible_only: bool)
    -> RepositoryResult<Vec<LatestPost>>;
    /// Posts linked to any of the query words, newest first.
    fn search_posts(&self, query: PostSearchQuery) -> RepositoryResult<(usize, Vec<Post>)>;
}

/// Post mutations. Every method is one transaction.
pub trait PostWriter {
    /// Append a reply, merging it into the author's own latest post when the
    /// thread's latest post is theirs.
    fn create_reply(&self, reply: &NewReply) -> RepositoryResult<ReplyOutcome>;
    fn edit_post(&self, edit: &PostEdit) -> RepositoryResult<usize>;
    /// Delete posts of one thread, removing the thread when it empties.
    fn delete_posts(&self, thread_id: ThreadId, post_ids: &[PostId])
    -> RepositoryResult<PostsDeleted>;
    fn move_posts(&self, request: &PostsMove) -> RepositoryResult<PostsMoved>;
}

/// Read state of members.
pub trait ThreadViewReader {
    fn get_thread_view(
        &self,
        user_id: UserId,
        thread_id: ThreadId,
    ) -> RepositoryResult<Option<ThreadView>>;
    /// Threads never opened or with stale watermarks, oldest activity first.
    fn list_unread_threads(&self, query: UnreadThreadsQuery)
    -> RepositoryResult<(usize, Vec<Thread>)>;
}

/// Watermark updates.
pub trait ThreadViewWriter {
    /// Record that `user_id` has seen `post_id`.
    fn mark_post_seen(&self, user_id: UserId, post_id: PostId) -> RepositoryResult<SeenUpdate>;
    /// Move every watermark of `user_id` to `now`. Returns touched threads.
    fn mark_all_seen(&self, user_id: UserId, now: NaiveDateTime) -> RepositoryResult<usize>;
}

pub trait SubscriptionReader {
    fn get_subscription(
        &self,
        user_id: UserId,
        thread_id: ThreadId,
    ) -> RepositoryResult<Option<Subscription>>;
    fn list_subscriptions(&self, user_id: UserId) -> RepositoryResult<Vec<Subscription>>;
}

pub trait SubscriptionWriter {
    /// Returns `false` when the subscription already existed.
    fn subscribe(&self, user_id: UserId, thread_id: ThreadId) -> RepositoryResult<bool>;
    fn unsubscribe(&self, user_id: UserId, thread_id: ThreadId) -> RepositoryResult<usize>;
    /// Flag every subscription of the thread except `except`'s as having a
    /// new post.
    fn notify_subscribers(&self, thread_id: ThreadId, except: UserId) -> RepositoryResult<usize>;
}

pub trait VoteReader {
    fn get_thumb(&self, user_id: UserId, post_id: PostId) -> RepositoryResult<Option<PostThumb>>;
}

pub trait VoteWriter {
    /// Apply a vote and return the post's resulting counters.
    fn cast_vote(
        &self,
        user_id: UserId,
        post_id: PostId,
        thumb: Thumb,
        at: NaiveDateTime,
    ) -> RepositoryResult<VoteTally>;
}

/// Repair of denormalized counters.
pub trait CounterMaintenance {
    /// Recompute forum and thread counters from primary rows.
    fn recount_counters(&self) -> RepositoryResult<usize>;
}
