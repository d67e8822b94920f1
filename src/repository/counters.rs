//! Denormalized counters on forums, threads and posts.
//!
//! Every change is a single `column = column + delta` statement so concurrent
//! writers never lose increments.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::domain::types::{ForumId, PostId, ThreadId};
use crate::schema::{forums, posts, threads};

/// A single counter column of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    ForumThreads(ForumId),
    ForumPosts(ForumId),
    ThreadPosts(ThreadId),
    ThreadViews(ThreadId),
    PostLikes(PostId),
    PostDislikes(PostId),
}

/// Add `delta` to the counter. A zero delta issues no statement.
pub fn adjust(conn: &mut SqliteConnection, counter: Counter, delta: i32) -> QueryResult<usize> {
    if delta == 0 {
        return Ok(0);
    }
    match counter {
        Counter::ForumThreads(id) => diesel::update(forums::table.find(id.get()))
            .set(forums::threads.eq(forums::threads + delta))
            .execute(conn),
        Counter::ForumPosts(id) => diesel::update(forums::table.find(id.get()))
            .set(forums::posts.eq(forums::posts + delta))
            .execute(conn),
        Counter::ThreadPosts(id) => diesel::update(threads::table.find(id.get()))
            .set(threads::posts.eq(threads::posts + delta))
            .execute(conn),
        Counter::ThreadViews(id) => diesel::update(threads::table.find(id.get()))
            .set(threads::views.eq(threads::views + delta))
            .execute(conn),
        Counter::PostLikes(id) => diesel::update(posts::table.find(id.get()))
            .set(posts::likes.eq(posts::likes + delta))
            .execute(conn),
        Counter::PostDislikes(id) => diesel::update(posts::table.find(id.get()))
            .set(posts::dislikes.eq(posts::dislikes + delta))
            .execute(conn),
    }
}

/// Adjust both forum counters in one statement.
pub fn adjust_forum(
    conn: &mut SqliteConnection,
    id: ForumId,
    threads_delta: i32,
    posts_delta: i32,
) -> QueryResult<usize> {
    match (threads_delta, posts_delta) {
        (0, 0) => Ok(0),
        (t, 0) => adjust(conn, Counter::ForumThreads(id), t),
        (0, p) => adjust(conn, Counter::ForumPosts(id), p),
        (t, p) => diesel::update(forums::table.find(id.get()))
            .set((
                forums::threads.eq(forums::threads + t),
                forums::posts.eq(forums::posts + p),
            ))
            .execute(conn),
    }
}

/// Point the forum at its newest remaining post, or at nothing.
pub fn refresh_latest_post(conn: &mut SqliteConnection, id: ForumId) -> QueryResult<usize> {
    let latest = posts::table
        .filter(posts::forum_id.eq(id.get()))
        .select(diesel::dsl::max(posts::id))
        .first::<Option<i32>>(conn)?;

    diesel::update(forums::table.find(id.get()))
        .set(forums::latest_post_id.eq(latest))
        .execute(conn)
}
