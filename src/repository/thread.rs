use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::domain::subscription::PostSeen;
use crate::domain::thread::{NewThread, Thread, ThreadCreated, ThreadDeleted, ThreadMoved};
use crate::domain::types::{ForumId, PostCount, PostId, Slug, ThreadId, UserId};
use crate::models::forum::Forum as DbForum;
use crate::models::post::NewPost as DbNewPost;
use crate::models::subscription::NewSubscription as DbNewSubscription;
use crate::models::thread::{NewThread as DbNewThread, Thread as DbThread};
use crate::repository::counters::{self, Counter};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::vocabulary;
use crate::repository::{DieselRepository, ThreadListQuery, ThreadReader, ThreadWriter};

pub(crate) fn load_thread(conn: &mut SqliteConnection, id: i32) -> RepositoryResult<DbThread> {
    use crate::schema::threads;

    threads::table
        .find(id)
        .first::<DbThread>(conn)
        .optional()?
        .ok_or(RepositoryError::NotFound)
}

pub(crate) fn load_forum(conn: &mut SqliteConnection, id: i32) -> RepositoryResult<DbForum> {
    use crate::schema::forums;

    forums::table
        .find(id)
        .first::<DbForum>(conn)
        .optional()?
        .ok_or(RepositoryError::NotFound)
}

/// Insert a thread row with zero counters and bump the forum's thread count.
pub(crate) fn insert_thread(
    conn: &mut SqliteConnection,
    forum: &DbForum,
    name: &str,
    author_id: i32,
    at: NaiveDateTime,
) -> RepositoryResult<i32> {
    use crate::schema::threads;

    let slug = Slug::from_name(name);
    let thread_id = diesel::insert_into(threads::table)
        .values(DbNewThread {
            category_id: forum.category_id,
            forum_id: forum.id,
            name,
            slug: slug.as_str(),
            author_id,
            posts: 0,
            views: 0,
            new_post_at: at,
            edited_post_at: at,
            created_at: at,
            updated_at: at,
        })
        .returning(threads::id)
        .get_result::<i32>(conn)?;

    counters::adjust(conn, Counter::ForumThreads(ForumId::new(forum.id)?), 1)?;
    Ok(thread_id)
}

/// Append a post to a thread, index it and move every pointer that tracks
/// the newest post.
pub(crate) fn append_post(
    conn: &mut SqliteConnection,
    thread: &DbThread,
    author_id: i32,
    content: &str,
    at: NaiveDateTime,
) -> RepositoryResult<i32> {
    use crate::schema::{forums, posts, threads};

    let post_id = diesel::insert_into(posts::table)
        .values(DbNewPost {
            thread_id: thread.id,
            forum_id: thread.forum_id,
            author_id,
            content,
            likes: 0,
            dislikes: 0,
            created_at: at,
            updated_at: at,
        })
        .returning(posts::id)
        .get_result::<i32>(conn)?;

    vocabulary::index_post_words(conn, post_id, content)?;

    counters::adjust(conn, Counter::ThreadPosts(ThreadId::new(thread.id)?), 1)?;
    counters::adjust(conn, Counter::ForumPosts(ForumId::new(thread.forum_id)?), 1)?;

    diesel::update(threads::table.find(thread.id))
        .set((
            threads::new_post_at.eq(at),
            threads::edited_post_at.eq(at),
            threads::updated_at.eq(at),
        ))
        .execute(conn)?;

    diesel::update(forums::table.find(thread.forum_id))
        .set(forums::latest_post_id.eq(Some(post_id)))
        .execute(conn)?;

    Ok(post_id)
}

/// Subscribe without touching an existing subscription.
pub(crate) fn ensure_subscription(
    conn: &mut SqliteConnection,
    user_id: i32,
    thread_id: i32,
) -> RepositoryResult<usize> {
    use crate::schema::subscriptions;

    let affected = diesel::insert_or_ignore_into(subscriptions::table)
        .values(DbNewSubscription {
            user_id,
            thread_id,
            post_seen: PostSeen::Seen.as_i32(),
        })
        .execute(conn)?;
    Ok(affected)
}

/// Remove threads together with their posts and per-member state.
/// Counters are left to the caller.
pub(crate) fn purge_threads(conn: &mut SqliteConnection, thread_ids: &[i32]) -> RepositoryResult<usize> {
    use crate::schema::{post_thumbs, posts, subscriptions, thread_views, threads};

    let post_ids: Vec<i32> = posts::table
        .filter(posts::thread_id.eq_any(thread_ids))
        .select(posts::id)
        .load(conn)?;

    vocabulary::unlink_posts(conn, &post_ids)?;
    diesel::delete(post_thumbs::table.filter(post_thumbs::post_id.eq_any(&post_ids))).execute(conn)?;
    diesel::delete(posts::table.filter(posts::id.eq_any(&post_ids))).execute(conn)?;
    diesel::delete(thread_views::table.filter(thread_views::thread_id.eq_any(thread_ids)))
        .execute(conn)?;
    diesel::delete(subscriptions::table.filter(subscriptions::thread_id.eq_any(thread_ids)))
        .execute(conn)?;

    let affected =
        diesel::delete(threads::table.filter(threads::id.eq_any(thread_ids))).execute(conn)?;
    Ok(affected)
}

impl ThreadReader for DieselRepository {
    fn list_threads(&self, query: ThreadListQuery) -> RepositoryResult<(usize, Vec<Thread>)> {
        use crate::schema::threads;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = threads::table.into_boxed::<diesel::sqlite::Sqlite>();
            if let Some(forum_id) = query.forum_id {
                items = items.filter(threads::forum_id.eq(forum_id.get()));
            }
            if let Some(author_id) = query.author_id {
                items = items.filter(threads::author_id.eq(author_id.get()));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder();
        if let Some(pagination) = query.pagination {
            items = items.offset(pagination.offset()).limit(pagination.limit());
        }

        let items = items
            .order((
                threads::pinned.desc(),
                threads::new_post_at.desc(),
                threads::id.desc(),
            ))
            .load::<DbThread>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Thread>, _>>()?;

        Ok((total, items))
    }

    fn get_thread_by_id(&self, id: ThreadId) -> RepositoryResult<Option<Thread>> {
        use crate::schema::threads;

        let mut conn = self.conn()?;

        let thread = threads::table
            .find(id.get())
            .first::<DbThread>(&mut conn)
            .optional()?;

        Ok(thread.map(TryInto::try_into).transpose()?)
    }

    fn count_threads(&self, author: Option<UserId>) -> RepositoryResult<usize> {
        use crate::schema::threads;

        let mut conn = self.conn()?;

        let mut query = threads::table.into_boxed::<diesel::sqlite::Sqlite>();
        if let Some(author) = author {
            query = query.filter(threads::author_id.eq(author.get()));
        }
        let total = query.count().get_result::<i64>(&mut conn)?;
        Ok(total as usize)
    }
}

impl ThreadWriter for DieselRepository {
    fn create_thread(&self, thread: &NewThread) -> RepositoryResult<ThreadCreated> {
        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            let forum = load_forum(conn, thread.forum_id.get())?;
            let author_id = thread.author_id.get();

            let thread_id =
                insert_thread(conn, &forum, thread.name.as_str(), author_id, thread.created_at)?;
            let row = load_thread(conn, thread_id)?;
            let post_id = append_post(
                conn,
                &row,
                author_id,
                thread.content.as_str(),
                thread.created_at,
            )?;

            if thread.subscribe {
                ensure_subscription(conn, author_id, thread_id)?;
            }

            Ok(ThreadCreated {
                thread_id: ThreadId::new(thread_id)?,
                post_id: PostId::new(post_id)?,
            })
        })
    }

    fn set_thread_locked(&self, id: ThreadId, locked: bool) -> RepositoryResult<usize> {
        use crate::schema::threads;

        let mut conn = self.conn()?;
        let affected = diesel::update(threads::table.find(id.get()))
            .set(threads::locked.eq(locked))
            .execute(&mut conn)?;
        Ok(affected)
    }

    fn set_thread_pinned(&self, id: ThreadId, pinned: bool) -> RepositoryResult<usize> {
        use crate::schema::threads;

        let mut conn = self.conn()?;
        let affected = diesel::update(threads::table.find(id.get()))
            .set(threads::pinned.eq(pinned))
            .execute(&mut conn)?;
        Ok(affected)
    }

    fn move_thread(&self, id: ThreadId, target: ForumId) -> RepositoryResult<ThreadMoved> {
        use crate::schema::{posts, threads};

        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            let thread = load_thread(conn, id.get())?;
            if thread.forum_id == target.get() {
                return Err(RepositoryError::Conflict(
                    "thread already belongs to this forum".to_owned(),
                ));
            }
            let destination = load_forum(conn, target.get())?;
            let source = ForumId::new(thread.forum_id)?;

            counters::adjust_forum(conn, source, -1, -thread.posts)?;
            counters::adjust_forum(conn, target, 1, thread.posts)?;

            diesel::update(threads::table.find(thread.id))
                .set((
                    threads::forum_id.eq(destination.id),
                    threads::category_id.eq(destination.category_id),
                ))
                .execute(conn)?;
            diesel::update(posts::table.filter(posts::thread_id.eq(thread.id)))
                .set(posts::forum_id.eq(destination.id))
                .execute(conn)?;

            counters::refresh_latest_post(conn, source)?;
            counters::refresh_latest_post(conn, target)?;

            Ok(ThreadMoved {
                thread_id: id,
                from_forum: source,
                to_forum: target,
                posts: PostCount::new(thread.posts)?,
            })
        })
    }

    fn delete_thread(&self, id: ThreadId) -> RepositoryResult<ThreadDeleted> {
        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            let thread = load_thread(conn, id.get())?;
            let forum_id = ForumId::new(thread.forum_id)?;

            purge_threads(conn, &[thread.id])?;
            counters::adjust_forum(conn, forum_id, -1, -thread.posts)?;
            counters::refresh_latest_post(conn, forum_id)?;

            Ok(ThreadDeleted {
                thread_id: id,
                forum_id,
                posts: PostCount::new(thread.posts)?,
            })
        })
    }
}
