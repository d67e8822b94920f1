use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::post::{
    LatestPost, MoveDestination, NewReply, Post, PostEdit, PostsDeleted, PostsMove, PostsMoved,
    ReplyOutcome, merge_content,
};
use crate::domain::types::{ForumId, PostCount, PostId, ThreadId, UserId};
use crate::models::post::Post as DbPost;
use crate::repository::counters::{self, Counter};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::thread::{
    append_post, ensure_subscription, insert_thread, load_forum, load_thread, purge_threads,
};
use crate::repository::{
    DieselRepository, PostListQuery, PostReader, PostSearchQuery, PostWriter, vocabulary,
};

/// Forums shown to guests: visible forums inside visible categories.
macro_rules! visible_forum_ids {
    () => {
        crate::schema::forums::table
            .inner_join(crate::schema::categories::table)
            .filter(crate::schema::forums::visible.eq(true))
            .filter(crate::schema::categories::visible.eq(true))
            .select(crate::schema::forums::id)
    };
}

/// Deduplicated raw ids, rejecting an empty selection.
fn selected_ids(post_ids: &[PostId]) -> RepositoryResult<Vec<i32>> {
    let ids: BTreeSet<i32> = post_ids.iter().map(|id| id.get()).collect();
    if ids.is_empty() {
        return Err(RepositoryError::Conflict("no posts selected".to_owned()));
    }
    Ok(ids.into_iter().collect())
}

/// Ensure every id names a post of `thread_id`.
fn ensure_in_thread(
    conn: &mut diesel::sqlite::SqliteConnection,
    thread_id: i32,
    ids: &[i32],
) -> RepositoryResult<()> {
    use crate::schema::posts;

    let found = posts::table
        .filter(posts::thread_id.eq(thread_id))
        .filter(posts::id.eq_any(ids))
        .count()
        .get_result::<i64>(conn)?;
    if found as usize != ids.len() {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

fn remaining_posts(
    conn: &mut diesel::sqlite::SqliteConnection,
    thread_id: i32,
) -> RepositoryResult<i64> {
    use crate::schema::posts;

    Ok(posts::table
        .filter(posts::thread_id.eq(thread_id))
        .count()
        .get_result::<i64>(conn)?)
}

fn touch_edited(
    conn: &mut diesel::sqlite::SqliteConnection,
    thread_id: i32,
    at: NaiveDateTime,
) -> RepositoryResult<usize> {
    use crate::schema::threads;

    Ok(diesel::update(threads::table.find(thread_id))
        .set((threads::edited_post_at.eq(at), threads::updated_at.eq(at)))
        .execute(conn)?)
}

impl PostReader for DieselRepository {
    fn list_posts(&self, query: PostListQuery) -> RepositoryResult<(usize, Vec<Post>)> {
        use crate::schema::posts;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = posts::table.into_boxed::<diesel::sqlite::Sqlite>();
            if let Some(thread_id) = query.thread_id {
                items = items.filter(posts::thread_id.eq(thread_id.get()));
            }
            if let Some(author_id) = query.author_id {
                items = items.filter(posts::author_id.eq(author_id.get()));
            }
            if query.visible_only {
                items = items.filter(posts::forum_id.eq_any(visible_forum_ids!()));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder();
        if let Some(pagination) = query.pagination {
            items = items.offset(pagination.offset()).limit(pagination.limit());
        }

        let items = items
            .order(posts::id.asc())
            .load::<DbPost>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Post>, _>>()?;

        Ok((total, items))
    }

    fn get_post_by_id(&self, id: PostId) -> RepositoryResult<Option<Post>> {
        use crate::schema::posts;

        let mut conn = self.conn()?;

        let post = posts::table
            .find(id.get())
            .first::<DbPost>(&mut conn)
            .optional()?;

        Ok(post.map(TryInto::try_into).transpose()?)
    }

    fn get_first_post(&self, thread_id: ThreadId) -> RepositoryResult<Option<Post>> {
        use crate::schema::posts;

        let mut conn = self.conn()?;

        let post = posts::table
            .filter(posts::thread_id.eq(thread_id.get()))
            .order(posts::id.asc())
            .first::<DbPost>(&mut conn)
            .optional()?;

        Ok(post.map(TryInto::try_into).transpose()?)
    }

    fn count_posts(&self, author: Option<UserId>) -> RepositoryResult<usize> {
        use crate::schema::posts;

        let mut conn = self.conn()?;

        let mut query = posts::table.into_boxed::<diesel::sqlite::Sqlite>();
        if let Some(author) = author {
            query = query.filter(posts::author_id.eq(author.get()));
        }
        let total = query.count().get_result::<i64>(&mut conn)?;
        Ok(total as usize)
    }

    fn list_latest_posts(
        &self,
        limit: i64,
        visible_only: bool,
    ) -> RepositoryResult<Vec<LatestPost>> {
        use crate::schema::{posts, threads};

        let mut conn = self.conn()?;

        let mut query = posts::table
            .inner_join(threads::table)
            .select((
                posts::id,
                posts::thread_id,
                threads::name,
                posts::author_id,
                posts::created_at,
            ))
            .into_boxed::<diesel::sqlite::Sqlite>();
        if visible_only {
            query = query.filter(posts::forum_id.eq_any(visible_forum_ids!()));
        }

        let rows = query
            .order(posts::id.desc())
            .limit(limit)
            .load::<(i32, i32, String, i32, NaiveDateTime)>(&mut conn)?;

        rows.into_iter()
            .map(|(id, thread_id, title, author_id, created_at)| {
                Ok(LatestPost {
                    id: PostId::new(id)?,
                    thread_id: ThreadId::new(thread_id)?,
                    title,
                    author_id: UserId::new(author_id)?,
                    created_at,
                })
            })
            .collect()
    }

    fn search_posts(&self, query: PostSearchQuery) -> RepositoryResult<(usize, Vec<Post>)> {
        use crate::schema::{posts, vocabulary, vocabulary_junction};

        if query.words.is_empty() {
            return Ok((0, Vec::new()));
        }

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = posts::table
                .filter(
                    posts::id.eq_any(
                        vocabulary_junction::table
                            .inner_join(vocabulary::table)
                            .filter(vocabulary::word.eq_any(&query.words))
                            .select(vocabulary_junction::post_id),
                    ),
                )
                .into_boxed::<diesel::sqlite::Sqlite>();
            if query.visible_only {
                items = items.filter(posts::forum_id.eq_any(visible_forum_ids!()));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder();
        if let Some(pagination) = query.pagination {
            items = items.offset(pagination.offset()).limit(pagination.limit());
        }

        let items = items
            .order(posts::id.desc())
            .load::<DbPost>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Post>, _>>()?;

        Ok((total, items))
    }
}

impl PostWriter for DieselRepository {
    fn create_reply(&self, reply: &NewReply) -> RepositoryResult<ReplyOutcome> {
        use crate::schema::posts;

        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            let thread = load_thread(conn, reply.thread_id.get())?;
            let author_id = reply.author_id.get();
            let at = reply.created_at;

            let previous = posts::table
                .filter(posts::thread_id.eq(thread.id))
                .order(posts::id.desc())
                .first::<DbPost>(conn)
                .optional()?;

            let outcome = match previous {
                Some(previous) if previous.author_id == author_id => {
                    let merged = merge_content(&previous.content, reply.content.as_str());
                    diesel::update(posts::table.find(previous.id))
                        .set((
                            posts::content.eq(&merged),
                            posts::edited.eq(true),
                            posts::edited_at.eq(Some(at)),
                            posts::updated_at.eq(at),
                        ))
                        .execute(conn)?;
                    vocabulary::index_post_words(conn, previous.id, &merged)?;
                    touch_edited(conn, thread.id, at)?;
                    ReplyOutcome::Merged(PostId::new(previous.id)?)
                }
                _ => {
                    let post_id =
                        append_post(conn, &thread, author_id, reply.content.as_str(), at)?;
                    ReplyOutcome::Created(PostId::new(post_id)?)
                }
            };

            if reply.subscribe {
                ensure_subscription(conn, author_id, thread.id)?;
            }

            Ok(outcome)
        })
    }

    fn edit_post(&self, edit: &PostEdit) -> RepositoryResult<usize> {
        use crate::domain::types::Slug;
        use crate::schema::{posts, threads};

        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            let post = posts::table
                .find(edit.post_id.get())
                .first::<DbPost>(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;

            let affected = diesel::update(posts::table.find(post.id))
                .set((
                    posts::content.eq(edit.content.as_str()),
                    posts::edited.eq(true),
                    posts::edited_at.eq(Some(edit.edited_at)),
                    posts::updated_at.eq(edit.edited_at),
                ))
                .execute(conn)?;
            vocabulary::index_post_words(conn, post.id, edit.content.as_str())?;

            if let Some(topic) = &edit.topic {
                let slug = Slug::from_name(topic.as_str());
                diesel::update(threads::table.find(post.thread_id))
                    .set((
                        threads::name.eq(topic.as_str()),
                        threads::slug.eq(slug.as_str()),
                    ))
                    .execute(conn)?;
            }
            touch_edited(conn, post.thread_id, edit.edited_at)?;

            Ok(affected)
        })
    }

    fn delete_posts(
        &self,
        thread_id: ThreadId,
        post_ids: &[PostId],
    ) -> RepositoryResult<PostsDeleted> {
        use crate::schema::{post_thumbs, posts};

        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            let thread = load_thread(conn, thread_id.get())?;
            let forum_id = ForumId::new(thread.forum_id)?;
            let ids = selected_ids(post_ids)?;
            ensure_in_thread(conn, thread.id, &ids)?;

            vocabulary::unlink_posts(conn, &ids)?;
            diesel::delete(post_thumbs::table.filter(post_thumbs::post_id.eq_any(&ids)))
                .execute(conn)?;
            let deleted =
                diesel::delete(posts::table.filter(posts::id.eq_any(&ids))).execute(conn)? as i32;

            let thread_deleted = remaining_posts(conn, thread.id)? == 0;
            if thread_deleted {
                purge_threads(conn, &[thread.id])?;
                counters::adjust_forum(conn, forum_id, -1, -deleted)?;
            } else {
                counters::adjust(conn, Counter::ThreadPosts(thread_id), -deleted)?;
                counters::adjust_forum(conn, forum_id, 0, -deleted)?;
            }
            counters::refresh_latest_post(conn, forum_id)?;

            Ok(PostsDeleted {
                thread_id,
                forum_id,
                deleted: PostCount::new(deleted)?,
                thread_deleted,
            })
        })
    }

    fn move_posts(&self, request: &PostsMove) -> RepositoryResult<PostsMoved> {
        use crate::schema::posts;

        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            let source = load_thread(conn, request.source.get())?;
            let source_forum = ForumId::new(source.forum_id)?;
            let ids = selected_ids(&request.post_ids)?;

            let destination = match &request.destination {
                MoveDestination::Existing(id) => {
                    if *id == request.source {
                        return Err(RepositoryError::Conflict(
                            "posts already belong to this thread".to_owned(),
                        ));
                    }
                    load_thread(conn, id.get())?
                }
                MoveDestination::NewThread {
                    name,
                    forum_id,
                    author_id,
                } => {
                    let forum = load_forum(conn, forum_id.get())?;
                    let id = insert_thread(
                        conn,
                        &forum,
                        name.as_str(),
                        author_id.get(),
                        request.moved_at,
                    )?;
                    load_thread(conn, id)?
                }
            };
            let destination_forum = ForumId::new(destination.forum_id)?;

            ensure_in_thread(conn, source.id, &ids)?;

            let moved = diesel::update(posts::table.filter(posts::id.eq_any(&ids)))
                .set((
                    posts::thread_id.eq(destination.id),
                    posts::forum_id.eq(destination.forum_id),
                ))
                .execute(conn)? as i32;

            let source_deleted = remaining_posts(conn, source.id)? == 0;
            if source_deleted {
                purge_threads(conn, &[source.id])?;
                counters::adjust_forum(conn, source_forum, -1, -moved)?;
            } else {
                counters::adjust(conn, Counter::ThreadPosts(request.source), -moved)?;
                counters::adjust_forum(conn, source_forum, 0, -moved)?;
                touch_edited(conn, source.id, request.moved_at)?;
            }

            let destination_id = ThreadId::new(destination.id)?;
            counters::adjust(conn, Counter::ThreadPosts(destination_id), moved)?;
            counters::adjust_forum(conn, destination_forum, 0, moved)?;
            touch_edited(conn, destination.id, request.moved_at)?;

            counters::refresh_latest_post(conn, source_forum)?;
            if destination_forum != source_forum {
                counters::refresh_latest_post(conn, destination_forum)?;
            }

            Ok(PostsMoved {
                source: request.source,
                source_forum,
                destination: destination_id,
                destination_forum,
                moved: PostCount::new(moved)?,
                source_deleted,
            })
        })
    }
}
