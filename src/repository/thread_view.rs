use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::domain::post::Post;
use crate::domain::subscription::PostSeen;
use crate::domain::thread::Thread;
use crate::domain::thread_view::{SeenUpdate, ThreadView, Watermarks, plan_mark_seen};
use crate::domain::types::{PostId, ThreadId, UserId};
use crate::models::post::Post as DbPost;
use crate::models::thread::Thread as DbThread;
use crate::models::thread_view::{NewThreadView as DbNewThreadView, ThreadView as DbThreadView};
use crate::repository::counters::{self, Counter};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, ThreadViewReader, ThreadViewWriter, UnreadThreadsQuery};

fn load_view(
    conn: &mut SqliteConnection,
    user_id: i32,
    thread_id: i32,
) -> RepositoryResult<Option<DbThreadView>> {
    use crate::schema::thread_views;

    Ok(thread_views::table
        .filter(thread_views::user_id.eq(user_id))
        .filter(thread_views::thread_id.eq(thread_id))
        .first::<DbThreadView>(conn)
        .optional()?)
}

fn write_watermarks(
    conn: &mut SqliteConnection,
    user_id: i32,
    thread_id: i32,
    watermarks: Watermarks,
) -> RepositoryResult<usize> {
    use crate::schema::thread_views;

    Ok(diesel::update(
        thread_views::table
            .filter(thread_views::user_id.eq(user_id))
            .filter(thread_views::thread_id.eq(thread_id)),
    )
    .set((
        thread_views::new_last_seen.eq(watermarks.new_last_seen),
        thread_views::edited_last_seen.eq(watermarks.edited_last_seen),
    ))
    .execute(conn)?)
}

/// Plans against `current` and writes the outcome. When the row turns out
/// to exist already, the plan is redone against the stored watermarks.
fn apply_seen(
    conn: &mut SqliteConnection,
    user_id: i32,
    post: &Post,
    current: Option<Watermarks>,
) -> RepositoryResult<SeenUpdate> {
    use crate::schema::thread_views;

    let thread_id = post.thread_id.get();
    let mut update = plan_mark_seen(current, post);

    if let SeenUpdate::Create(watermarks) = update {
        let inserted = diesel::insert_or_ignore_into(thread_views::table)
            .values(DbNewThreadView {
                user_id,
                thread_id,
                new_last_seen: watermarks.new_last_seen,
                edited_last_seen: watermarks.edited_last_seen,
            })
            .execute(conn)?;
        if inserted == 0 {
            let stored = load_view(conn, user_id, thread_id)?.map(|view| view.watermarks());
            update = plan_mark_seen(stored, post);
        }
    }
    if let SeenUpdate::Advance(watermarks) = update {
        write_watermarks(conn, user_id, thread_id, watermarks)?;
    }
    Ok(update)
}

impl ThreadViewReader for DieselRepository {
    fn get_thread_view(
        &self,
        user_id: UserId,
        thread_id: ThreadId,
    ) -> RepositoryResult<Option<ThreadView>> {
        let mut conn = self.conn()?;
        let view = load_view(&mut conn, user_id.get(), thread_id.get())?;
        Ok(view.map(TryInto::try_into).transpose()?)
    }

    fn list_unread_threads(
        &self,
        query: UnreadThreadsQuery,
    ) -> RepositoryResult<(usize, Vec<Thread>)> {
        use crate::schema::{thread_views, threads};

        let mut conn = self.conn()?;
        let user_id = query.user_id.get();

        let query_builder = || {
            threads::table
                .left_join(
                    thread_views::table.on(thread_views::thread_id
                        .eq(threads::id)
                        .and(thread_views::user_id.eq(user_id))),
                )
                .filter(
                    thread_views::id
                        .nullable()
                        .is_null()
                        .or(thread_views::new_last_seen
                            .nullable()
                            .lt(threads::new_post_at.nullable()))
                        .or(thread_views::edited_last_seen
                            .nullable()
                            .lt(threads::edited_post_at.nullable())),
                )
                .into_boxed::<diesel::sqlite::Sqlite>()
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder();
        if let Some(pagination) = query.pagination {
            items = items.offset(pagination.offset()).limit(pagination.limit());
        }

        let items = items
            .order((threads::edited_post_at.asc(), threads::id.asc()))
            .select(DbThread::as_select())
            .load::<DbThread>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Thread>, _>>()?;

        Ok((total, items))
    }
}

impl ThreadViewWriter for DieselRepository {
    fn mark_post_seen(&self, user_id: UserId, post_id: PostId) -> RepositoryResult<SeenUpdate> {
        use crate::schema::{posts, subscriptions};

        let mut conn = self.conn()?;
        let user = user_id.get();

        conn.transaction(|conn| {
            let post: Post = posts::table
                .find(post_id.get())
                .first::<DbPost>(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?
                .try_into()?;
            let thread = post.thread_id.get();

            let current = load_view(conn, user, thread)?.map(|view| view.watermarks());
            let update = apply_seen(conn, user, &post, current)?;

            if update.counts_as_view() {
                counters::adjust(conn, Counter::ThreadViews(post.thread_id), 1)?;
            }

            diesel::update(
                subscriptions::table
                    .filter(subscriptions::user_id.eq(user))
                    .filter(subscriptions::thread_id.eq(thread))
                    .filter(subscriptions::post_seen.eq(PostSeen::New.as_i32())),
            )
            .set(subscriptions::post_seen.eq(PostSeen::Seen.as_i32()))
            .execute(conn)?;

            Ok(update)
        })
    }

    fn mark_all_seen(&self, user_id: UserId, now: NaiveDateTime) -> RepositoryResult<usize> {
        use crate::schema::{thread_views, threads};

        let mut conn = self.conn()?;
        let user = user_id.get();

        conn.transaction(|conn| {
            let stale: Vec<i32> = threads::table
                .inner_join(thread_views::table)
                .filter(thread_views::user_id.eq(user))
                .filter(
                    thread_views::new_last_seen
                        .lt(threads::new_post_at)
                        .or(thread_views::edited_last_seen.lt(threads::edited_post_at)),
                )
                .select(threads::id)
                .load(conn)?;

            if !stale.is_empty() {
                diesel::update(
                    thread_views::table
                        .filter(thread_views::user_id.eq(user))
                        .filter(thread_views::thread_id.eq_any(&stale)),
                )
                .set((
                    thread_views::new_last_seen.eq(now),
                    thread_views::edited_last_seen.eq(now),
                ))
                .execute(conn)?;
            }

            let unseen: Vec<i32> = threads::table
                .left_join(
                    thread_views::table.on(thread_views::thread_id
                        .eq(threads::id)
                        .and(thread_views::user_id.eq(user))),
                )
                .filter(thread_views::id.nullable().is_null())
                .select(threads::id)
                .load(conn)?;

            if !unseen.is_empty() {
                let rows: Vec<DbNewThreadView> = unseen
                    .iter()
                    .map(|&thread_id| DbNewThreadView {
                        user_id: user,
                        thread_id,
                        new_last_seen: now,
                        edited_last_seen: now,
                    })
                    .collect();
                diesel::insert_or_ignore_into(thread_views::table)
                    .values(&rows)
                    .execute(conn)?;
            }

            Ok(stale.len() + unseen.len())
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::db::{establish_connection_pool, run_migrations};
    use crate::domain::category::NewCategory;
    use crate::domain::forum::NewForum;
    use crate::domain::post::NewReply;
    use crate::domain::thread::NewThread;
    use crate::domain::types::{CategoryName, ForumName, PostContent, Slug, ThreadName};
    use crate::repository::{CategoryWriter, ForumWriter, PostReader, PostWriter, ThreadWriter};

    fn at(secs: i64) -> NaiveDateTime {
        DateTime::from_timestamp(secs, 0).unwrap().naive_utc()
    }

    #[test]
    fn insert_race_replans_against_the_stored_row() {
        let tempfile = NamedTempFile::new().unwrap();
        let pool = establish_connection_pool(tempfile.path().to_str().unwrap()).unwrap();
        run_migrations(&pool).unwrap();
        let repo = DieselRepository::new(pool.clone());

        let category = repo
            .create_category(&NewCategory {
                name: CategoryName::new("General").unwrap(),
                slug: Slug::from_name("General"),
                visible: true,
                sort: 0,
                keywords: None,
                description: None,
                created_at: at(0),
                updated_at: at(0),
            })
            .unwrap();
        let forum = repo
            .create_forum(&NewForum {
                category_id: category.id,
                name: ForumName::new("Talk").unwrap(),
                sub: None,
                slug: Slug::from_name("Talk"),
                visible: true,
                sort: 0,
                keywords: None,
                description: None,
                created_at: at(0),
                updated_at: at(0),
            })
            .unwrap();
        let created = repo
            .create_thread(&NewThread {
                forum_id: forum.id,
                name: ThreadName::new("Hello").unwrap(),
                author_id: UserId::new(1).unwrap(),
                content: PostContent::new("first post body").unwrap(),
                subscribe: false,
                created_at: at(10),
            })
            .unwrap();
        let reply_id = repo
            .create_reply(&NewReply {
                thread_id: created.thread_id,
                author_id: UserId::new(3).unwrap(),
                content: PostContent::new("a later reply body").unwrap(),
                subscribe: false,
                created_at: at(20),
            })
            .unwrap()
            .post_id();
        let reply = repo.get_post_by_id(reply_id).unwrap().unwrap();

        let mut conn = pool.get().unwrap();
        // Another request stored the row after this one read nothing.
        diesel::insert_into(crate::schema::thread_views::table)
            .values(DbNewThreadView {
                user_id: 2,
                thread_id: created.thread_id.get(),
                new_last_seen: at(10),
                edited_last_seen: at(10),
            })
            .execute(&mut conn)
            .unwrap();

        let update = apply_seen(&mut conn, 2, &reply, None).unwrap();
        assert_eq!(update, SeenUpdate::Advance(Watermarks::both(at(20))));
        assert!(update.counts_as_view());

        let stored = load_view(&mut conn, 2, created.thread_id.get())
            .unwrap()
            .unwrap();
        assert_eq!(stored.watermarks(), Watermarks::both(at(20)));

        let replay = apply_seen(&mut conn, 2, &reply, None).unwrap();
        assert_eq!(replay, SeenUpdate::Unchanged);
    }
}
