use diesel::prelude::*;

use crate::domain::forum::{Forum, ForumUpdate, NewForum};
use crate::domain::types::ForumId;
use crate::models::forum::{Forum as DbForum, NewForum as DbNewForum};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::thread::purge_threads;
use crate::repository::{DieselRepository, ForumListQuery, ForumReader, ForumWriter};

impl ForumReader for DieselRepository {
    fn list_forums(&self, query: ForumListQuery) -> RepositoryResult<(usize, Vec<Forum>)> {
        use crate::schema::forums;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = forums::table.into_boxed::<diesel::sqlite::Sqlite>();
            if let Some(category_id) = query.category_id {
                items = items.filter(forums::category_id.eq(category_id.get()));
            }
            if query.visible_only {
                items = items.filter(forums::visible.eq(true));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder();
        if let Some(pagination) = query.pagination {
            items = items.offset(pagination.offset()).limit(pagination.limit());
        }

        let items = items
            .order((forums::sort.asc(), forums::id.asc()))
            .load::<DbForum>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Forum>, _>>()?;

        Ok((total, items))
    }

    fn get_forum_by_id(&self, id: ForumId) -> RepositoryResult<Option<Forum>> {
        use crate::schema::forums;

        let mut conn = self.conn()?;

        let forum = forums::table
            .find(id.get())
            .first::<DbForum>(&mut conn)
            .optional()?;

        Ok(forum.map(TryInto::try_into).transpose()?)
    }
}

impl ForumWriter for DieselRepository {
    fn create_forum(&self, forum: &NewForum) -> RepositoryResult<Forum> {
        use crate::schema::{categories, forums};

        let mut conn = self.conn()?;
        let db_forum: DbNewForum = forum.clone().into();

        conn.transaction(|conn| {
            let category = categories::table
                .find(db_forum.category_id)
                .select(categories::id)
                .first::<i32>(conn)
                .optional()?;
            if category.is_none() {
                return Err(RepositoryError::NotFound);
            }

            let created = diesel::insert_into(forums::table)
                .values(&db_forum)
                .returning(DbForum::as_returning())
                .get_result::<DbForum>(conn)?;

            Ok(created.try_into()?)
        })
    }

    fn update_forum(&self, id: ForumId, update: &ForumUpdate) -> RepositoryResult<usize> {
        use crate::schema::forums;

        let mut conn = self.conn()?;

        let affected = diesel::update(forums::table.find(id.get()))
            .set((
                forums::name.eq(update.name.as_str()),
                forums::sub.eq(update.sub.as_deref()),
                forums::slug.eq(update.slug.as_str()),
                forums::visible.eq(update.visible),
                forums::keywords.eq(update.keywords.as_deref()),
                forums::description.eq(update.description.as_deref()),
                forums::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn set_forum_sort(&self, id: ForumId, sort: i32) -> RepositoryResult<usize> {
        use crate::schema::forums;

        let mut conn = self.conn()?;

        let affected = diesel::update(forums::table.find(id.get()))
            .set(forums::sort.eq(sort))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn delete_forum(&self, id: ForumId) -> RepositoryResult<usize> {
        use crate::schema::{forums, threads};

        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            let thread_ids: Vec<i32> = threads::table
                .filter(threads::forum_id.eq(id.get()))
                .select(threads::id)
                .load(conn)?;
            purge_threads(conn, &thread_ids)?;

            let affected = diesel::delete(forums::table.find(id.get())).execute(conn)?;
            Ok(affected)
        })
    }
}
