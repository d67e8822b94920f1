use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::thread::Thread as DomainThread;
use crate::domain::types::{PostCount, Slug, ThreadName, TypeConstraintError, ViewCount};

/// Diesel model representing the `threads` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::threads)]
pub struct Thread {
    pub id: i32,
    pub category_id: i32,
    pub forum_id: i32,
    pub name: String,
    pub slug: String,
    pub author_id: i32,
    pub posts: i32,
    pub views: i32,
    pub pinned: bool,
    pub locked: bool,
    pub new_post_at: NaiveDateTime,
    pub edited_post_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insertable form of [`Thread`]. Counters start at zero and are raised
/// through the counter store once the first post exists.
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::threads)]
pub struct NewThread<'a> {
    pub category_id: i32,
    pub forum_id: i32,
    pub name: &'a str,
    pub slug: &'a str,
    pub author_id: i32,
    pub posts: i32,
    pub views: i32,
    pub new_post_at: NaiveDateTime,
    pub edited_post_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Thread> for DomainThread {
    type Error = TypeConstraintError;

    fn try_from(thread: Thread) -> Result<Self, Self::Error> {
        Ok(Self {
            id: thread.id.try_into()?,
            category_id: thread.category_id.try_into()?,
            forum_id: thread.forum_id.try_into()?,
            name: ThreadName::new(thread.name)?,
            slug: Slug::new(thread.slug)?,
            author_id: thread.author_id.try_into()?,
            posts: PostCount::new(thread.posts)?,
            views: ViewCount::new(thread.views)?,
            pinned: thread.pinned,
            locked: thread.locked,
            new_post_at: thread.new_post_at,
            edited_post_at: thread.edited_post_at,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
        })
    }
}
