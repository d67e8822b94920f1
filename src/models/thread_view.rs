use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::thread_view::{ThreadView as DomainThreadView, Watermarks};
use crate::domain::types::TypeConstraintError;

/// Diesel model representing the `thread_views` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::thread_views)]
pub struct ThreadView {
    pub id: i32,
    pub user_id: i32,
    pub thread_id: i32,
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

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::thread_views)]
pub struct NewThreadView {
    pub user_id: i32,
    pub thread_id: i32,
    pub new_last_seen: NaiveDateTime,
    pub edited_last_seen: NaiveDateTime,
}

impl TryFrom<ThreadView> for DomainThreadView {
    type Error = TypeConstraintError;

    fn try_from(view: ThreadView) -> Result<Self, Self::Error> {
        Ok(Self {
            id: view.id,
            user_id: view.user_id.try_into()?,
            thread_id: view.thread_id.try_into()?,
            new_last_seen: view.new_last_seen,
            edited_last_seen: view.edited_last_seen,
        })
    }
}
