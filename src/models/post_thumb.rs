use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::types::TypeConstraintError;
use crate::domain::vote::{PostThumb as DomainPostThumb, Thumb};

/// Diesel model representing the `post_thumbs` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::post_thumbs)]
pub struct PostThumb {
    pub id: i32,
    pub user_id: i32,
    pub post_id: i32,
    pub thumb: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::post_thumbs)]
pub struct NewPostThumb {
    pub user_id: i32,
    pub post_id: i32,
    pub thumb: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<PostThumb> for DomainPostThumb {
    type Error = TypeConstraintError;

    fn try_from(thumb: PostThumb) -> Result<Self, Self::Error> {
        Ok(Self {
            id: thumb.id,
            user_id: thumb.user_id.try_into()?,
            post_id: thumb.post_id.try_into()?,
            thumb: Thumb::try_from(thumb.thumb)?,
            created_at: thumb.created_at,
            updated_at: thumb.updated_at,
        })
    }
}
