use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::post::Post as DomainPost;
use crate::domain::types::{PostContent, TypeConstraintError, VoteCount};

/// Diesel model representing the `posts` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::posts)]
pub struct Post {
    pub id: i32,
    pub thread_id: i32,
    pub forum_id: i32,
    pub author_id: i32,
    pub content: String,
    pub likes: i32,
    pub dislikes: i32,
    pub edited: bool,
    pub edited_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insertable form of [`Post`].
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::posts)]
pub struct NewPost<'a> {
    pub thread_id: i32,
    pub forum_id: i32,
    pub author_id: i32,
    pub content: &'a str,
    pub likes: i32,
    pub dislikes: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Post> for DomainPost {
    type Error = TypeConstraintError;

    fn try_from(post: Post) -> Result<Self, Self::Error> {
        Ok(Self {
            id: post.id.try_into()?,
            thread_id: post.thread_id.try_into()?,
            forum_id: post.forum_id.try_into()?,
            author_id: post.author_id.try_into()?,
            content: PostContent::new(post.content)?,
            likes: VoteCount::new(post.likes)?,
            dislikes: VoteCount::new(post.dislikes)?,
            edited: post.edited,
            edited_at: post.edited_at,
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
    }
}
