use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::forum::{Forum as DomainForum, NewForum as DomainNewForum};
use crate::domain::types::{ForumName, PostCount, Slug, ThreadCount, TypeConstraintError};

/// Diesel model representing the `forums` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::forums)]
pub struct Forum {
    pub id: i32,
    pub category_id: i32,
    pub name: String,
    pub sub: Option<String>,
    pub slug: String,
    pub visible: bool,
    pub sort: i32,
    pub threads: i32,
    pub posts: i32,
    pub latest_post_id: Option<i32>,
    pub keywords: Option<String>,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insertable form of [`Forum`]; counters use their column defaults.
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::forums)]
pub struct NewForum {
    pub category_id: i32,
    pub name: String,
    pub sub: Option<String>,
    pub slug: String,
    pub visible: bool,
    pub sort: i32,
    pub keywords: Option<String>,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Forum> for DomainForum {
    type Error = TypeConstraintError;

    fn try_from(forum: Forum) -> Result<Self, Self::Error> {
        Ok(Self {
            id: forum.id.try_into()?,
            category_id: forum.category_id.try_into()?,
            name: ForumName::new(forum.name)?,
            sub: forum.sub,
            slug: Slug::new(forum.slug)?,
            visible: forum.visible,
            sort: forum.sort,
            threads: ThreadCount::new(forum.threads)?,
            posts: PostCount::new(forum.posts)?,
            latest_post_id: forum.latest_post_id.map(TryInto::try_into).transpose()?,
            keywords: forum.keywords,
            description: forum.description,
            created_at: forum.created_at,
            updated_at: forum.updated_at,
        })
    }
}

impl From<DomainNewForum> for NewForum {
    fn from(forum: DomainNewForum) -> Self {
        Self {
            category_id: forum.category_id.get(),
            name: forum.name.into_inner(),
            sub: forum.sub,
            slug: forum.slug.into_inner(),
            visible: forum.visible,
            sort: forum.sort,
            keywords: forum.keywords,
            description: forum.description,
            created_at: forum.created_at,
            updated_at: forum.updated_at,
        }
    }
}
