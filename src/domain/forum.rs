use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{CategoryId, ForumId, ForumName, PostCount, PostId, Slug, ThreadCount};

/// Board inside a category holding threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forum {
    pub id: ForumId,
    pub category_id: CategoryId,
    pub name: ForumName,
    pub sub: Option<String>,
    pub slug: Slug,
    pub visible: bool,
    pub sort: i32,
    pub threads: ThreadCount,
    pub posts: PostCount,
    pub latest_post_id: Option<PostId>,
    pub keywords: Option<String>,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Data required to insert a new [`Forum`]. Counters always start at zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewForum {
    pub category_id: CategoryId,
    pub name: ForumName,
    pub sub: Option<String>,
    pub slug: Slug,
    pub visible: bool,
    pub sort: i32,
    pub keywords: Option<String>,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Editable attributes of an existing [`Forum`].
#[derive(Debug, Clone, PartialEq)]
pub struct ForumUpdate {
    pub name: ForumName,
    pub sub: Option<String>,
    pub slug: Slug,
    pub visible: bool,
    pub keywords: Option<String>,
    pub description: Option<String>,
}
