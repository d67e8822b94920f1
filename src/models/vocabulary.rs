use diesel::prelude::*;

/// Diesel model representing the `vocabulary` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::vocabulary)]
pub struct Word {
    pub id: i32,
    pub word: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::vocabulary)]
pub struct NewWord<'a> {
    pub word: &'a str,
}

/// Link between a vocabulary word and a post.
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::vocabulary_junction)]
pub struct NewJunction {
    pub word_id: i32,
    pub post_id: i32,
}
