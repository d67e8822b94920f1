//! Maintenance of the search vocabulary and its post links.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::domain::vocabulary::tokenize;
use crate::models::vocabulary::{NewJunction, NewWord};
use crate::schema::{vocabulary, vocabulary_junction};

/// Make the post's links equal to the words of `content`.
///
/// Missing words are added to the vocabulary, stale links are dropped. For a
/// fresh post this only inserts.
pub fn index_post_words(
    conn: &mut SqliteConnection,
    post_id: i32,
    content: &str,
) -> QueryResult<usize> {
    let words = tokenize(content);

    let word_ids: Vec<i32> = if words.is_empty() {
        Vec::new()
    } else {
        let new_words: Vec<NewWord> = words.iter().map(|word| NewWord { word }).collect();
        diesel::insert_or_ignore_into(vocabulary::table)
            .values(&new_words)
            .execute(conn)?;

        vocabulary::table
            .filter(vocabulary::word.eq_any(&words))
            .select(vocabulary::id)
            .load(conn)?
    };

    diesel::delete(
        vocabulary_junction::table
            .filter(vocabulary_junction::post_id.eq(post_id))
            .filter(vocabulary_junction::word_id.ne_all(&word_ids)),
    )
    .execute(conn)?;

    if word_ids.is_empty() {
        return Ok(0);
    }

    let links: Vec<NewJunction> = word_ids
        .into_iter()
        .map(|word_id| NewJunction { word_id, post_id })
        .collect();

    diesel::insert_or_ignore_into(vocabulary_junction::table)
        .values(&links)
        .execute(conn)
}

/// Drop every link of the given posts. Vocabulary words are kept.
pub fn unlink_posts(conn: &mut SqliteConnection, post_ids: &[i32]) -> QueryResult<usize> {
    diesel::delete(vocabulary_junction::table.filter(vocabulary_junction::post_id.eq_any(post_ids)))
        .execute(conn)
}
