use diesel::prelude::*;
use pushkind_forum::domain::post::PostEdit;
use pushkind_forum::domain::types::{PostContent, PostId};
use pushkind_forum::repository::{PostReader, PostSearchQuery, PostWriter};
use pushkind_forum::schema::{vocabulary, vocabulary_junction};

mod common;

use common::{at, create_thread, reply, seed_forum};

fn linked_words(test_db: &common::TestDb, post_id: PostId) -> Vec<String> {
    let mut conn = test_db.pool().get().expect("should acquire connection");
    let mut words: Vec<String> = vocabulary_junction::table
        .inner_join(vocabulary::table)
        .filter(vocabulary_junction::post_id.eq(post_id.get()))
        .select(vocabulary::word)
        .load(&mut conn)
        .expect("should load links");
    words.sort();
    words
}

#[test]
fn new_post_is_indexed_with_filtered_words() {
    let test_db = common::TestDb::new();
    let repo = test_db.repo();
    let forum_id = seed_forum(&repo, "Talk", true);

    let created = create_thread(
        &repo,
        forum_id,
        1,
        "Cats",
        "The the cat sat on a mat <br> mat.",
        10,
    );

    assert_eq!(
        linked_words(&test_db, created.post_id),
        vec!["The", "cat", "mat", "sat", "the"]
    );
}

#[test]
fn edit_rebuilds_links_exactly() {
    let test_db = common::TestDb::new();
    let repo = test_db.repo();
    let forum_id = seed_forum(&repo, "Talk", true);
    let created = create_thread(&repo, forum_id, 1, "Cats", "alpha beta gamma", 10);

    repo.edit_post(&PostEdit {
        post_id: created.post_id,
        content: PostContent::new("beta delta epsilon").unwrap(),
        topic: None,
        edited_at: at(20),
    })
    .unwrap();

    assert_eq!(
        linked_words(&test_db, created.post_id),
        vec!["beta", "delta", "epsilon"]
    );

    let mut conn = test_db.pool().get().unwrap();
    let known: i64 = vocabulary::table.count().get_result(&mut conn).unwrap();
    assert_eq!(known, 5);
}

#[test]
fn merged_reply_extends_the_index() {
    let test_db = common::TestDb::new();
    let repo = test_db.repo();
    let forum_id = seed_forum(&repo, "Talk", true);
    let created = create_thread(&repo, forum_id, 1, "Cats", "alpha beta gamma", 10);

    repo.create_reply(&reply(1, created.thread_id, "omega appended words", 20))
        .unwrap();

    assert_eq!(
        linked_words(&test_db, created.post_id),
        vec!["alpha", "appended", "beta", "gamma", "omega", "words"]
    );
}

#[test]
fn deleted_posts_lose_their_links_and_search_hits() {
    let test_db = common::TestDb::new();
    let repo = test_db.repo();
    let forum_id = seed_forum(&repo, "Talk", true);
    let created = create_thread(&repo, forum_id, 1, "Cats", "alpha beta gamma", 10);
    let second = repo
        .create_reply(&reply(2, created.thread_id, "gamma rays everywhere", 20))
        .unwrap()
        .post_id();

    let (total, posts) = repo
        .search_posts(PostSearchQuery::new(vec!["gamma".to_string()]))
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(posts[0].id, second);

    repo.delete_posts(created.thread_id, &[second]).unwrap();
    assert!(linked_words(&test_db, second).is_empty());

    let (total, _) = repo
        .search_posts(PostSearchQuery::new(vec!["rays".to_string()]))
        .unwrap();
    assert_eq!(total, 0);
}

#[test]
fn guests_only_search_visible_forums() {
    let test_db = common::TestDb::new();
    let repo = test_db.repo();
    let hidden = seed_forum(&repo, "Staff", false);
    create_thread(&repo, hidden, 1, "Secret", "confidential roadmap notes", 10);

    let query = PostSearchQuery::new(vec!["roadmap".to_string()]);
    assert_eq!(repo.search_posts(query.clone()).unwrap().0, 1);
    assert_eq!(repo.search_posts(query.visible_only()).unwrap().0, 0);
}
