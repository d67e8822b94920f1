use pushkind_forum::domain::types::PostId;
use pushkind_forum::domain::vote::{Thumb, VoteTally};
use pushkind_forum::repository::errors::RepositoryError;
use pushkind_forum::repository::{CounterMaintenance, PostReader, VoteReader, VoteWriter};

mod common;

use common::{at, create_thread, seed_forum, uid};

fn tally(tally: VoteTally) -> (i32, i32) {
    (tally.likes.get(), tally.dislikes.get())
}

#[test]
fn vote_switch_and_repeat() {
    let test_db = common::TestDb::new();
    let repo = test_db.repo();
    let forum_id = seed_forum(&repo, "Talk", true);
    let created = create_thread(&repo, forum_id, 1, "Hello", "first post body", 10);
    let post_id = created.post_id;

    let up = repo.cast_vote(uid(2), post_id, Thumb::Up, at(20)).unwrap();
    assert_eq!(tally(up), (1, 0));

    let repeat = repo.cast_vote(uid(2), post_id, Thumb::Up, at(30)).unwrap();
    assert_eq!(tally(repeat), (1, 0));

    let other = repo.cast_vote(uid(3), post_id, Thumb::Down, at(40)).unwrap();
    assert_eq!(tally(other), (1, 1));

    let switched = repo.cast_vote(uid(2), post_id, Thumb::Down, at(50)).unwrap();
    assert_eq!(tally(switched), (0, 2));

    let thumb = repo
        .get_thumb(uid(2), post_id)
        .unwrap()
        .expect("thumb should be stored");
    assert_eq!(thumb.thumb, Thumb::Down);
    assert_eq!(thumb.created_at, at(20));
    assert_eq!(thumb.updated_at, at(50));
}

#[test]
fn recount_agrees_with_the_ledger() {
    let test_db = common::TestDb::new();
    let repo = test_db.repo();
    let forum_id = seed_forum(&repo, "Talk", true);
    let created = create_thread(&repo, forum_id, 1, "Hello", "first post body", 10);
    for (voter, thumb) in [(2, Thumb::Up), (3, Thumb::Up), (4, Thumb::Down)] {
        repo.cast_vote(uid(voter), created.post_id, thumb, at(20))
            .unwrap();
    }

    repo.recount_counters().unwrap();

    let post = repo.get_post_by_id(created.post_id).unwrap().unwrap();
    assert_eq!((post.likes.get(), post.dislikes.get()), (2, 1));
}

#[test]
fn voting_on_missing_post_fails() {
    let test_db = common::TestDb::new();
    let repo = test_db.repo();

    let result = repo.cast_vote(uid(2), PostId::new(77).unwrap(), Thumb::Up, at(20));
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}
