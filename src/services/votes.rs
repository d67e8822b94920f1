//! Rate-limited thumbs up/down on posts.

use chrono::Utc;

use crate::access::{AccessControl, Permission, PermissionContext};
use crate::cache::{Cache, CacheExt, keys};
use crate::domain::auth::AuthenticatedUser;
use crate::domain::vote::{VoteTally, VoteWindow};
use crate::forms::votes::VoteFormPayload;
use crate::models::config::VoteLimit;
use crate::repository::{PostReader, ThreadReader, VoteWriter};

use super::threads::load_thread;
use super::{ServiceError, ServiceResult, authorize, now, repository_failure, require_user};

/// Cast a vote. Rejections happen before any counter is touched: locked
/// thread, own post, then an exhausted vote window.
pub fn vote<R, A, C>(
    payload: VoteFormPayload,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
    cache: &C,
    limit: &VoteLimit,
) -> ServiceResult<VoteTally>
where
    R: PostReader + ThreadReader + VoteWriter,
    A: AccessControl,
    C: Cache,
{
    let voter = require_user(user)?;
    let post = repo
        .get_post_by_id(payload.post_id)
        .map_err(|e| repository_failure("Load post", payload.post_id, e))?
        .ok_or(ServiceError::NotFound)?;
    authorize(access, user, Permission::Vote, PermissionContext::Post(&post))?;

    let thread = load_thread(repo, post.thread_id)?;
    if thread.locked {
        return Err(ServiceError::Conflict("thread is locked".to_owned()));
    }
    if post.author_id == voter {
        return Err(ServiceError::Conflict("cannot vote on own post".to_owned()));
    }

    let timestamp = Utc::now().timestamp();
    let element = voter.to_string();
    let stored = cache
        .get_element_as::<VoteWindow>(keys::USER_VOTES, &element)
        .map_err(|e| {
            log::error!("Failed to read vote window of member {voter}: {e}");
            ServiceError::Internal
        })?;
    let window = VoteWindow::current(stored, timestamp);
    if window.is_some_and(|w| w.is_exhausted(limit.max_votes)) {
        log::warn!("Vote limit reached for member {voter}");
        return Err(ServiceError::Conflict("vote limit reached".to_owned()));
    }

    let tally = repo
        .cast_vote(voter, post.id, payload.thumb, now())
        .map_err(|e| repository_failure("Vote", post.id, e))?;

    let recorded = VoteWindow::record(window, timestamp, limit.window_secs);
    if let Err(e) = cache.set_element_as(keys::USER_VOTES, &element, &recorded) {
        log::warn!("Failed to store vote window of member {voter}: {e}");
    }
    log::info!(target: "forum", "Post voted: {}", post.id);
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::access::RoleAccessControl;
    use crate::domain::types::PostId;
    use crate::domain::vote::Thumb;
    use crate::repository::test::TestRepository;
    use crate::services::posts::create_reply;
    use crate::forms::posts::ReplyFormPayload;
    use crate::services::test_support::{content, member, moderator, new_thread};
    use crate::services::threads::{create_thread, toggle_lock};

    fn setup() -> (TestRepository, PostId) {
        let repo = TestRepository::new();
        let forum_id = repo.seed_forum(true);
        let created = create_thread(
            new_thread(forum_id, "Topic", "first post body"),
            Some(&member(7)),
            &repo,
            &RoleAccessControl,
            &InMemoryCache::new(),
        )
        .unwrap();
        (repo, created.post_id)
    }

    fn up(post_id: PostId) -> VoteFormPayload {
        VoteFormPayload {
            post_id,
            thumb: Thumb::Up,
        }
    }

    #[test]
    fn vote_then_switch() {
        let (repo, post_id) = setup();
        let cache = InMemoryCache::new();
        let voter = member(8);
        let limit = VoteLimit::default();

        let tally = vote(up(post_id), Some(&voter), &repo, &RoleAccessControl, &cache, &limit)
            .unwrap();
        assert_eq!((tally.likes.get(), tally.dislikes.get()), (1, 0));

        let down = VoteFormPayload {
            post_id,
            thumb: Thumb::Down,
        };
        let tally =
            vote(down, Some(&voter), &repo, &RoleAccessControl, &cache, &limit).unwrap();
        assert_eq!((tally.likes.get(), tally.dislikes.get()), (0, 1));
    }

    #[test]
    fn self_vote_is_rejected() {
        let (repo, post_id) = setup();
        let result = vote(
            up(post_id),
            Some(&member(7)),
            &repo,
            &RoleAccessControl,
            &InMemoryCache::new(),
            &VoteLimit::default(),
        );
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
        assert_eq!(repo.posts()[0].likes.get(), 0);
    }

    #[test]
    fn locked_thread_rejects_votes() {
        let (repo, post_id) = setup();
        let thread_id = repo.threads()[0].id;
        toggle_lock(thread_id, Some(&moderator(2)), &repo, &RoleAccessControl).unwrap();

        let result = vote(
            up(post_id),
            Some(&member(8)),
            &repo,
            &RoleAccessControl,
            &InMemoryCache::new(),
            &VoteLimit::default(),
        );
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[test]
    fn eleventh_vote_within_window_is_rejected() {
        let (repo, post_id) = setup();
        let thread_id = repo.threads()[0].id;
        create_reply(
            ReplyFormPayload {
                thread_id,
                content: content("second post body"),
                subscribe: false,
            },
            Some(&member(9)),
            &repo,
            &RoleAccessControl,
            &InMemoryCache::new(),
        )
        .unwrap();
        let other_post = repo.posts()[1].id;
        let cache = InMemoryCache::new();
        let voter = member(8);
        let limit = VoteLimit::default();

        for i in 0..10 {
            let target = if i % 2 == 0 { post_id } else { other_post };
            vote(up(target), Some(&voter), &repo, &RoleAccessControl, &cache, &limit).unwrap();
        }
        let before: Vec<_> = repo.posts().iter().map(|p| (p.likes, p.dislikes)).collect();

        let result = vote(
            VoteFormPayload {
                post_id,
                thumb: Thumb::Down,
            },
            Some(&voter),
            &repo,
            &RoleAccessControl,
            &cache,
            &limit,
        );
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
        let after: Vec<_> = repo.posts().iter().map(|p| (p.likes, p.dislikes)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn elapsed_window_is_reset_lazily() {
        let (repo, post_id) = setup();
        let cache = InMemoryCache::new();
        let voter = member(8);
        let stale = VoteWindow {
            count: 10,
            expire: Utc::now().timestamp() - 1,
        };
        cache.set_element_as(keys::USER_VOTES, "8", &stale).unwrap();

        vote(
            up(post_id),
            Some(&voter),
            &repo,
            &RoleAccessControl,
            &cache,
            &VoteLimit::default(),
        )
        .unwrap();

        let window: VoteWindow = cache
            .get_element_as(keys::USER_VOTES, "8")
            .unwrap()
            .unwrap();
        assert_eq!(window.count, 1);
    }
}
