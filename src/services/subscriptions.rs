use crate::domain::auth::AuthenticatedUser;
use crate::domain::subscription::Subscription;
use crate::domain::types::ThreadId;
use crate::repository::{SubscriptionReader, SubscriptionWriter};

use super::{ServiceResult, repository_failure, require_user};

/// Subscribe the member to replies in a thread. Returns `false` when the
/// subscription already existed.
pub fn subscribe<R>(
    thread_id: ThreadId,
    user: Option<&AuthenticatedUser>,
    repo: &R,
) -> ServiceResult<bool>
where
    R: SubscriptionWriter,
{
    let user_id = require_user(user)?;
    let created = repo
        .subscribe(user_id, thread_id)
        .map_err(|e| repository_failure("Subscribe", thread_id, e))?;
    if created {
        log::info!(target: "forum", "Member {user_id} subscribed to thread {thread_id}");
    }
    Ok(created)
}

pub fn unsubscribe<R>(
    thread_id: ThreadId,
    user: Option<&AuthenticatedUser>,
    repo: &R,
) -> ServiceResult<bool>
where
    R: SubscriptionWriter,
{
    let user_id = require_user(user)?;
    let removed = repo
        .unsubscribe(user_id, thread_id)
        .map_err(|e| repository_failure("Unsubscribe", thread_id, e))?;
    if removed > 0 {
        log::info!(target: "forum", "Member {user_id} unsubscribed from thread {thread_id}");
    }
    Ok(removed > 0)
}

pub fn list_subscriptions<R>(
    user: Option<&AuthenticatedUser>,
    repo: &R,
) -> ServiceResult<Vec<Subscription>>
where
    R: SubscriptionReader,
{
    let user_id = require_user(user)?;
    repo.list_subscriptions(user_id)
        .map_err(|e| repository_failure("List subscriptions", user_id, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::RoleAccessControl;
    use crate::cache::InMemoryCache;
    use crate::repository::test::TestRepository;
    use crate::services::ServiceError;
    use crate::services::test_support::{member, new_thread};
    use crate::services::threads::create_thread;

    #[test]
    fn subscribe_is_idempotent() {
        let repo = TestRepository::new();
        let forum_id = repo.seed_forum(true);
        let mut payload = new_thread(forum_id, "Topic", "first post body");
        payload.subscribe = false;
        let created = create_thread(
            payload,
            Some(&member(7)),
            &repo,
            &RoleAccessControl,
            &InMemoryCache::new(),
        )
        .unwrap();
        let reader = member(8);

        assert!(subscribe(created.thread_id, Some(&reader), &repo).unwrap());
        assert!(!subscribe(created.thread_id, Some(&reader), &repo).unwrap());
        assert_eq!(list_subscriptions(Some(&reader), &repo).unwrap().len(), 1);

        assert!(unsubscribe(created.thread_id, Some(&reader), &repo).unwrap());
        assert!(list_subscriptions(Some(&reader), &repo).unwrap().is_empty());
    }

    #[test]
    fn unknown_thread_is_not_found() {
        let repo = TestRepository::new();
        let result = subscribe(ThreadId::new(99).unwrap(), Some(&member(8)), &repo);
        assert_eq!(result.unwrap_err(), ServiceError::NotFound);
    }
}
