use crate::domain::auth::AuthenticatedUser;
use crate::domain::thread::Thread;
use crate::repository::{
    DEFAULT_ITEMS_PER_PAGE, ThreadViewReader, ThreadViewWriter, UnreadThreadsQuery,
};

use super::{ServiceResult, now, repository_failure, require_user};

/// Threads the member has never opened or that changed since, oldest
/// activity first.
pub fn unread_threads<R>(
    page: usize,
    user: Option<&AuthenticatedUser>,
    repo: &R,
) -> ServiceResult<(usize, Vec<Thread>)>
where
    R: ThreadViewReader,
{
    let user_id = require_user(user)?;

    let query = UnreadThreadsQuery::new(user_id).paginate(page, DEFAULT_ITEMS_PER_PAGE);
    repo.list_unread_threads(query)
        .map_err(|e| repository_failure("List unread threads", user_id, e))
}

/// Mark every thread as read for the member. Returns the number of threads
/// touched.
pub fn mark_all_seen<R>(user: Option<&AuthenticatedUser>, repo: &R) -> ServiceResult<usize>
where
    R: ThreadViewWriter,
{
    let user_id = require_user(user)?;

    let touched = repo
        .mark_all_seen(user_id, now())
        .map_err(|e| repository_failure("Mark all seen", user_id, e))?;

    log::info!(target: "forum", "All threads marked seen for member {user_id}: {touched}");
    Ok(touched)
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
    fn new_member_sees_everything_unread_until_marked() {
        let repo = TestRepository::new();
        let forum_id = repo.seed_forum(true);
        for name in ["One", "Two"] {
            create_thread(
                new_thread(forum_id, name, "first post body"),
                Some(&member(7)),
                &repo,
                &RoleAccessControl,
                &InMemoryCache::new(),
            )
            .unwrap();
        }
        let reader = member(8);

        let (total, threads) = unread_threads(1, Some(&reader), &repo).unwrap();
        assert_eq!(total, 2);
        assert_eq!(threads[0].name.as_str(), "One");

        let (total, _) = unread_threads(1, Some(&member(7)), &repo).unwrap();
        assert_eq!(total, 0);

        assert_eq!(mark_all_seen(Some(&reader), &repo).unwrap(), 2);
        let (total, _) = unread_threads(1, Some(&reader), &repo).unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn guests_have_no_read_state() {
        let repo = TestRepository::new();
        assert_eq!(
            unread_threads(1, None, &repo).unwrap_err(),
            ServiceError::Unauthenticated
        );
    }
}
