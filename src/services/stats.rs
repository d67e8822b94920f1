//! Aggregates read through the cache and recomputed on a miss.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::{Cache, CacheExt, keys};
use crate::domain::auth::AuthenticatedUser;
use crate::domain::post::LatestPost;
use crate::domain::types::UserId;
use crate::repository::{PostReader, ThreadReader};

use super::{ServiceResult, repository_failure};

/// Cached value lookup. A failing cache falls back to the repository.
fn read_through<C, T, F>(cache: &C, key: &str, element: Option<&str>, load: F) -> ServiceResult<T>
where
    C: Cache,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> ServiceResult<T>,
{
    let cached = match element {
        Some(element) => cache.get_element_as::<T>(key, element),
        None => cache.get_as::<T>(key),
    };
    match cached {
        Ok(Some(value)) => return Ok(value),
        Ok(None) => {}
        Err(e) => log::warn!("Failed to read cache key {key}: {e}"),
    }

    let value = load()?;
    let stored = match element {
        Some(element) => cache.set_element_as(key, element, &value),
        None => cache.set_as(key, &value),
    };
    if let Err(e) = stored {
        log::warn!("Failed to store cache key {key}: {e}");
    }
    Ok(value)
}

pub fn thread_count<R, C>(repo: &R, cache: &C) -> ServiceResult<usize>
where
    R: ThreadReader,
    C: Cache,
{
    read_through(cache, keys::FORUM_THREADS_COUNT, None, || {
        repo.count_threads(None)
            .map_err(|e| repository_failure("Count threads", "all", e))
    })
}

pub fn post_count<R, C>(repo: &R, cache: &C) -> ServiceResult<usize>
where
    R: PostReader,
    C: Cache,
{
    read_through(cache, keys::FORUM_POSTS_COUNT, None, || {
        repo.count_posts(None)
            .map_err(|e| repository_failure("Count posts", "all", e))
    })
}

/// Threads started by `user_id`.
pub fn user_thread_count<R, C>(user_id: UserId, repo: &R, cache: &C) -> ServiceResult<usize>
where
    R: ThreadReader,
    C: Cache,
{
    let element = user_id.to_string();
    read_through(cache, keys::USER_THREADS_COUNT, Some(&element), || {
        repo.count_threads(Some(user_id))
            .map_err(|e| repository_failure("Count threads", user_id, e))
    })
}

/// Posts written by `user_id`.
pub fn user_post_count<R, C>(user_id: UserId, repo: &R, cache: &C) -> ServiceResult<usize>
where
    R: PostReader,
    C: Cache,
{
    let element = user_id.to_string();
    read_through(cache, keys::USER_POSTS_COUNT, Some(&element), || {
        repo.count_posts(Some(user_id))
            .map_err(|e| repository_failure("Count posts", user_id, e))
    })
}

/// Newest posts, cached separately for guests and members. Guests only see
/// posts in visible forums of visible categories.
pub fn latest_posts<R, C>(
    limit: i64,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    cache: &C,
) -> ServiceResult<Vec<LatestPost>>
where
    R: PostReader,
    C: Cache,
{
    let (element, visible_only) = match user {
        Some(_) => (keys::LATEST_MEMBER, false),
        None => (keys::LATEST_GUEST, true),
    };
    read_through(cache, keys::FORUM_LATEST_POSTS, Some(element), || {
        repo.list_latest_posts(limit, visible_only)
            .map_err(|e| repository_failure("List latest posts", element, e))
    })
}
