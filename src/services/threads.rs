use crate::access::{AccessControl, Permission, PermissionContext};
use crate::cache::{Cache, keys};
use crate::domain::auth::AuthenticatedUser;
use crate::domain::forum::Forum;
use crate::domain::thread::{NewThread, Thread, ThreadCreated, ThreadDeleted, ThreadMoved};
use crate::domain::types::{ForumId, ThreadId};
use crate::forms::moves::MoveThreadFormPayload;
use crate::forms::threads::CreateThreadFormPayload;
use crate::repository::{
    DEFAULT_ITEMS_PER_PAGE, ForumReader, ThreadListQuery, ThreadReader, ThreadViewWriter,
    ThreadWriter,
};

use super::{
    Invalidation, ServiceError, ServiceResult, authorize, now, repository_failure, require_user,
};

/// Load a forum the caller may see. Hidden forums are only shown to forum
/// managers.
pub(crate) fn visible_forum<R, A>(
    forum_id: ForumId,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
) -> ServiceResult<Forum>
where
    R: ForumReader,
    A: AccessControl,
{
    let forum = repo
        .get_forum_by_id(forum_id)
        .map_err(|e| repository_failure("Load forum", forum_id, e))?
        .ok_or(ServiceError::NotFound)?;
    if !forum.visible && !access.can(user, Permission::ManageForum, PermissionContext::None) {
        return Err(ServiceError::NotFound);
    }
    Ok(forum)
}

pub(crate) fn load_thread<R: ThreadReader>(repo: &R, thread_id: ThreadId) -> ServiceResult<Thread> {
    repo.get_thread_by_id(thread_id)
        .map_err(|e| repository_failure("Load thread", thread_id, e))?
        .ok_or(ServiceError::NotFound)
}

/// Threads of a forum, pinned first.
pub fn show_threads<R, A>(
    forum_id: ForumId,
    page: usize,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
) -> ServiceResult<(Forum, usize, Vec<Thread>)>
where
    R: ForumReader + ThreadReader,
    A: AccessControl,
{
    let forum = visible_forum(forum_id, user, repo, access)?;

    let query = ThreadListQuery::default()
        .forum(forum_id)
        .paginate(page, DEFAULT_ITEMS_PER_PAGE);
    let (total, threads) = repo
        .list_threads(query)
        .map_err(|e| repository_failure("List threads", forum_id, e))?;

    Ok((forum, total, threads))
}

pub fn create_thread<R, A, C>(
    payload: CreateThreadFormPayload,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
    cache: &C,
) -> ServiceResult<ThreadCreated>
where
    R: ForumReader + ThreadWriter + ThreadViewWriter,
    A: AccessControl,
    C: Cache,
{
    let author_id = require_user(user)?;
    authorize(access, user, Permission::CreateThread, PermissionContext::None)?;
    let forum = visible_forum(payload.forum_id, user, repo, access)?;

    let new_thread = NewThread {
        forum_id: forum.id,
        name: payload.name,
        author_id,
        content: payload.content,
        subscribe: payload.subscribe,
        created_at: now(),
    };
    let created = repo
        .create_thread(&new_thread)
        .map_err(|e| repository_failure("Create thread", forum.id, e))?;

    if let Err(e) = repo.mark_post_seen(author_id, created.post_id) {
        log::error!("Failed to mark post {} seen: {e}", created.post_id);
    }
    Invalidation::new(cache)
        .key(keys::FORUM_THREADS_COUNT)
        .key(keys::FORUM_POSTS_COUNT)
        .key(keys::FORUM_LATEST_POSTS)
        .element(keys::USER_THREADS_COUNT, author_id)
        .element(keys::USER_POSTS_COUNT, author_id);
    log::info!(target: "forum", "Thread created: {}", created.thread_id);

    Ok(created)
}

/// Flip the lock flag; returns the new state.
pub fn toggle_lock<R, A>(
    thread_id: ThreadId,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
) -> ServiceResult<bool>
where
    R: ThreadReader + ThreadWriter,
    A: AccessControl,
{
    require_user(user)?;
    let thread = load_thread(repo, thread_id)?;
    authorize(access, user, Permission::LockThread, PermissionContext::Thread(&thread))?;

    let locked = !thread.locked;
    repo.set_thread_locked(thread_id, locked)
        .map_err(|e| repository_failure("Lock thread", thread_id, e))?;

    if locked {
        log::info!(target: "forum", "Thread locked: {thread_id}");
    } else {
        log::info!(target: "forum", "Thread unlocked: {thread_id}");
    }
    Ok(locked)
}

/// Flip the pin flag; returns the new state.
pub fn toggle_pin<R, A>(
    thread_id: ThreadId,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
) -> ServiceResult<bool>
where
    R: ThreadReader + ThreadWriter,
    A: AccessControl,
{
    require_user(user)?;
    let thread = load_thread(repo, thread_id)?;
    authorize(access, user, Permission::PinThread, PermissionContext::Thread(&thread))?;

    let pinned = !thread.pinned;
    repo.set_thread_pinned(thread_id, pinned)
        .map_err(|e| repository_failure("Pin thread", thread_id, e))?;

    if pinned {
        log::info!(target: "forum", "Thread pinned: {thread_id}");
    } else {
        log::info!(target: "forum", "Thread unpinned: {thread_id}");
    }
    Ok(pinned)
}

pub fn move_thread<R, A, C>(
    payload: MoveThreadFormPayload,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
    cache: &C,
) -> ServiceResult<ThreadMoved>
where
    R: ForumReader + ThreadReader + ThreadWriter,
    A: AccessControl,
    C: Cache,
{
    require_user(user)?;
    let thread = load_thread(repo, payload.thread_id)?;
    authorize(access, user, Permission::MoveThread, PermissionContext::Thread(&thread))?;
    if thread.forum_id == payload.forum_id {
        return Err(ServiceError::Conflict(
            "thread already belongs to this forum".to_owned(),
        ));
    }
    repo.get_forum_by_id(payload.forum_id)
        .map_err(|e| repository_failure("Load forum", payload.forum_id, e))?
        .ok_or(ServiceError::NotFound)?;

    let moved = repo
        .move_thread(payload.thread_id, payload.forum_id)
        .map_err(|e| repository_failure("Move thread", payload.thread_id, e))?;

    Invalidation::new(cache).key(keys::FORUM_LATEST_POSTS);
    log::info!(
        target: "forum",
        "Thread moved: {} from forum {} to forum {}",
        moved.thread_id,
        moved.from_forum,
        moved.to_forum
    );
    Ok(moved)
}

pub fn delete_thread<R, A, C>(
    thread_id: ThreadId,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
    cache: &C,
) -> ServiceResult<ThreadDeleted>
where
    R: ThreadReader + ThreadWriter,
    A: AccessControl,
    C: Cache,
{
    require_user(user)?;
    let thread = load_thread(repo, thread_id)?;
    authorize(access, user, Permission::DeleteThread, PermissionContext::Thread(&thread))?;

    let deleted = repo
        .delete_thread(thread_id)
        .map_err(|e| repository_failure("Delete thread", thread_id, e))?;

    Invalidation::new(cache)
        .key(keys::FORUM_THREADS_COUNT)
        .key(keys::FORUM_POSTS_COUNT)
        .key(keys::FORUM_LATEST_POSTS)
        .key(keys::USER_POSTS_COUNT)
        .element(keys::USER_THREADS_COUNT, thread.author_id);
    log::info!(target: "forum", "Thread deleted: {thread_id}");
    Ok(deleted)
}
