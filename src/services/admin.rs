//! Category and forum administration plus counter maintenance.

use crate::access::{AccessControl, Permission, PermissionContext};
use crate::cache::{Cache, keys};
use crate::domain::auth::AuthenticatedUser;
use crate::domain::category::Category;
use crate::domain::forum::Forum;
use crate::domain::types::{CategoryId, ForumId};
use crate::forms::categories::{AddCategoryFormPayload, SortForm, UpdateCategoryFormPayload};
use crate::forms::forums::{AddForumFormPayload, UpdateForumFormPayload};
use crate::repository::{
    CategoryListQuery, CategoryReader, CategoryWriter, CounterMaintenance, ForumListQuery,
    ForumReader, ForumWriter,
};

use super::{Invalidation, ServiceError, ServiceResult, authorize, now, repository_failure};

fn require_manager<A: AccessControl>(
    user: Option<&AuthenticatedUser>,
    access: &A,
) -> ServiceResult<()> {
    authorize(access, user, Permission::ManageForum, PermissionContext::None)
}

/// Aggregates that change whenever a whole subtree disappears. The
/// per-member buckets are dropped whole since the removed authors are not
/// known after the delete.
fn invalidate_aggregates<C: Cache>(cache: &C) {
    Invalidation::new(cache)
        .key(keys::FORUM_THREADS_COUNT)
        .key(keys::FORUM_POSTS_COUNT)
        .key(keys::FORUM_LATEST_POSTS)
        .key(keys::USER_THREADS_COUNT)
        .key(keys::USER_POSTS_COUNT);
}

/// The guest latest-posts list depends on visibility flags.
fn invalidate_on_visibility<C: Cache>(cache: &C, before: bool, after: bool) {
    if before != after {
        Invalidation::new(cache).key(keys::FORUM_LATEST_POSTS);
    }
}

fn expect_updated(updated: usize) -> ServiceResult<()> {
    if updated == 0 {
        return Err(ServiceError::NotFound);
    }
    Ok(())
}

/// Categories ordered by sort position. Hidden ones are only listed for
/// forum managers.
pub fn list_categories<R, A>(
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
) -> ServiceResult<Vec<Category>>
where
    R: CategoryReader,
    A: AccessControl,
{
    let mut query = CategoryListQuery::default();
    if !access.can(user, Permission::ManageForum, PermissionContext::None) {
        query = query.visible_only();
    }

    let (_total, categories) = repo
        .list_categories(query)
        .map_err(|e| repository_failure("List categories", "all", e))?;
    Ok(categories)
}

pub fn add_category<R, A>(
    payload: AddCategoryFormPayload,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
) -> ServiceResult<Category>
where
    R: CategoryWriter,
    A: AccessControl,
{
    require_manager(user, access)?;

    let name = payload.name.clone();
    let category = repo
        .create_category(&payload.into_new_category(now()))
        .map_err(|e| repository_failure("Create category", name, e))?;

    log::info!(target: "forum", "Category created: {}", category.id);
    Ok(category)
}

pub fn update_category<R, A, C>(
    payload: UpdateCategoryFormPayload,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
    cache: &C,
) -> ServiceResult<()>
where
    R: CategoryReader + CategoryWriter,
    A: AccessControl,
    C: Cache,
{
    require_manager(user, access)?;

    let current = repo
        .get_category_by_id(payload.category_id)
        .map_err(|e| repository_failure("Update category", payload.category_id, e))?
        .ok_or(ServiceError::NotFound)?;

    let updated = repo
        .update_category(payload.category_id, &payload.update)
        .map_err(|e| repository_failure("Update category", payload.category_id, e))?;
    expect_updated(updated)?;

    invalidate_on_visibility(cache, current.visible, payload.update.visible);
    log::info!(target: "forum", "Category updated: {}", payload.category_id);
    Ok(())
}

pub fn sort_category<R, A>(
    form: SortForm,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
) -> ServiceResult<()>
where
    R: CategoryWriter,
    A: AccessControl,
{
    require_manager(user, access)?;
    let (id, sort) = form.into_parts()?;
    let category_id = CategoryId::new(id)?;

    let updated = repo
        .set_category_sort(category_id, sort)
        .map_err(|e| repository_failure("Sort category", category_id, e))?;
    expect_updated(updated)
}

/// Delete a category with its forums, threads and posts.
pub fn delete_category<R, A, C>(
    category_id: CategoryId,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
    cache: &C,
) -> ServiceResult<()>
where
    R: CategoryWriter,
    A: AccessControl,
    C: Cache,
{
    require_manager(user, access)?;

    let deleted = repo
        .delete_category(category_id)
        .map_err(|e| repository_failure("Delete category", category_id, e))?;
    expect_updated(deleted)?;

    invalidate_aggregates(cache);
    log::info!(target: "forum", "Category deleted: {category_id}");
    Ok(())
}

/// Forums of a category ordered by sort position.
pub fn list_forums<R, A>(
    category_id: CategoryId,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
) -> ServiceResult<Vec<Forum>>
where
    R: ForumReader,
    A: AccessControl,
{
    let mut query = ForumListQuery::default().category(category_id);
    if !access.can(user, Permission::ManageForum, PermissionContext::None) {
        query = query.visible_only();
    }

    let (_total, forums) = repo
        .list_forums(query)
        .map_err(|e| repository_failure("List forums", category_id, e))?;
    Ok(forums)
}

pub fn add_forum<R, A>(
    payload: AddForumFormPayload,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
) -> ServiceResult<Forum>
where
    R: ForumWriter,
    A: AccessControl,
{
    require_manager(user, access)?;

    let category_id = payload.category_id;
    let forum = repo
        .create_forum(&payload.into_new_forum(now()))
        .map_err(|e| repository_failure("Create forum", category_id, e))?;

    log::info!(target: "forum", "Forum created: {}", forum.id);
    Ok(forum)
}

pub fn update_forum<R, A, C>(
    payload: UpdateForumFormPayload,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
    cache: &C,
) -> ServiceResult<()>
where
    R: ForumReader + ForumWriter,
    A: AccessControl,
    C: Cache,
{
    require_manager(user, access)?;

    let current = repo
        .get_forum_by_id(payload.forum_id)
        .map_err(|e| repository_failure("Update forum", payload.forum_id, e))?
        .ok_or(ServiceError::NotFound)?;

    let updated = repo
        .update_forum(payload.forum_id, &payload.update)
        .map_err(|e| repository_failure("Update forum", payload.forum_id, e))?;
    expect_updated(updated)?;

    invalidate_on_visibility(cache, current.visible, payload.update.visible);
    log::info!(target: "forum", "Forum updated: {}", payload.forum_id);
    Ok(())
}

pub fn sort_forum<R, A>(
    form: SortForm,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
) -> ServiceResult<()>
where
    R: ForumWriter,
    A: AccessControl,
{
    require_manager(user, access)?;
    let (id, sort) = form.into_parts()?;
    let forum_id = ForumId::new(id)?;

    let updated = repo
        .set_forum_sort(forum_id, sort)
        .map_err(|e| repository_failure("Sort forum", forum_id, e))?;
    expect_updated(updated)
}

pub fn delete_forum<R, A, C>(
    forum_id: ForumId,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
    cache: &C,
) -> ServiceResult<()>
where
    R: ForumWriter,
    A: AccessControl,
    C: Cache,
{
    require_manager(user, access)?;

    let deleted = repo
        .delete_forum(forum_id)
        .map_err(|e| repository_failure("Delete forum", forum_id, e))?;
    expect_updated(deleted)?;

    invalidate_aggregates(cache);
    log::info!(target: "forum", "Forum deleted: {forum_id}");
    Ok(())
}

/// Recompute every denormalized counter and drop all cached aggregates.
pub fn recount_counters<R, A, C>(
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
    cache: &C,
) -> ServiceResult<usize>
where
    R: CounterMaintenance,
    A: AccessControl,
    C: Cache,
{
    require_manager(user, access)?;

    let updated = repo
        .recount_counters()
        .map_err(|e| repository_failure("Recount counters", "all", e))?;
    if let Err(e) = cache.flush() {
        log::warn!("Failed to flush cache after recount: {e}");
    }

    log::info!(target: "forum", "Counters recounted: {updated}");
    Ok(updated)
}
