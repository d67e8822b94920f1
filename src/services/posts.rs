use std::collections::BTreeSet;

use crate::access::{AccessControl, Permission, PermissionContext};
use crate::cache::{Cache, keys};
use crate::domain::auth::AuthenticatedUser;
use crate::domain::post::{
    MoveDestination, NewReply, Post, PostEdit, PostKind, PostsDeleted, PostsMove, PostsMoved,
    ReplyOutcome,
};
use crate::domain::thread::Thread;
use crate::domain::types::{PostId, ThreadId, UserId};
use crate::forms::moves::{MovePostsFormPayload, MoveTarget};
use crate::forms::posts::{DeletePostsFormPayload, EditPostFormPayload, ReplyFormPayload};
use crate::repository::{
    DEFAULT_ITEMS_PER_PAGE, ForumReader, PostListQuery, PostReader, PostWriter,
    SubscriptionWriter, ThreadReader, ThreadViewWriter,
};

use super::threads::load_thread;
use super::{
    Invalidation, ServiceError, ServiceResult, authorize, now, repository_failure, require_user,
};

fn load_post<R: PostReader>(repo: &R, post_id: PostId) -> ServiceResult<Post> {
    repo.get_post_by_id(post_id)
        .map_err(|e| repository_failure("Load post", post_id, e))?
        .ok_or(ServiceError::NotFound)
}

/// Locked threads only accept writes from members who may update the thread.
fn ensure_writable<A: AccessControl>(
    access: &A,
    user: Option<&AuthenticatedUser>,
    thread: &Thread,
) -> ServiceResult<()> {
    if thread.locked {
        authorize(access, user, Permission::UpdateThread, PermissionContext::Thread(thread))?;
    }
    Ok(())
}

/// Passes with either the general permission or its "own post" variant.
fn authorize_any<A: AccessControl>(
    access: &A,
    user: Option<&AuthenticatedUser>,
    any: Permission,
    own: Permission,
    post: &Post,
) -> ServiceResult<()> {
    let context = PermissionContext::Post(post);
    if access.can(user, any, context) {
        return Ok(());
    }
    authorize(access, user, own, context)
}

fn mark_seen<R: ThreadViewWriter>(repo: &R, user_id: UserId, post_id: PostId) {
    if let Err(e) = repo.mark_post_seen(user_id, post_id) {
        log::error!("Failed to mark post {post_id} seen: {e}");
    }
}

/// Posts of a thread in ascending order.
pub fn show_posts<R, A>(
    thread_id: ThreadId,
    page: usize,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
) -> ServiceResult<(Thread, usize, Vec<Post>)>
where
    R: ForumReader + ThreadReader + PostReader,
    A: AccessControl,
{
    let thread = load_thread(repo, thread_id)?;
    super::threads::visible_forum(thread.forum_id, user, repo, access)?;

    let query = PostListQuery::default()
        .thread(thread_id)
        .paginate(page, DEFAULT_ITEMS_PER_PAGE);
    let (total, posts) = repo
        .list_posts(query)
        .map_err(|e| repository_failure("List posts", thread_id, e))?;

    Ok((thread, total, posts))
}

/// A single post. Signed-in readers have it marked as seen.
pub fn show_post<R>(
    post_id: PostId,
    user: Option<&AuthenticatedUser>,
    repo: &R,
) -> ServiceResult<Post>
where
    R: PostReader + ThreadViewWriter,
{
    let post = load_post(repo, post_id)?;
    if user.is_some() {
        let user_id = require_user(user)?;
        mark_seen(repo, user_id, post.id);
    }
    Ok(post)
}

pub fn create_reply<R, A, C>(
    payload: ReplyFormPayload,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
    cache: &C,
) -> ServiceResult<ReplyOutcome>
where
    R: ThreadReader + PostWriter + ThreadViewWriter + SubscriptionWriter,
    A: AccessControl,
    C: Cache,
{
    let author_id = require_user(user)?;
    let thread = load_thread(repo, payload.thread_id)?;
    authorize(access, user, Permission::CreatePost, PermissionContext::Thread(&thread))?;
    ensure_writable(access, user, &thread)?;

    let reply = NewReply {
        thread_id: thread.id,
        author_id,
        content: payload.content,
        subscribe: payload.subscribe,
        created_at: now(),
    };
    let outcome = repo
        .create_reply(&reply)
        .map_err(|e| repository_failure("Create reply", thread.id, e))?;

    if let Err(e) = repo.notify_subscribers(thread.id, author_id) {
        log::error!("Failed to notify subscribers of thread {}: {e}", thread.id);
    }
    mark_seen(repo, author_id, outcome.post_id());

    match outcome {
        ReplyOutcome::Created(post_id) => {
            Invalidation::new(cache)
                .key(keys::FORUM_POSTS_COUNT)
                .key(keys::FORUM_LATEST_POSTS)
                .element(keys::USER_POSTS_COUNT, author_id);
            log::info!(target: "forum", "Reply created: {post_id}");
        }
        ReplyOutcome::Merged(post_id) => {
            log::info!(target: "forum", "Reply merged into post: {post_id}");
        }
    }
    Ok(outcome)
}

/// Edit a post. The first post of a thread also carries the thread topic.
pub fn edit_post<R, A, C>(
    payload: EditPostFormPayload,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
    cache: &C,
) -> ServiceResult<PostKind>
where
    R: ThreadReader + PostReader + PostWriter + ThreadViewWriter,
    A: AccessControl,
    C: Cache,
{
    let editor_id = require_user(user)?;
    let post = load_post(repo, payload.post_id)?;
    let thread = load_thread(repo, post.thread_id)?;
    authorize_any(access, user, Permission::UpdatePost, Permission::UpdateOwnPost, &post)?;
    ensure_writable(access, user, &thread)?;

    let first = repo
        .get_first_post(thread.id)
        .map_err(|e| repository_failure("Load first post", thread.id, e))?
        .ok_or(ServiceError::NotFound)?;
    let kind = if first.id == post.id {
        PostKind::FirstPost
    } else {
        PostKind::Reply
    };

    let topic = match kind {
        PostKind::FirstPost => Some(
            payload
                .topic
                .ok_or_else(|| ServiceError::Form("topic is required".to_owned()))?,
        ),
        PostKind::Reply => None,
    };

    let edit = PostEdit {
        post_id: post.id,
        content: payload.content,
        topic,
        edited_at: now(),
    };
    repo.edit_post(&edit)
        .map_err(|e| repository_failure("Edit post", post.id, e))?;

    mark_seen(repo, editor_id, post.id);
    if kind == PostKind::FirstPost {
        Invalidation::new(cache).key(keys::FORUM_LATEST_POSTS);
    }
    log::info!(target: "forum", "Post updated: {}", post.id);
    Ok(kind)
}

pub fn delete_posts<R, A, C>(
    payload: DeletePostsFormPayload,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
    cache: &C,
) -> ServiceResult<PostsDeleted>
where
    R: ThreadReader + PostReader + PostWriter,
    A: AccessControl,
    C: Cache,
{
    require_user(user)?;
    let thread = load_thread(repo, payload.thread_id)?;
    ensure_writable(access, user, &thread)?;

    let mut authors = BTreeSet::new();
    for post_id in &payload.post_ids {
        let post = load_post(repo, *post_id)?;
        if post.thread_id != thread.id {
            return Err(ServiceError::NotFound);
        }
        authorize_any(access, user, Permission::DeletePost, Permission::DeleteOwnPost, &post)?;
        authors.insert(post.author_id);
    }

    let deleted = repo
        .delete_posts(thread.id, &payload.post_ids)
        .map_err(|e| repository_failure("Delete posts", thread.id, e))?;

    let mut invalidation = Invalidation::new(cache)
        .key(keys::FORUM_POSTS_COUNT)
        .key(keys::FORUM_LATEST_POSTS);
    for author in authors {
        invalidation = invalidation.element(keys::USER_POSTS_COUNT, author);
    }
    if deleted.thread_deleted {
        invalidation
            .key(keys::FORUM_THREADS_COUNT)
            .element(keys::USER_THREADS_COUNT, thread.author_id);
        log::info!(target: "forum", "Thread deleted with its last post: {}", thread.id);
    }
    log::info!(
        target: "forum",
        "Posts deleted from thread {}: {}",
        thread.id,
        deleted.deleted
    );
    Ok(deleted)
}

pub fn move_posts<R, A, C>(
    payload: MovePostsFormPayload,
    user: Option<&AuthenticatedUser>,
    repo: &R,
    access: &A,
    cache: &C,
) -> ServiceResult<PostsMoved>
where
    R: ForumReader + ThreadReader + PostReader + PostWriter,
    A: AccessControl,
    C: Cache,
{
    require_user(user)?;
    let source = load_thread(repo, payload.thread_id)?;
    authorize(access, user, Permission::MovePost, PermissionContext::Thread(&source))?;
    if payload.post_ids.is_empty() {
        return Err(ServiceError::Conflict("no posts selected".to_owned()));
    }

    let mut first_author = None;
    for post_id in payload.post_ids.iter().collect::<BTreeSet<_>>() {
        let post = load_post(repo, *post_id)?;
        if post.thread_id != source.id {
            return Err(ServiceError::NotFound);
        }
        first_author.get_or_insert(post.author_id);
    }
    let first_author = first_author.ok_or(ServiceError::NotFound)?;

    let destination = match payload.target {
        MoveTarget::Existing(thread_id) => {
            if thread_id == source.id {
                return Err(ServiceError::Conflict(
                    "posts already belong to this thread".to_owned(),
                ));
            }
            load_thread(repo, thread_id)?;
            MoveDestination::Existing(thread_id)
        }
        MoveTarget::NewThread { name, forum_id } => {
            repo.get_forum_by_id(forum_id)
                .map_err(|e| repository_failure("Load forum", forum_id, e))?
                .ok_or(ServiceError::NotFound)?;
            MoveDestination::NewThread {
                name,
                forum_id,
                author_id: first_author,
            }
        }
    };
    let creates_thread = matches!(destination, MoveDestination::NewThread { .. });

    let request = PostsMove {
        source: source.id,
        post_ids: payload.post_ids,
        destination,
        moved_at: now(),
    };
    let moved = repo
        .move_posts(&request)
        .map_err(|e| repository_failure("Move posts", source.id, e))?;

    let invalidation = Invalidation::new(cache).key(keys::FORUM_LATEST_POSTS);
    if creates_thread || moved.source_deleted {
        invalidation
            .key(keys::FORUM_THREADS_COUNT)
            .key(keys::USER_THREADS_COUNT);
    }
    log::info!(
        target: "forum",
        "Posts moved from thread {} to thread {}: {}",
        moved.source,
        moved.destination,
        moved.moved
    );
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::RoleAccessControl;
    use crate::cache::InMemoryCache;
    use crate::domain::subscription::PostSeen;
    use crate::domain::types::{ForumId, ThreadName};
    use crate::forms::threads::CreateThreadFormPayload;
    use crate::repository::test::TestRepository;
    use crate::services::test_support::{content, member, moderator, new_thread, uid};
    use crate::services::threads::create_thread;

    fn seeded(forum_id: ForumId, repo: &TestRepository, author: i32) -> (ThreadId, PostId) {
        let payload: CreateThreadFormPayload = new_thread(forum_id, "Topic", "first post body");
        let created = create_thread(
            payload,
            Some(&member(author)),
            repo,
            &RoleAccessControl,
            &InMemoryCache::new(),
        )
        .unwrap();
        (created.thread_id, created.post_id)
    }

    fn reply(thread_id: ThreadId, body: &str) -> ReplyFormPayload {
        ReplyFormPayload {
            thread_id,
            content: content(body),
            subscribe: false,
        }
    }

    #[test]
    fn consecutive_reply_merges_into_previous_post() {
        let repo = TestRepository::new();
        let forum_id = repo.seed_forum(true);
        let (thread_id, first_post) = seeded(forum_id, &repo, 7);
        let cache = InMemoryCache::new();

        let outcome = create_reply(
            reply(thread_id, "second thoughts here"),
            Some(&member(7)),
            &repo,
            &RoleAccessControl,
            &cache,
        )
        .unwrap();

        assert_eq!(outcome, ReplyOutcome::Merged(first_post));
        let posts = repo.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].content.as_str(), "first post body<hr>second thoughts here");
        assert!(posts[0].edited);
        assert_eq!(repo.threads()[0].posts.get(), 1);
        assert_eq!(repo.forums()[0].posts.get(), 1);
    }

    #[test]
    fn reply_from_other_member_notifies_subscribers() {
        let repo = TestRepository::new();
        let forum_id = repo.seed_forum(true);
        let (thread_id, _) = seeded(forum_id, &repo, 7);
        let cache = InMemoryCache::new();

        let outcome = create_reply(
            reply(thread_id, "a different voice"),
            Some(&member(8)),
            &repo,
            &RoleAccessControl,
            &cache,
        )
        .unwrap();

        assert!(matches!(outcome, ReplyOutcome::Created(_)));
        assert_eq!(repo.threads()[0].posts.get(), 2);
        assert_eq!(repo.forums()[0].posts.get(), 2);
        let subscription = &repo.subscriptions()[0];
        assert_eq!(subscription.user_id, uid(7));
        assert_eq!(subscription.post_seen, PostSeen::New);
    }

    #[test]
    fn locked_thread_rejects_member_replies() {
        let repo = TestRepository::new();
        let forum_id = repo.seed_forum(true);
        let (thread_id, _) = seeded(forum_id, &repo, 7);
        crate::services::threads::toggle_lock(
            thread_id,
            Some(&moderator(2)),
            &repo,
            &RoleAccessControl,
        )
        .unwrap();

        let result = create_reply(
            reply(thread_id, "a different voice"),
            Some(&member(8)),
            &repo,
            &RoleAccessControl,
            &InMemoryCache::new(),
        );
        assert_eq!(result.unwrap_err(), ServiceError::Unauthorized);
    }

    #[test]
    fn editing_first_post_requires_topic_and_renames_thread() {
        let repo = TestRepository::new();
        let forum_id = repo.seed_forum(true);
        let (_, post_id) = seeded(forum_id, &repo, 7);
        let cache = InMemoryCache::new();
        let author = member(7);

        let missing = edit_post(
            EditPostFormPayload {
                post_id,
                content: content("rewritten body text"),
                topic: None,
            },
            Some(&author),
            &repo,
            &RoleAccessControl,
            &cache,
        );
        assert!(matches!(missing, Err(ServiceError::Form(_))));

        let kind = edit_post(
            EditPostFormPayload {
                post_id,
                content: content("rewritten body text"),
                topic: Some(ThreadName::new("New Topic").unwrap()),
            },
            Some(&author),
            &repo,
            &RoleAccessControl,
            &cache,
        )
        .unwrap();
        assert_eq!(kind, PostKind::FirstPost);
        let thread = &repo.threads()[0];
        assert_eq!(thread.name.as_str(), "New Topic");
        assert_eq!(thread.slug.as_str(), "new-topic");
    }

    #[test]
    fn members_cannot_edit_foreign_posts() {
        let repo = TestRepository::new();
        let forum_id = repo.seed_forum(true);
        let (_, post_id) = seeded(forum_id, &repo, 7);

        let result = edit_post(
            EditPostFormPayload {
                post_id,
                content: content("hijacked content"),
                topic: Some(ThreadName::new("Mine").unwrap()),
            },
            Some(&member(8)),
            &repo,
            &RoleAccessControl,
            &InMemoryCache::new(),
        );
        assert_eq!(result.unwrap_err(), ServiceError::Unauthorized);
    }

    #[test]
    fn deleting_last_post_removes_thread() {
        let repo = TestRepository::new();
        let forum_id = repo.seed_forum(true);
        let (thread_id, post_id) = seeded(forum_id, &repo, 7);

        let deleted = delete_posts(
            DeletePostsFormPayload {
                thread_id,
                post_ids: vec![post_id],
            },
            Some(&member(7)),
            &repo,
            &RoleAccessControl,
            &InMemoryCache::new(),
        )
        .unwrap();

        assert!(deleted.thread_deleted);
        assert!(repo.threads().is_empty());
        let forum = &repo.forums()[0];
        assert_eq!((forum.threads.get(), forum.posts.get()), (0, 0));
    }

    #[test]
    fn moving_every_post_deletes_source_thread() {
        let repo = TestRepository::new();
        let source_forum = repo.seed_forum(true);
        let target_forum = repo.seed_forum(true);
        let (source, _) = seeded(source_forum, &repo, 7);
        create_reply(
            reply(source, "another member answers"),
            Some(&member(8)),
            &repo,
            &RoleAccessControl,
            &InMemoryCache::new(),
        )
        .unwrap();
        let (destination, _) = seeded(target_forum, &repo, 9);
        let post_ids: Vec<PostId> = repo
            .posts()
            .iter()
            .filter(|p| p.thread_id == source)
            .map(|p| p.id)
            .collect();

        let moved = move_posts(
            MovePostsFormPayload {
                thread_id: source,
                post_ids,
                target: MoveTarget::Existing(destination),
            },
            Some(&moderator(2)),
            &repo,
            &RoleAccessControl,
            &InMemoryCache::new(),
        )
        .unwrap();

        assert!(moved.source_deleted);
        assert_eq!(moved.moved.get(), 2);
        let forums = repo.forums();
        assert_eq!((forums[0].threads.get(), forums[0].posts.get()), (0, 0));
        assert_eq!((forums[1].threads.get(), forums[1].posts.get()), (1, 3));
        assert_eq!(repo.threads()[0].posts.get(), 3);
    }

    #[test]
    fn moving_to_same_thread_is_a_conflict() {
        let repo = TestRepository::new();
        let forum_id = repo.seed_forum(true);
        let (thread_id, post_id) = seeded(forum_id, &repo, 7);

        let result = move_posts(
            MovePostsFormPayload {
                thread_id,
                post_ids: vec![post_id],
                target: MoveTarget::Existing(thread_id),
            },
            Some(&moderator(2)),
            &repo,
            &RoleAccessControl,
            &InMemoryCache::new(),
        );
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }
}
