use crate::domain::auth::AuthenticatedUser;
use crate::domain::post::Post;
use crate::forms::search::SearchFormPayload;
use crate::repository::{PostReader, PostSearchQuery};

use super::{ServiceResult, repository_failure};

/// Posts linked to any of the query words, newest first. Guests only see
/// posts in visible forums of visible categories.
pub fn search_posts<R>(
    payload: SearchFormPayload,
    user: Option<&AuthenticatedUser>,
    repo: &R,
) -> ServiceResult<(usize, Vec<Post>)>
where
    R: PostReader,
{
    let words = payload.words.join(" ");
    let mut query =
        PostSearchQuery::new(payload.words).paginate(payload.page, payload.per_page);
    if user.is_none() {
        query = query.visible_only();
    }

    repo.search_posts(query)
        .map_err(|e| repository_failure("Search posts", words, e))
}
