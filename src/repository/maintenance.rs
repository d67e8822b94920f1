use diesel::prelude::*;

use crate::repository::errors::RepositoryResult;
use crate::repository::{CounterMaintenance, DieselRepository};

const RECOUNT_THREAD_POSTS: &str = "UPDATE threads SET posts = \
     (SELECT COUNT(*) FROM posts WHERE posts.thread_id = threads.id)";

const RECOUNT_FORUMS: &str = "UPDATE forums SET \
     threads = (SELECT COUNT(*) FROM threads WHERE threads.forum_id = forums.id), \
     posts = (SELECT COUNT(*) FROM posts WHERE posts.forum_id = forums.id), \
     latest_post_id = (SELECT MAX(posts.id) FROM posts WHERE posts.forum_id = forums.id)";

const RECOUNT_POST_VOTES: &str = "UPDATE posts SET \
     likes = (SELECT COUNT(*) FROM post_thumbs WHERE post_thumbs.post_id = posts.id AND post_thumbs.thumb = 1), \
     dislikes = (SELECT COUNT(*) FROM post_thumbs WHERE post_thumbs.post_id = posts.id AND post_thumbs.thumb = -1)";

impl CounterMaintenance for DieselRepository {
    fn recount_counters(&self) -> RepositoryResult<usize> {
        let mut conn = self.conn()?;

        let affected = conn.transaction(|conn| {
            let threads = diesel::sql_query(RECOUNT_THREAD_POSTS).execute(conn)?;
            let forums = diesel::sql_query(RECOUNT_FORUMS).execute(conn)?;
            let posts = diesel::sql_query(RECOUNT_POST_VOTES).execute(conn)?;
            Ok::<_, diesel::result::Error>(threads + forums + posts)
        })?;

        Ok(affected)
    }
}
