use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::types::{PostId, UserId, VoteCount};
use crate::domain::vote::{PostThumb, Thumb, VoteTally, plan_vote};
use crate::models::post_thumb::{NewPostThumb as DbNewPostThumb, PostThumb as DbPostThumb};
use crate::repository::counters::{self, Counter};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, VoteReader, VoteWriter};

impl VoteReader for DieselRepository {
    fn get_thumb(&self, user_id: UserId, post_id: PostId) -> RepositoryResult<Option<PostThumb>> {
        use crate::schema::post_thumbs;

        let mut conn = self.conn()?;

        let thumb = post_thumbs::table
            .filter(post_thumbs::user_id.eq(user_id.get()))
            .filter(post_thumbs::post_id.eq(post_id.get()))
            .first::<DbPostThumb>(&mut conn)
            .optional()?;

        Ok(thumb.map(TryInto::try_into).transpose()?)
    }
}

impl VoteWriter for DieselRepository {
    fn cast_vote(
        &self,
        user_id: UserId,
        post_id: PostId,
        thumb: Thumb,
        at: NaiveDateTime,
    ) -> RepositoryResult<VoteTally> {
        use crate::schema::{post_thumbs, posts};

        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            let exists = posts::table
                .find(post_id.get())
                .select(posts::id)
                .first::<i32>(conn)
                .optional()?;
            if exists.is_none() {
                return Err(RepositoryError::NotFound);
            }

            let prior = post_thumbs::table
                .filter(post_thumbs::user_id.eq(user_id.get()))
                .filter(post_thumbs::post_id.eq(post_id.get()))
                .first::<DbPostThumb>(conn)
                .optional()?;
            let prior_thumb = prior
                .as_ref()
                .map(|row| Thumb::try_from(row.thumb))
                .transpose()?;

            let change = plan_vote(prior_thumb, thumb);
            match (change.store, &prior) {
                (Some(store), Some(row)) => {
                    diesel::update(post_thumbs::table.find(row.id))
                        .set((
                            post_thumbs::thumb.eq(store.as_i32()),
                            post_thumbs::updated_at.eq(at),
                        ))
                        .execute(conn)?;
                }
                (Some(store), None) => {
                    diesel::insert_into(post_thumbs::table)
                        .values(DbNewPostThumb {
                            user_id: user_id.get(),
                            post_id: post_id.get(),
                            thumb: store.as_i32(),
                            created_at: at,
                            updated_at: at,
                        })
                        .execute(conn)?;
                }
                (None, _) => {}
            }

            counters::adjust(conn, Counter::PostLikes(post_id), change.likes_delta)?;
            counters::adjust(conn, Counter::PostDislikes(post_id), change.dislikes_delta)?;

            let (likes, dislikes) = posts::table
                .find(post_id.get())
                .select((posts::likes, posts::dislikes))
                .first::<(i32, i32)>(conn)?;

            Ok(VoteTally {
                likes: VoteCount::new(likes)?,
                dislikes: VoteCount::new(dislikes)?,
            })
        })
    }
}
