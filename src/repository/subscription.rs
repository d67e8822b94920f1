use diesel::prelude::*;

use crate::domain::subscription::{PostSeen, Subscription};
use crate::domain::types::{ThreadId, UserId};
use crate::models::subscription::Subscription as DbSubscription;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::thread::{ensure_subscription, load_thread};
use crate::repository::{DieselRepository, SubscriptionReader, SubscriptionWriter};

impl SubscriptionReader for DieselRepository {
    fn get_subscription(
        &self,
        user_id: UserId,
        thread_id: ThreadId,
    ) -> RepositoryResult<Option<Subscription>> {
        use crate::schema::subscriptions;

        let mut conn = self.conn()?;

        let subscription = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id.get()))
            .filter(subscriptions::thread_id.eq(thread_id.get()))
            .first::<DbSubscription>(&mut conn)
            .optional()?;

        Ok(subscription.map(TryInto::try_into).transpose()?)
    }

    fn list_subscriptions(&self, user_id: UserId) -> RepositoryResult<Vec<Subscription>> {
        use crate::schema::subscriptions;

        let mut conn = self.conn()?;

        let items = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id.get()))
            .order(subscriptions::id.asc())
            .load::<DbSubscription>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Subscription>, _>>()?;

        Ok(items)
    }
}

impl SubscriptionWriter for DieselRepository {
    fn subscribe(&self, user_id: UserId, thread_id: ThreadId) -> RepositoryResult<bool> {
        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            load_thread(conn, thread_id.get())?;
            let created = ensure_subscription(conn, user_id.get(), thread_id.get())?;
            Ok::<_, RepositoryError>(created > 0)
        })
    }

    fn unsubscribe(&self, user_id: UserId, thread_id: ThreadId) -> RepositoryResult<usize> {
        use crate::schema::subscriptions;

        let mut conn = self.conn()?;

        let affected = diesel::delete(
            subscriptions::table
                .filter(subscriptions::user_id.eq(user_id.get()))
                .filter(subscriptions::thread_id.eq(thread_id.get())),
        )
        .execute(&mut conn)?;
        Ok(affected)
    }

    fn notify_subscribers(&self, thread_id: ThreadId, except: UserId) -> RepositoryResult<usize> {
        use crate::schema::subscriptions;

        let mut conn = self.conn()?;

        let affected = diesel::update(
            subscriptions::table
                .filter(subscriptions::thread_id.eq(thread_id.get()))
                .filter(subscriptions::user_id.ne(except.get())),
        )
        .set(subscriptions::post_seen.eq(PostSeen::New.as_i32()))
        .execute(&mut conn)?;
        Ok(affected)
    }
}
