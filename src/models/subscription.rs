use diesel::prelude::*;

use crate::domain::subscription::{PostSeen, Subscription as DomainSubscription};
use crate::domain::types::TypeConstraintError;

/// Diesel model representing the `subscriptions` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::subscriptions)]
pub struct Subscription {
    pub id: i32,
    pub user_id: i32,
    pub thread_id: i32,
    pub post_seen: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::subscriptions)]
pub struct NewSubscription {
    pub user_id: i32,
    pub thread_id: i32,
    pub post_seen: i32,
}

impl TryFrom<Subscription> for DomainSubscription {
    type Error = TypeConstraintError;

    fn try_from(subscription: Subscription) -> Result<Self, Self::Error> {
        Ok(Self {
            id: subscription.id,
            user_id: subscription.user_id.try_into()?,
            thread_id: subscription.thread_id.try_into()?,
            post_seen: PostSeen::try_from(subscription.post_seen)?,
        })
    }
}
