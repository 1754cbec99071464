//! Postgres-backed [`NotificationStore`].

use async_trait::async_trait;
use urlist_core::types::DbId;

use super::NotificationStore;
use crate::models::notification::{
    CreateSystemNotification, NotificationPage, SystemNotification,
};
use crate::repositories::NotificationRepo;
use crate::DbPool;

/// Delegates every call to [`NotificationRepo`].
#[derive(Clone)]
pub struct PgNotificationStore {
    pool: DbPool,
}

impl PgNotificationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn create(
        &self,
        input: &CreateSystemNotification,
    ) -> Result<SystemNotification, sqlx::Error> {
        NotificationRepo::create(&self.pool, input).await
    }

    async fn list(&self, page: NotificationPage) -> Result<Vec<SystemNotification>, sqlx::Error> {
        NotificationRepo::list(&self.pool, page).await
    }

    async fn mark_read(&self, id: DbId) -> Result<bool, sqlx::Error> {
        NotificationRepo::mark_read(&self.pool, id).await
    }

    async fn unread_count(&self) -> Result<i64, sqlx::Error> {
        NotificationRepo::unread_count(&self.pool).await
    }
}
