//! Narrow read/write contract for system notifications.
//!
//! Fan-out writes through [`NotificationStore::create`]; the operator-facing
//! HTTP surface reads through the listing, mark-read and unread-count methods.
//! Records are never deleted here.

pub mod memory;
pub mod postgres;

pub use memory::MemoryNotificationStore;
pub use postgres::PgNotificationStore;

use async_trait::async_trait;
use urlist_core::types::DbId;

use crate::models::notification::{
    CreateSystemNotification, NotificationPage, SystemNotification,
};

/// Storage for system notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist a new, unread notification.
    async fn create(
        &self,
        input: &CreateSystemNotification,
    ) -> Result<SystemNotification, sqlx::Error>;

    /// List notifications newest first.
    async fn list(&self, page: NotificationPage) -> Result<Vec<SystemNotification>, sqlx::Error>;

    /// Flip a notification to read. Returns `false` if no such id exists.
    async fn mark_read(&self, id: DbId) -> Result<bool, sqlx::Error>;

    /// Number of unread notifications.
    async fn unread_count(&self) -> Result<i64, sqlx::Error>;
}
