//! Repository for the `system_notifications` table.

use sqlx::PgPool;
use urlist_core::types::DbId;

use crate::models::notification::{
    CreateSystemNotification, NotificationPage, SystemNotification,
};

/// Column list for `system_notifications` queries.
const COLUMNS: &str = "id, kind, title, message, metadata, is_read, read_at, created_at";

/// Provides create/read/mark-read operations for system notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a notification, returning the stored row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateSystemNotification,
    ) -> Result<SystemNotification, sqlx::Error> {
        let query = format!(
            "INSERT INTO system_notifications (kind, title, message, metadata) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SystemNotification>(&query)
            .bind(input.kind.as_str())
            .bind(&input.title)
            .bind(&input.message)
            .bind(&input.metadata)
            .fetch_one(pool)
            .await
    }

    /// List notifications newest first.
    ///
    /// When `page.unread_only` is `true`, only rows with `is_read = false`
    /// are returned.
    pub async fn list(
        pool: &PgPool,
        page: NotificationPage,
    ) -> Result<Vec<SystemNotification>, sqlx::Error> {
        let filter = if page.unread_only {
            "WHERE is_read = false"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM system_notifications \
             {filter} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, SystemNotification>(&query)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(pool)
            .await
    }

    /// Mark a single notification as read.
    ///
    /// Returns `true` if the notification exists. Marking an already-read
    /// notification keeps its original `read_at`.
    pub async fn mark_read(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE system_notifications \
             SET is_read = true, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count unread notifications.
    pub async fn unread_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM system_notifications WHERE is_read = false",
        )
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }
}
