//! In-process [`NotificationStore`] for tests and database-less runs.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use urlist_core::types::DbId;

use super::NotificationStore;
use crate::models::notification::{
    CreateSystemNotification, NotificationPage, SystemNotification,
};

/// Keeps notifications in a `Vec`, assigning ids from 1 upwards.
#[derive(Default)]
pub struct MemoryNotificationStore {
    rows: Mutex<Vec<SystemNotification>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored notifications, read or not.
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn create(
        &self,
        input: &CreateSystemNotification,
    ) -> Result<SystemNotification, sqlx::Error> {
        let mut rows = self.rows.lock().await;
        let row = SystemNotification {
            id: rows.len() as DbId + 1,
            kind: input.kind.as_str().to_string(),
            title: input.title.clone(),
            message: input.message.clone(),
            metadata: input.metadata.clone(),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn list(&self, page: NotificationPage) -> Result<Vec<SystemNotification>, sqlx::Error> {
        let rows = self.rows.lock().await;
        // Insertion order is creation order, so newest first is a reverse walk.
        Ok(rows
            .iter()
            .rev()
            .filter(|n| !page.unread_only || !n.is_read)
            .skip(usize::try_from(page.offset).unwrap_or(0))
            .take(usize::try_from(page.limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn mark_read(&self, id: DbId) -> Result<bool, sqlx::Error> {
        let mut rows = self.rows.lock().await;
        match rows.iter_mut().find(|n| n.id == id) {
            Some(row) => {
                if !row.is_read {
                    row.is_read = true;
                    row.read_at = Some(Utc::now());
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn unread_count(&self) -> Result<i64, sqlx::Error> {
        let rows = self.rows.lock().await;
        Ok(rows.iter().filter(|n| !n.is_read).count() as i64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
