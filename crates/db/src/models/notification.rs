//! System notification entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use urlist_core::types::{DbId, Timestamp};

/// Default page size when listing notifications.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Severity of a system notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
}

impl NotificationKind {
    /// The value stored in the `kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// A row from the `system_notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SystemNotification {
    pub id: DbId,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub metadata: serde_json::Value,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for creating a system notification.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSystemNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Free-form key/value metadata; always a JSON object.
    pub metadata: serde_json::Value,
}

/// Pagination and filtering for notification listing (newest first).
#[derive(Debug, Clone, Copy)]
pub struct NotificationPage {
    pub limit: i64,
    pub offset: i64,
    pub unread_only: bool,
}

impl NotificationPage {
    /// Build a page from optional query values, clamping to sane bounds.
    pub fn from_query(limit: Option<i64>, offset: Option<i64>, unread_only: Option<bool>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
            offset: offset.unwrap_or(0).max(0),
            unread_only: unread_only.unwrap_or(false),
        }
    }
}

impl Default for NotificationPage {
    fn default() -> Self {
        Self::from_query(None, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamping() {
        let page = NotificationPage::default();
        assert_eq!(page.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(page.offset, 0);
        assert!(!page.unread_only);

        let page = NotificationPage::from_query(Some(500), Some(-3), Some(true));
        assert_eq!(page.limit, MAX_PAGE_LIMIT);
        assert_eq!(page.offset, 0);
        assert!(page.unread_only);
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(NotificationKind::Warning.as_str(), "warning");
        assert_eq!(
            serde_json::to_value(NotificationKind::Success).unwrap(),
            serde_json::json!("success")
        );
    }
}
