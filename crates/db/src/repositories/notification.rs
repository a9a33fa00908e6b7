//! Notification sink.
//!
//! Fire-and-forget collaborator: a failed insert is logged and swallowed,
//! it never fails or rolls back the ledger operation that triggered it.

use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use uuid::Uuid;

use crate::entities::notifications;

/// Repository writing user notifications.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a notification for a user. Best-effort.
    pub async fn notify(
        &self,
        user_id: Uuid,
        kind: &str,
        title: &str,
        body: &str,
        metadata: serde_json::Value,
    ) {
        let notification = notifications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            kind: Set(kind.to_string()),
            title: Set(title.to_string()),
            body: Set(body.to_string()),
            metadata: Set(metadata),
            read_at: Set(None),
            created_at: Set(chrono::Utc::now().into()),
        };

        if let Err(err) = notification.insert(&self.db).await {
            tracing::warn!(%user_id, kind, error = %err, "failed to record notification");
        }
    }
}
