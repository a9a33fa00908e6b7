//! Audit log sink.
//!
//! Fire-and-forget collaborator: failures are logged and swallowed, never
//! surfaced to the caller.

use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use uuid::Uuid;

use crate::entities::audit_logs;

/// Request-level context attached to audit records.
#[derive(Debug, Clone, Default)]
pub struct SourceContext {
    /// Client IP address, when known.
    pub ip_address: Option<String>,
    /// Client user agent, when known.
    pub user_agent: Option<String>,
}

/// Repository writing audit records.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    db: DatabaseConnection,
}

impl AuditLogRepository {
    /// Creates a new audit log repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records an audited action. Best-effort.
    pub async fn record(
        &self,
        actor: Option<Uuid>,
        action: &str,
        metadata: serde_json::Value,
        source: &SourceContext,
    ) {
        let entry = audit_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(actor),
            action: Set(action.to_string()),
            metadata: Set(metadata),
            ip_address: Set(source.ip_address.clone()),
            user_agent: Set(source.user_agent.clone()),
            created_at: Set(chrono::Utc::now().into()),
        };

        if let Err(err) = entry.insert(&self.db).await {
            tracing::warn!(action, error = %err, "failed to record audit entry");
        }
    }
}
