//! Business audit-trail entries, distinct from the security event log.

use serde_json::Value;
use uuid::Uuid;

/// One audit-trail entry capturing an entity mutation. Creations carry a
/// post-state only; the store assigns id and timestamp on insert.
#[derive(Debug, Clone)]
pub struct AuditLog {
    pub entity_type: String,
    pub entity_id: Uuid,
    pub action: String,
    pub before_state: Option<Value>,
    pub after_state: Option<Value>,
}

impl AuditLog {
    /// Entry for a newly created entity.
    pub fn created(entity_type: &str, entity_id: Uuid, after_state: Value) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            entity_id,
            action: "create".to_string(),
            before_state: None,
            after_state: Some(after_state),
        }
    }
}
