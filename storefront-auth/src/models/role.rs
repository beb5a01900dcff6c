//! Role model. Permissions reach the core already flattened to their keys
//! through the user read-model, so only the role row itself is materialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Named bundle of permissions. Exactly one role is flagged as the default
/// for self-registration.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}
