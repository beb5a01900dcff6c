//! User model and the composed read-model used for token issuance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::services::TokenResponse;

/// User account status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Inactive => "INACTIVE",
            UserStatus::Suspended => "SUSPENDED",
        }
    }
}

/// User entity as stored. Carries the password hash and reset-token pair;
/// never serialized to clients (see [`UserResponse`]).
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub status: String,
    pub role_id: Uuid,
    pub last_login_at: Option<DateTime<Utc>>,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if the account may authenticate.
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active.as_str()
    }
}

/// User joined with its role name and the role's flattened permission keys.
///
/// Produced by a single store query; the core never assembles role or
/// permission data piecemeal.
#[derive(Debug, Clone, FromRow)]
pub struct UserWithAccess {
    #[sqlx(flatten)]
    pub user: User,
    pub role_name: String,
    pub permissions: Vec<String>,
}

impl UserWithAccess {
    /// Convert to sanitized response (no sensitive fields).
    pub fn sanitized(&self) -> UserResponse {
        UserResponse::from(self.clone())
    }
}

/// User response for API consumers. The password hash and reset-token
/// fields are stripped before anything leaves the core.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub status: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<UserWithAccess> for UserResponse {
    fn from(u: UserWithAccess) -> Self {
        Self {
            id: u.user.id,
            email: u.user.email,
            name: u.user.name,
            status: u.user.status,
            role: u.role_name,
            permissions: u.permissions,
            last_login_at: u.user.last_login_at,
            created_at: u.user.created_at,
        }
    }
}

/// Auth response with user info and tokens.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokenResponse,
}
