//! Credential store collaborator.
//!
//! Owns every SQL statement the core runs. The core treats this as a
//! lookup/update interface and never composes relational data itself; the
//! user-with-role-and-permissions read-model comes back from one query.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{AuditLog, Role, SecurityEvent, User, UserWithAccess};

/// Aggregate projection of a user, its role name and the role's permission
/// keys flattened in join order.
const USER_WITH_ACCESS_SELECT: &str = r#"
    SELECT
        u.*,
        r.name AS role_name,
        COALESCE(
            ARRAY_AGG(p.permission_key ORDER BY p.id) FILTER (WHERE p.id IS NOT NULL),
            ARRAY[]::TEXT[]
        ) AS permissions
    FROM users u
    JOIN roles r ON r.id = u.role_id
    LEFT JOIN role_permissions rp ON rp.role_id = r.id
    LEFT JOIN permissions p ON p.id = rp.permission_id
"#;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_user_with_access_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserWithAccess>, sqlx::Error> {
        let query = format!("{USER_WITH_ACCESS_SELECT} WHERE u.email = $1 GROUP BY u.id, r.name");
        sqlx::query_as::<_, UserWithAccess>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_user_with_access_by_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserWithAccess>, sqlx::Error> {
        let query = format!("{USER_WITH_ACCESS_SELECT} WHERE u.id = $1 GROUP BY u.id, r.name");
        sqlx::query_as::<_, UserWithAccess>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn insert_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        status: &str,
        role_id: Uuid,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, name, password_hash, status, role_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(status)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_last_login(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = now(), updated_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Set the reset token and its expiry together. A newer request simply
    /// overwrites an older pair; last writer wins.
    pub async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET reset_token = $2, reset_token_expires_at = $3, updated_at = now() \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Consume a reset token in one statement: match on the exact token with
    /// an unexpired deadline, install the new password hash and clear the
    /// token pair. Returns the affected user id, or None when the token does
    /// not match or has expired.
    pub async fn consume_reset_token(
        &self,
        token: &str,
        new_password_hash: &str,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "UPDATE users SET password_hash = $2, reset_token = NULL, \
             reset_token_expires_at = NULL, updated_at = now() \
             WHERE reset_token = $1 AND reset_token_expires_at > now() \
             RETURNING id",
        )
        .bind(token)
        .bind(new_password_hash)
        .fetch_optional(&self.pool)
        .await
    }

    /// The single role designated for self-registration.
    pub async fn find_default_role(&self) -> Result<Option<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE is_default LIMIT 1")
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn insert_security_event(&self, event: &SecurityEvent) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO security_events \
             (kind, user_id, email, ip_address, user_agent, success, error_message, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(event.kind.as_str())
        .bind(event.user_id)
        .bind(event.email.as_deref())
        .bind(event.ip_address.as_deref())
        .bind(event.user_agent.as_deref())
        .bind(event.success)
        .bind(event.error_message.as_deref())
        .bind(event.metadata.as_ref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_audit_log(&self, entry: &AuditLog) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO audit_logs (entity_type, entity_id, action, before_state, after_state) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.action)
        .bind(entry.before_state.as_ref())
        .bind(entry.after_state.as_ref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
