use chrono::{Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::{
    dtos::auth::{LoginRequest, RegisterRequest},
    dtos::MessageResponse,
    models::{
        AuditLog, AuthResponse, ClientContext, SecurityEvent, SecurityEventKind, UserResponse,
        UserStatus, UserWithAccess,
    },
    services::{Database, JwtService, SecurityLogger, ServiceError, TokenResponse},
    utils::{hash_password, verify_password, Password, PasswordHashString},
};

/// Reset tokens stay valid for this long after a forgot-password request.
const RESET_TOKEN_TTL_MINUTES: i64 = 15;

/// Uniform forgot-password reply; identical whether or not the email exists.
const RESET_REQUESTED_MESSAGE: &str =
    "If that email address is registered, a password reset link has been sent";

/// Authentication core.
///
/// Orchestrates registration, login, logout, refresh and the password
/// lifecycle. Stateless between calls; all state lives in the store. Every
/// outcome worth auditing is emitted to the security log, whose failures
/// never surface here.
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    jwt: JwtService,
    security_log: SecurityLogger,
    /// Role assigned on self-registration, resolved once at startup.
    default_role_id: Uuid,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        db: Database,
        jwt: JwtService,
        security_log: SecurityLogger,
        default_role_id: Uuid,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            db,
            jwt,
            security_log,
            default_role_id,
            bcrypt_cost,
        }
    }

    pub async fn register(
        &self,
        req: RegisterRequest,
        ctx: ClientContext,
    ) -> Result<AuthResponse, ServiceError> {
        match self.register_attempt(&req, &ctx).await {
            Ok(res) => Ok(res),
            Err(e) => {
                self.security_log.record(
                    SecurityEvent::failure(
                        SecurityEventKind::RegisterFailed,
                        None,
                        Some(req.email.clone()),
                        &ctx,
                        e.to_string(),
                    )
                    .with_metadata(serde_json::json!({ "error": e.to_string() })),
                );
                Err(e)
            }
        }
    }

    async fn register_attempt(
        &self,
        req: &RegisterRequest,
        ctx: &ClientContext,
    ) -> Result<AuthResponse, ServiceError> {
        // Exact, case-sensitive match; the unique index is the backstop for
        // concurrent attempts.
        if self.db.find_user_by_email(&req.email).await?.is_some() {
            return Err(ServiceError::EmailAlreadyRegistered);
        }

        let role_id = req.role_id.unwrap_or(self.default_role_id);

        let password_hash = hash_password(&Password::new(req.password.clone()), self.bcrypt_cost)
            .map_err(ServiceError::Internal)?;

        let user = self
            .db
            .insert_user(
                &req.email,
                &req.name,
                password_hash.as_str(),
                UserStatus::Active.as_str(),
                role_id,
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ServiceError::EmailAlreadyRegistered
                } else {
                    ServiceError::Database(e)
                }
            })?;

        let access = self
            .db
            .find_user_with_access_by_id(user.id)
            .await?
            .ok_or_else(|| {
                ServiceError::Internal(anyhow::anyhow!("Registered user vanished before load"))
            })?;

        tracing::info!(user_id = %user.id, "User registered");

        self.security_log.record(SecurityEvent::success(
            SecurityEventKind::RegisterSuccess,
            Some(user.id),
            Some(user.email.clone()),
            ctx,
        ));

        // Audit trail captures the post-state only; there is no pre-state
        // for a creation.
        let audit_entry = AuditLog::created(
            "user",
            user.id,
            serde_json::json!({
                "email": user.email,
                "name": user.name,
                "role_id": user.role_id,
            }),
        );
        let db = self.db.clone();
        tokio::spawn(async move {
            if let Err(e) = db.insert_audit_log(&audit_entry).await {
                tracing::error!(error = %e, "Failed to write audit log entry");
            }
        });

        let tokens = self.jwt.issue_pair(&access).map_err(ServiceError::Internal)?;

        Ok(AuthResponse {
            user: access.sanitized(),
            tokens,
        })
    }

    pub async fn login(
        &self,
        req: LoginRequest,
        ctx: ClientContext,
    ) -> Result<AuthResponse, ServiceError> {
        match self.login_attempt(&req, &ctx).await {
            Ok(res) => Ok(res),
            // Expected denials carry their own messages and were already
            // logged with the true reason.
            Err(e @ (ServiceError::InvalidCredentials | ServiceError::AccountInactive)) => Err(e),
            Err(e) => {
                self.security_log.record(SecurityEvent::failure(
                    SecurityEventKind::LoginFailed,
                    None,
                    Some(req.email.clone()),
                    &ctx,
                    e.to_string(),
                ));
                // The caller learns nothing beyond the fact of the failure;
                // only the log retains the cause.
                Err(ServiceError::LoginFailed)
            }
        }
    }

    async fn login_attempt(
        &self,
        req: &LoginRequest,
        ctx: &ClientContext,
    ) -> Result<AuthResponse, ServiceError> {
        let Some(user) = self.db.find_user_with_access_by_email(&req.email).await? else {
            self.security_log.record(SecurityEvent::failure(
                SecurityEventKind::LoginFailed,
                None,
                Some(req.email.clone()),
                ctx,
                "User not found",
            ));
            // Same external message as a wrong password.
            return Err(ServiceError::InvalidCredentials);
        };

        if !user.user.is_active() {
            self.security_log.record(SecurityEvent::failure(
                SecurityEventKind::LoginFailed,
                Some(user.user.id),
                Some(user.user.email.clone()),
                ctx,
                "Account inactive",
            ));
            return Err(ServiceError::AccountInactive);
        }

        let matches = verify_password(
            &Password::new(req.password.clone()),
            &PasswordHashString::new(user.user.password_hash.clone()),
        )
        .map_err(ServiceError::Internal)?;

        if !matches {
            self.security_log.record(SecurityEvent::failure(
                SecurityEventKind::LoginFailed,
                Some(user.user.id),
                Some(user.user.email.clone()),
                ctx,
                "Invalid password",
            ));
            return Err(ServiceError::InvalidCredentials);
        }

        self.db.update_last_login(user.user.id).await?;

        self.security_log.record(SecurityEvent::success(
            SecurityEventKind::LoginSuccess,
            Some(user.user.id),
            Some(user.user.email.clone()),
            ctx,
        ));

        // Re-read so the response reflects the login we just recorded.
        let user = self
            .db
            .find_user_with_access_by_id(user.user.id)
            .await?
            .ok_or_else(|| {
                ServiceError::Internal(anyhow::anyhow!("User vanished during login"))
            })?;

        let tokens = self.jwt.issue_pair(&user).map_err(ServiceError::Internal)?;

        Ok(AuthResponse {
            user: user.sanitized(),
            tokens,
        })
    }

    /// Mint a new token pair from a valid refresh token.
    ///
    /// Role and permission claims are re-read from the store; claims baked
    /// into the old pair may be stale. The presented refresh token itself
    /// stays valid until its own expiry: there is no rotation chain or
    /// revocation list in this stateless design.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, ServiceError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| ServiceError::InvalidRefreshToken)?;

        let user = self
            .db
            .find_user_with_access_by_id(claims.sub)
            .await?
            .ok_or(ServiceError::InvalidRefreshToken)?;

        if !user.user.is_active() {
            return Err(ServiceError::InvalidRefreshToken);
        }

        tracing::debug!(user_id = %user.user.id, "Token refreshed for user");

        self.jwt.issue_pair(&user).map_err(ServiceError::Internal)
    }

    /// Best-effort logout: record the event if the user can be looked up,
    /// swallow everything else. Stateless tokens cannot be invalidated
    /// server-side, so this never fails from the caller's perspective.
    pub async fn logout(&self, user_id: Uuid, ctx: ClientContext) -> MessageResponse {
        match self.db.find_user_by_id(user_id).await {
            Ok(Some(user)) => {
                self.security_log.record(SecurityEvent::success(
                    SecurityEventKind::Logout,
                    Some(user.id),
                    Some(user.email),
                    &ctx,
                ));
                tracing::info!(user_id = %user_id, "User logged out");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user_id, "Logout lookup failed");
            }
        }

        MessageResponse::new("Logged out successfully")
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
        ctx: ClientContext,
    ) -> Result<MessageResponse, ServiceError> {
        let user = self
            .db
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let matches = verify_password(
            &Password::new(current_password.to_string()),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .map_err(ServiceError::Internal)?;

        if !matches {
            return Err(ServiceError::CurrentPasswordIncorrect);
        }

        let password_hash = hash_password(&Password::new(new_password.to_string()), self.bcrypt_cost)
            .map_err(ServiceError::Internal)?;

        self.db
            .update_password(user.id, password_hash.as_str())
            .await?;

        self.security_log.record(SecurityEvent::success(
            SecurityEventKind::PasswordChange,
            Some(user.id),
            Some(user.email),
            &ctx,
        ));

        Ok(MessageResponse::new("Password changed successfully"))
    }

    /// Start a password reset. The reply never reveals whether the email is
    /// registered; token delivery belongs to an external collaborator.
    pub async fn forgot_password(
        &self,
        email: &str,
        ctx: ClientContext,
    ) -> Result<MessageResponse, ServiceError> {
        if let Some(user) = self.db.find_user_by_email(email).await? {
            let token = generate_reset_token();
            let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

            self.db.set_reset_token(user.id, &token, expires_at).await?;

            self.security_log.record(SecurityEvent::success(
                SecurityEventKind::PasswordResetRequest,
                Some(user.id),
                Some(user.email.clone()),
                &ctx,
            ));

            tracing::info!(user_id = %user.id, "Password reset requested");
        }

        Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE))
    }

    /// Complete a password reset. The token is consumable once: the match,
    /// the password update and the clearing of the token pair happen in a
    /// single store statement.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        ctx: ClientContext,
    ) -> Result<MessageResponse, ServiceError> {
        let password_hash = hash_password(&Password::new(new_password.to_string()), self.bcrypt_cost)
            .map_err(ServiceError::Internal)?;

        let user_id = self
            .db
            .consume_reset_token(token, password_hash.as_str())
            .await?
            .ok_or(ServiceError::InvalidResetToken)?;

        self.security_log.record(SecurityEvent::success(
            SecurityEventKind::PasswordResetSuccess,
            Some(user_id),
            None,
            &ctx,
        ));

        tracing::info!(user_id = %user_id, "Password reset successful");

        Ok(MessageResponse::new("Password has been reset successfully"))
    }

    /// Credential predicate for pluggable authentication strategies.
    ///
    /// Unlike `login` this neither logs nor raises: any lookup failure,
    /// inactive account or mismatch yields None.
    pub async fn validate_user(&self, email: &str, password: &str) -> Option<UserResponse> {
        let user: UserWithAccess = self
            .db
            .find_user_with_access_by_email(email)
            .await
            .ok()??;

        if !user.user.is_active() {
            return None;
        }

        let matches = verify_password(
            &Password::new(password.to_string()),
            &PasswordHashString::new(user.user.password_hash.clone()),
        )
        .unwrap_or(false);

        matches.then(|| user.sanitized())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn generate_reset_token() -> String {
    let mut rng = rand::thread_rng();
    let token_bytes: [u8; 32] = rng.gen();
    hex::encode(token_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_tokens_are_unguessable_hex() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        // Two draws must not collide.
        assert_ne!(token, generate_reset_token());
    }
}
