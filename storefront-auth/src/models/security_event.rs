//! Append-only security event log entries.
//!
//! Every authentication-relevant occurrence is recorded here: successful and
//! failed logins, registrations, logouts, password changes and resets. The
//! core only ever inserts; entries are never updated or deleted.

use serde_json::Value;
use uuid::Uuid;

/// Client-supplied request context, recorded with events purely for logging.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Kinds of authentication events the core records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEventKind {
    RegisterSuccess,
    RegisterFailed,
    LoginSuccess,
    LoginFailed,
    Logout,
    PasswordChange,
    PasswordResetRequest,
    PasswordResetSuccess,
}

impl SecurityEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEventKind::RegisterSuccess => "REGISTER_SUCCESS",
            SecurityEventKind::RegisterFailed => "REGISTER_FAILED",
            SecurityEventKind::LoginSuccess => "LOGIN_SUCCESS",
            SecurityEventKind::LoginFailed => "LOGIN_FAILED",
            SecurityEventKind::Logout => "LOGOUT",
            SecurityEventKind::PasswordChange => "PASSWORD_CHANGE",
            SecurityEventKind::PasswordResetRequest => "PASSWORD_RESET_REQUEST",
            SecurityEventKind::PasswordResetSuccess => "PASSWORD_RESET_SUCCESS",
        }
    }
}

/// One security event. The store assigns id and timestamp on insert.
#[derive(Debug, Clone)]
pub struct SecurityEvent {
    pub kind: SecurityEventKind,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
    pub metadata: Option<Value>,
}

impl SecurityEvent {
    /// Record a successful operation.
    pub fn success(
        kind: SecurityEventKind,
        user_id: Option<Uuid>,
        email: Option<String>,
        ctx: &ClientContext,
    ) -> Self {
        Self {
            kind,
            user_id,
            email,
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
            success: true,
            error_message: None,
            metadata: None,
        }
    }

    /// Record a denied or failed operation with the true server-side reason.
    /// The reason stays in the log; external responses may be less specific.
    pub fn failure(
        kind: SecurityEventKind,
        user_id: Option<Uuid>,
        email: Option<String>,
        ctx: &ClientContext,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            user_id,
            email,
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
            success: false,
            error_message: Some(reason.into()),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
