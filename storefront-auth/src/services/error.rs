use crate::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Login failed")]
    LoginFailed,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Current password is incorrect")]
    CurrentPasswordIncorrect,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::AccountInactive => {
                AppError::Unauthorized(anyhow::anyhow!("Account is inactive"))
            }
            ServiceError::LoginFailed => AppError::Unauthorized(anyhow::anyhow!("Login failed")),
            ServiceError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            ServiceError::InvalidRefreshToken => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid refresh token"))
            }
            ServiceError::UserNotFound => AppError::Unauthorized(anyhow::anyhow!("User not found")),
            ServiceError::CurrentPasswordIncorrect => {
                AppError::BadRequest(anyhow::anyhow!("Current password is incorrect"))
            }
            ServiceError::InvalidResetToken => {
                AppError::BadRequest(anyhow::anyhow!("Invalid or expired reset token"))
            }
        }
    }
}
