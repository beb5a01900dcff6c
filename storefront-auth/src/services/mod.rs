pub mod auth;
pub mod database;
pub mod error;
pub mod jwt;
pub mod security_log;

pub use auth::AuthService;
pub use database::Database;
pub use error::ServiceError;
pub use jwt::{AccessTokenClaims, JwtService, RefreshTokenClaims, TokenResponse};
pub use security_log::SecurityLogger;
