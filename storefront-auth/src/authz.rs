//! Authorization check for business modules.
//!
//! Permissions are resolved into the access token at issuance, so the check
//! itself is a pure claims lookup:
//!
//! - No IO
//! - No panics
//! - No business logic

use crate::{error::AppError, services::AccessTokenClaims};

/// Does the token grant the given permission key?
pub fn authorize(claims: &AccessTokenClaims, required: &str) -> bool {
    claims.permissions.iter().any(|p| p == required)
}

/// [`authorize`] or a `Forbidden` error naming the missing key. Handlers
/// guarding a resource call this before touching it.
pub fn require(claims: &AccessTokenClaims, required: &str) -> Result<(), AppError> {
    if authorize(claims, required) {
        Ok(())
    } else {
        Err(AppError::Forbidden(anyhow::anyhow!(
            "Missing required permission: '{}'",
            required
        )))
    }
}
