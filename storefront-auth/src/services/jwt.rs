use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::UserWithAccess;

/// Claim value marking a token as usable only for refresh.
const REFRESH_TOKEN_TYPE: &str = "refresh";

/// JWT codec for access/refresh token pairs.
///
/// The two kinds are signed with distinct secrets: a leaked refresh secret
/// cannot forge access tokens and vice versa. Verification is a pure
/// computation and never touches the store.
#[derive(Clone)]
pub struct JwtService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

/// Claims for access tokens (short-lived)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Email
    pub email: String,
    /// Role name at issuance time
    pub role: String,
    /// Flattened permission keys of the role, in join order
    pub permissions: Vec<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Claims for refresh tokens (long-lived)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Always `"refresh"`; an access token presented for refresh fails this
    pub token_type: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Token pair returned to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        let access_ttl = Duration::from_std(config.access_ttl)
            .map_err(|e| anyhow::anyhow!("Access token TTL out of range: {}", e))?;
        let refresh_ttl = Duration::from_std(config.refresh_ttl)
            .map_err(|e| anyhow::anyhow!("Refresh token TTL out of range: {}", e))?;

        Ok(Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        })
    }

    /// Generate an access token carrying the user's current role and
    /// flattened permission keys.
    pub fn generate_access_token(&self, user: &UserWithAccess) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + self.access_ttl;

        let claims = AccessTokenClaims {
            sub: user.user.id,
            email: user.user.email.clone(),
            role: user.role_name.clone(),
            permissions: user.permissions.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.access_encoding)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))?;

        Ok(token)
    }

    /// Generate a refresh token for a user
    pub fn generate_refresh_token(&self, user_id: Uuid) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + self.refresh_ttl;

        let claims = RefreshTokenClaims {
            sub: user_id,
            token_type: REFRESH_TOKEN_TYPE.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.refresh_encoding)
            .map_err(|e| anyhow::anyhow!("Failed to encode refresh token: {}", e))?;

        Ok(token)
    }

    /// Generate both tokens for the user.
    pub fn issue_pair(&self, user: &UserWithAccess) -> Result<TokenResponse, anyhow::Error> {
        let access_token = self.generate_access_token(user)?;
        let refresh_token = self.generate_refresh_token(user.user.id)?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Validate and decode an access token
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<AccessTokenClaims>(token, &self.access_decoding, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid access token: {}", e))?;

        Ok(token_data.claims)
    }

    /// Validate and decode a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshTokenClaims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<RefreshTokenClaims>(token, &self.refresh_decoding, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid refresh token: {}", e))?;

        if token_data.claims.token_type != REFRESH_TOKEN_TYPE {
            anyhow::bail!("Token is not a refresh token");
        }

        Ok(token_data.claims)
    }

    /// Get access token expiry in seconds (for client info)
    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_ttl.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::test_support::user_with_access;

    fn test_config() -> JwtConfig {
        JwtConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_ttl: std::time::Duration::from_secs(900),
            refresh_ttl: std::time::Duration::from_secs(7 * 86_400),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = JwtService::new(&test_config()).unwrap();
        let user = user_with_access();

        let token = service.generate_access_token(&user).unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, user.user.id);
        assert_eq!(claims.email, user.user.email);
        assert_eq!(claims.role, "customer");
        // Flattened keys survive in order, not as a set.
        assert_eq!(claims.permissions, user.permissions);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let service = JwtService::new(&test_config()).unwrap();
        let user = user_with_access();

        let token = service.generate_refresh_token(user.user.id).unwrap();
        let claims = service.validate_refresh_token(&token).unwrap();

        assert_eq!(claims.sub, user.user.id);
        assert_eq!(claims.token_type, "refresh");
    }

    #[test]
    fn test_access_token_rejected_as_refresh() {
        let service = JwtService::new(&test_config()).unwrap();
        let user = user_with_access();

        let access_token = service.generate_access_token(&user).unwrap();
        assert!(service.validate_refresh_token(&access_token).is_err());
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let service = JwtService::new(&test_config()).unwrap();
        let user = user_with_access();

        let refresh_token = service.generate_refresh_token(user.user.id).unwrap();
        assert!(service.validate_access_token(&refresh_token).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = JwtService::new(&test_config()).unwrap();
        let user = user_with_access();

        let mut token = service.generate_access_token(&user).unwrap();
        token.pop();
        token.push('A');

        assert!(service.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_issue_pair_reports_access_expiry() {
        let service = JwtService::new(&test_config()).unwrap();
        let user = user_with_access();

        let pair = service.issue_pair(&user).unwrap();
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 900);
        assert!(service.validate_access_token(&pair.access_token).is_ok());
        assert!(service.validate_refresh_token(&pair.refresh_token).is_ok());
    }
}
