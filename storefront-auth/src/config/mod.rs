use std::env;
use std::time::Duration;

use crate::error::AppError;

/// Service configuration, read once from the environment at startup and
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Token codec configuration. Access and refresh tokens use distinct
/// secrets so that a leak of one cannot forge the other kind.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = AuthConfig {
            environment,
            service_name: get_env("SERVICE_NAME", Some("storefront-auth"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: get_env("PORT", Some("8080"), is_prod)?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!("PORT: {}", e))
                })?,
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("16"), is_prod)?
                    .parse()
                    .unwrap_or(16),
                min_connections: get_env("DATABASE_MIN_CONNECTIONS", Some("2"), is_prod)?
                    .parse()
                    .unwrap_or(2),
            },
            jwt: JwtConfig {
                // Both secrets are required; a missing one is a deployment
                // error surfaced before the service accepts traffic.
                access_secret: get_env("JWT_ACCESS_SECRET", None, is_prod)?,
                refresh_secret: get_env("JWT_REFRESH_SECRET", None, is_prod)?,
                access_ttl: parse_duration(&get_env("JWT_ACCESS_TTL", Some("15m"), is_prod)?)
                    .map_err(AppError::ConfigError)?,
                refresh_ttl: parse_duration(&get_env("JWT_REFRESH_TTL", Some("7d"), is_prod)?)
                    .map_err(AppError::ConfigError)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
                bcrypt_cost: get_env("BCRYPT_COST", Some("12"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!("BCRYPT_COST: {}", e))
                    })?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.jwt.access_secret.is_empty() || self.jwt.refresh_secret.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT secrets must not be empty"
            )));
        }

        if self.jwt.access_secret == self.jwt.refresh_secret {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ"
            )));
        }

        if self.jwt.access_ttl.is_zero() || self.jwt.refresh_ttl.is_zero() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Token TTLs must be positive"
            )));
        }

        // bcrypt rejects costs outside this range at hash time; catch the
        // misconfiguration at startup instead.
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "BCRYPT_COST must be between 4 and 31"
            )));
        }

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

/// Parse a duration of the form `30s`, `15m`, `12h` or `7d`.
pub fn parse_duration(raw: &str) -> Result<Duration, anyhow::Error> {
    let raw = raw.trim();
    if raw.len() < 2 {
        anyhow::bail!("invalid duration '{}', expected forms like '15m' or '7d'", raw);
    }

    let (digits, unit) = raw.split_at(raw.len() - 1);
    let value: u64 = digits
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid duration '{}': '{}' is not a number", raw, digits))?;

    let secs = match unit {
        "s" => value,
        "m" => value * 60,
        "h" => value * 3600,
        "d" => value * 86_400,
        _ => anyhow::bail!("invalid duration '{}': unknown unit '{}'", raw, unit),
    };

    Ok(Duration::from_secs(secs))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AuthConfig {
        AuthConfig {
            environment: Environment::Dev,
            service_name: "storefront-auth".to_string(),
            service_version: "0.0.0".to_string(),
            log_level: "info".to_string(),
            port: 8080,
            database: DatabaseConfig {
                url: "postgres://localhost/auth".to_string(),
                max_connections: 16,
                min_connections: 2,
            },
            jwt: JwtConfig {
                access_secret: "access-secret".to_string(),
                refresh_secret: "refresh-secret".to_string(),
                access_ttl: Duration::from_secs(15 * 60),
                refresh_ttl: Duration::from_secs(7 * 86_400),
            },
            security: SecurityConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
                bcrypt_cost: 12,
            },
        }
    }

    #[test]
    fn parse_duration_accepts_all_units() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("12h").unwrap(), Duration::from_secs(43_200));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604_800));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("m").is_err());
        assert!(parse_duration("15").is_err());
        assert!(parse_duration("15w").is_err());
        assert!(parse_duration("-5m").is_err());
    }

    #[test]
    fn validate_accepts_base_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_shared_secret() {
        let mut config = base_config();
        config.jwt.refresh_secret = config.jwt.access_secret.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_bcrypt_cost() {
        let mut config = base_config();
        config.security.bcrypt_cost = 3;
        assert!(config.validate().is_err());
        config.security.bcrypt_cost = 32;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_wildcard_origin_in_prod() {
        let mut config = base_config();
        config.environment = Environment::Prod;
        config.security.allowed_origins = vec!["*".to_string()];
        assert!(config.validate().is_err());
    }
}
