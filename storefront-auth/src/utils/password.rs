/// Newtype for password to prevent accidental logging
#[derive(Debug, Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Newtype for password hash
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash a password using bcrypt at the given cost factor.
///
/// Salt is generated per call and encoded into the resulting hash string.
pub fn hash_password(password: &Password, cost: u32) -> Result<PasswordHashString, anyhow::Error> {
    let password_hash = bcrypt::hash(password.as_str(), cost)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    Ok(PasswordHashString::new(password_hash))
}

/// Verify a password against a stored bcrypt hash.
///
/// Returns Ok(false) on a mismatch; Err only when the stored hash itself is
/// malformed.
pub fn verify_password(
    password: &Password,
    password_hash: &PasswordHashString,
) -> Result<bool, anyhow::Error> {
    bcrypt::verify(password.as_str(), password_hash.as_str())
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))
}
