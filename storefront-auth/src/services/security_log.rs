//! Security event logger.
//!
//! Writes are fire-and-forget: a broken log store must never break
//! authentication, so insert failures are logged locally and never
//! propagated to the caller.

use crate::models::SecurityEvent;
use crate::services::Database;

#[derive(Clone)]
pub struct SecurityLogger {
    db: Database,
}

impl SecurityLogger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Record a security event asynchronously (non-blocking).
    pub fn record(&self, event: SecurityEvent) {
        let db = self.db.clone();
        tokio::spawn(async move {
            if let Err(e) = db.insert_security_event(&event).await {
                tracing::error!(
                    error = %e,
                    kind = %event.kind.as_str(),
                    "Failed to write security event"
                );
            } else {
                tracing::debug!(
                    kind = %event.kind.as_str(),
                    success = event.success,
                    "Security event recorded"
                );
            }
        });
    }
}
