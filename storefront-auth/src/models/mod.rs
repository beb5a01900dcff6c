pub mod audit_log;
pub mod role;
pub mod security_event;
pub mod user;

pub use audit_log::AuditLog;
pub use role::Role;
pub use security_event::{ClientContext, SecurityEvent, SecurityEventKind};
pub use user::{AuthResponse, User, UserResponse, UserStatus, UserWithAccess};
