pub mod auth;
pub mod context;
pub mod request_id;

pub use auth::{auth_middleware, AuthUser};
pub use request_id::request_id_middleware;
