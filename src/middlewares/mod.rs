pub mod auth;
pub mod cors;

pub use auth::{AuthMiddleware, AuthUser, current_admin, current_user};
pub use cors::create_cors;
