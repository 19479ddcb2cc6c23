use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod services;
pub mod tokens;

pub use services::{hash_password, ActiveUser, AdminUser};
pub use tokens::{TokenKind, TokenSigner};

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
