pub mod auth;
pub mod cli;
pub mod config;
pub mod state;
pub mod storage;

pub use auth::{AuthError, AuthService, User, UserStore};
pub use state::AppState;
