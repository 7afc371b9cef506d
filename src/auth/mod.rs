pub mod dto;
pub mod errors;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use dto::PublicUser;
pub use errors::AuthError;
pub use password::PasswordHashing;
pub use repo::UserStore;
pub use repo_types::User;
pub use services::AuthService;
