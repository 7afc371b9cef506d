use thiserror::Error;

/// Expected failure outcomes of the authentication operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Please enter your name")]
    EmptyName,

    #[error("Please enter your email address")]
    EmptyEmail,

    #[error("Please enter your password")]
    EmptyPassword,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("An account with this email already exists")]
    EmailAlreadyExists,

    #[error("No account found with this email")]
    UserNotFound,

    #[error("Incorrect password")]
    IncorrectPassword,

    /// The user list could not be written.
    #[error("Could not save account data: {0}")]
    Persistence(String),
}
