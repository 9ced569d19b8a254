//! Customer authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during customer authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] ceibo_core::EmailError),

    /// Password fails the minimum requirements.
    #[error("password must be at least {0} characters")]
    WeakPassword(usize),

    /// An account with this email already exists.
    #[error("an account with this email already exists")]
    EmailTaken,

    /// Unknown email or wrong password. Deliberately a single variant so
    /// responses never reveal which one it was.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Password hashing or verification failed.
    #[error("password hashing error: {0}")]
    Hash(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
