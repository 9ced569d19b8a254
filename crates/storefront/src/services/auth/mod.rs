//! Customer authentication service.
//!
//! Email + password accounts with Argon2id hashes. The hash never leaves
//! this module; repositories hand it over and handlers only ever see a
//! [`User`].

mod error;

pub use error::AuthError;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use sqlx::PgPool;

use ceibo_core::Email;

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Customer authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::WeakPassword` for
    /// bad input, `AuthError::EmailTaken` if the email is already
    /// registered.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword(MIN_PASSWORD_LENGTH));
        }

        let hash = hash_password(password)?;

        let user = self
            .users
            .create_with_password(&email, &hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "customer registered");

        Ok(user)
    }

    /// Verify credentials and return the customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a
    /// wrong password, indistinguishably.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let Some((user, stored_hash)) = self.users.get_password_hash(&email).await? else {
            // Burn a verification anyway so response timing doesn't tell
            // known emails from unknown ones.
            let _ = verify_password("placeholder", DUMMY_HASH);
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &stored_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }
}

/// A valid Argon2id hash of an unguessable value, used to equalize timing
/// for unknown emails.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$Yj1iM2M0ZDVlNmY3Zzh2OQ$6/bR1cVUS6/Ii7Ei0Cr+PHTfDB6hpDa2vitUPnLhAXU";

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
