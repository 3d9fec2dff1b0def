//! Errors shared by the snippet and user stores.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched, or the snippet has expired.
    #[error("no matching record found")]
    NoRecord,

    /// The email is already taken by another user.
    #[error("duplicate email")]
    DuplicateEmail,

    /// Unknown email, or the password did not match the stored hash.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
