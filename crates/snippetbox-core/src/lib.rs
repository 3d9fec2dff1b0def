//! # Snippetbox Core
//!
//! Core types, errors, and utilities shared by the Snippetbox crates.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`password`]: bcrypt password hashing and verification
//! - [`validation`]: Form error bag and field predicates
//!
//! # Example
//!
//! ```ignore
//! use snippetbox_core::errors::AppError;
//! use snippetbox_core::password::{hash_password, verify_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Snippet not found"));
//! let hash = hash_password("secure_password")?;
//! ```

pub mod errors;
pub mod password;
pub mod validation;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use password::{hash_password, hash_password_with_cost, verify_password};
pub use validation::Validator;
