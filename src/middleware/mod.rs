//! Request middleware.
//!
//! - [`auth`]: [`AuthState`](auth::AuthState) injection and the login gate
//! - [`csrf`]: session-bound CSRF tokens for unsafe methods
//! - [`headers`]: browser security headers
//! - [`panic`]: panic-to-500 conversion for `CatchPanicLayer`
//!
//! # Ordering
//!
//! Outermost first, the whole app runs panic recovery, request logging and
//! security headers. Dynamic routes additionally run session load/save, CSRF
//! and `authenticate`; protected routes end with `require_authentication`:
//!
//! ```text
//! CatchPanic -> logging -> secure_headers -> session -> csrf -> authenticate
//!     [-> require_authentication] -> handler
//! ```

pub mod auth;
pub mod csrf;
pub mod headers;
pub mod panic;
