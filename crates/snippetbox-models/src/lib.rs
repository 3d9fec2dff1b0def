//! # Snippetbox Models
//!
//! Database entities and form-backing structs.
//!
//! - [`snippets`]: [`Snippet`] rows and the create-snippet form
//! - [`users`]: [`User`] rows and the signup/login forms
//!
//! Forms are decoded from `application/x-www-form-urlencoded` bodies and carry
//! an embedded [`Validator`](snippetbox_core::Validator). Call `check` to run
//! the form's rules, then inspect `form.validator`.

pub mod snippets;
pub mod users;

// Re-export commonly used types at crate root for convenience
pub use snippets::{PERMITTED_EXPIRY_DAYS, Snippet, SnippetCreateForm};
pub use users::{User, UserLoginForm, UserSignupForm};
