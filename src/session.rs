//! Session cookie setup and typed access to the keys handlers use.
//!
//! All session state lives in the store behind [`Session`]; these helpers
//! only fix the key names and value types in one place.
//!
//! A session lives for a fixed period from the moment it first holds data.
//! The deadline is kept in the session itself and reapplied whenever the
//! session is saved, so activity never extends it.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use snippetbox_config::SessionConfig;
use snippetbox_core::AppError;
use time::{Duration, OffsetDateTime};
use tower_sessions::{
    Expiry, Session, SessionManagerLayer, SessionStore, cookie::SameSite,
};

pub const SESSION_COOKIE_NAME: &str = "session";

pub const AUTHENTICATED_USER_ID: &str = "authenticated_user_id";
pub const FLASH: &str = "flash";
pub const CSRF_TOKEN: &str = "csrf_token";
pub const EXPIRES_AT: &str = "expires_at";

/// How long a session may live, counted from its creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionLifetime(pub Duration);

impl From<&SessionConfig> for SessionLifetime {
    fn from(config: &SessionConfig) -> Self {
        Self(Duration::hours(config.lifetime_hours))
    }
}

/// Builds the load-and-save layer with the cookie flags the app relies on.
pub fn session_layer<S>(store: S, config: &SessionConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_http_only(true)
        .with_secure(config.secure_cookie)
        .with_same_site(SameSite::Lax)
        .with_path("/")
        .with_expiry(Expiry::OnSessionEnd)
}

/// Pins a session that is about to be saved to its absolute deadline.
///
/// Must sit directly inside the session layer so it sees every change made
/// further in.
pub async fn enforce_lifetime(
    State(SessionLifetime(lifetime)): State<SessionLifetime>,
    session: Session,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let response = next.run(req).await;

    if session.is_modified() && !session.is_empty().await {
        let deadline = session_deadline(&session, lifetime).await?;
        session.set_expiry(Some(Expiry::AtDateTime(deadline)));
    }

    Ok(response)
}

/// Reads the stored deadline, fixing one at `now + lifetime` on first use.
pub async fn session_deadline(
    session: &Session,
    lifetime: Duration,
) -> Result<OffsetDateTime, AppError> {
    let stored = session
        .get::<i64>(EXPIRES_AT)
        .await?
        .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok());
    if let Some(deadline) = stored {
        return Ok(deadline);
    }

    let deadline = OffsetDateTime::now_utc() + lifetime;
    session.insert(EXPIRES_AT, deadline.unix_timestamp()).await?;
    Ok(deadline)
}

pub async fn put_flash(session: &Session, message: &str) -> Result<(), AppError> {
    session.insert(FLASH, message).await?;
    Ok(())
}

/// Removes and returns the flash message, so it is shown exactly once.
///
/// Leaves the session unmodified when there is nothing to show.
pub async fn pop_flash(session: &Session) -> Result<Option<String>, AppError> {
    if session.get_value(FLASH).await?.is_none() {
        return Ok(None);
    }
    Ok(session.remove::<String>(FLASH).await?)
}

pub async fn authenticated_user_id(session: &Session) -> Result<Option<i64>, AppError> {
    Ok(session.get::<i64>(AUTHENTICATED_USER_ID).await?)
}

/// Marks the session as belonging to `user_id` under a fresh session id.
pub async fn log_in(session: &Session, user_id: i64) -> Result<(), AppError> {
    session.cycle_id().await?;
    session.insert(AUTHENTICATED_USER_ID, user_id).await?;
    Ok(())
}

pub async fn log_out(session: &Session) -> Result<(), AppError> {
    session.cycle_id().await?;
    session.remove::<i64>(AUTHENTICATED_USER_ID).await?;
    Ok(())
}
