//! Double-submit CSRF protection bound to the session.
//!
//! Each session holds a random 32-byte secret under [`CSRF_TOKEN`]. Every
//! request gets a freshly masked copy of it (`pad || secret ^ pad`, base64url)
//! through the [`CsrfToken`] extractor, so the value embedded in pages
//! changes on every render while still verifying against the same secret.
//!
//! Requests with an unsafe method must echo a token back, either in the
//! `csrf_token` form field or the `X-CSRF-Token` header. Both masked and raw
//! tokens are accepted.

use anyhow::anyhow;
use axum::{
    body::{Body, Bytes, to_bytes},
    extract::{FromRequestParts, Request},
    http::{HeaderValue, Method, StatusCode, header, request::Parts},
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use snippetbox_core::AppError;
use tower_sessions::Session;
use tracing::warn;

use crate::session::CSRF_TOKEN;

pub const CSRF_FORM_FIELD: &str = "csrf_token";
pub const CSRF_HEADER_NAME: &str = "x-csrf-token";

const TOKEN_LEN: usize = 32;
const MAX_FORM_BYTES: usize = 2 * 1024 * 1024;

/// The masked token for the current request, ready to embed in a form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsrfToken(pub String);

impl<S> FromRequestParts<S> for CsrfToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CsrfToken>()
            .cloned()
            .ok_or_else(|| AppError::unrecoverable(anyhow!("CSRF middleware not installed")))
    }
}

pub async fn protect(session: Session, req: Request, next: Next) -> Result<Response, AppError> {
    let secret = session_secret(&session).await?;

    let mut req = if is_safe(req.method()) {
        req
    } else {
        let (req, submitted) = submitted_token(req).await?;
        let accepted = submitted
            .as_deref()
            .and_then(decode_token)
            .is_some_and(|candidate| constant_time_eq(&candidate, &secret));

        if !accepted {
            warn!(
                method = %req.method(),
                uri = %req.uri(),
                token_present = submitted.is_some(),
                "CSRF token check failed"
            );
            return Err(AppError::bad_request(anyhow!("CSRF token missing or invalid")));
        }
        req
    };

    req.extensions_mut().insert(CsrfToken(mask(&secret)));

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Cookie"));
    Ok(response)
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Loads the session's secret, creating it on first use.
async fn session_secret(session: &Session) -> Result<Vec<u8>, AppError> {
    let stored = session
        .get::<String>(CSRF_TOKEN)
        .await?
        .and_then(|s| URL_SAFE_NO_PAD.decode(s).ok())
        .filter(|secret| secret.len() == TOKEN_LEN);
    if let Some(secret) = stored {
        return Ok(secret);
    }

    let mut secret = vec![0u8; TOKEN_LEN];
    rand::thread_rng().fill_bytes(&mut secret);
    session
        .insert(CSRF_TOKEN, URL_SAFE_NO_PAD.encode(&secret))
        .await?;
    Ok(secret)
}

/// Pulls the submitted token from the header or, for form posts, the body.
///
/// A form body is buffered and put back so the handler can still decode it.
async fn submitted_token(req: Request) -> Result<(Request, Option<String>), AppError> {
    if let Some(token) = req
        .headers()
        .get(CSRF_HEADER_NAME)
        .and_then(|v| v.to_str().ok())
    {
        let token = token.to_string();
        return Ok((req, Some(token)));
    }

    if !is_form(&req) {
        return Ok((req, None));
    }

    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|e| AppError::new(StatusCode::PAYLOAD_TOO_LARGE, e))?;
    let token = form_field(&bytes, CSRF_FORM_FIELD);

    Ok((Request::from_parts(parts, Body::from(bytes)), token))
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|essence| {
            essence
                .trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}

fn form_field(body: &Bytes, name: &str) -> Option<String> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
        .ok()?
        .into_iter()
        .find_map(|(key, value)| (key == name).then_some(value))
}

fn mask(secret: &[u8]) -> String {
    let mut pad = [0u8; TOKEN_LEN];
    rand::thread_rng().fill_bytes(&mut pad);

    let mut masked = Vec::with_capacity(TOKEN_LEN * 2);
    masked.extend_from_slice(&pad);
    masked.extend(secret.iter().zip(pad.iter()).map(|(s, p)| s ^ p));
    URL_SAFE_NO_PAD.encode(masked)
}

/// Decodes a submitted token back to the raw secret it claims to carry.
fn decode_token(token: &str) -> Option<Vec<u8>> {
    let bytes = URL_SAFE_NO_PAD.decode(token.trim()).ok()?;
    match bytes.len() {
        TOKEN_LEN => Some(bytes),
        n if n == TOKEN_LEN * 2 => {
            let (pad, masked) = bytes.split_at(TOKEN_LEN);
            Some(masked.iter().zip(pad).map(|(m, p)| m ^ p).collect())
        }
        _ => None,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
