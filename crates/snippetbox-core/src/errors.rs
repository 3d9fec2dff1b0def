use anyhow::Error;
use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::error;

/// Error returned by handlers and middleware.
///
/// Client errors are rendered as the bare status text. Server errors are
/// logged with their backtrace before the same generic body is sent, so
/// internals never reach the client.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
    unrecoverable: bool,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
            unrecoverable: false,
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    /// A programmer error the request cannot recover from.
    ///
    /// Rendered like a caught panic: 500 with `Connection: close`.
    pub fn unrecoverable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            unrecoverable: true,
            ..Self::internal(err)
        }
    }

    pub fn is_unrecoverable(&self) -> bool {
        self.unrecoverable
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                status = %self.status.as_u16(),
                unrecoverable = self.unrecoverable,
                error = %self.error,
                backtrace = %self.error.backtrace(),
                "Request failed"
            );
        }

        let body = self
            .status
            .canonical_reason()
            .unwrap_or("Error")
            .to_string();
        let mut response = (self.status, body).into_response();

        if self.unrecoverable {
            response
                .headers_mut()
                .insert(header::CONNECTION, HeaderValue::from_static("close"));
        }

        response
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_client_error_body_is_status_text() {
        let response = AppError::not_found(anyhow!("snippet 7 missing")).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::CONNECTION).is_none());
    }

    #[test]
    fn test_from_converts_to_internal() {
        let err: AppError = std::io::Error::other("disk on fire").into();

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_unrecoverable());
    }

    #[test]
    fn test_unrecoverable_closes_connection() {
        let err = AppError::unrecoverable(anyhow!("bad decode target"));
        assert!(err.is_unrecoverable());

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONNECTION).unwrap(),
            "close"
        );
    }
}
