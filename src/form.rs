use anyhow::anyhow;
use axum::{
    Form,
    extract::{FromRequest, Request, rejection::FormRejection},
};
use serde::de::DeserializeOwned;
use snippetbox_core::AppError;

/// `application/x-www-form-urlencoded` body decoded into `T`.
///
/// A body that cannot be decoded is the client's fault and yields 400. Any
/// other rejection means the extractor was misused and is unrecoverable.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostForm<T>(pub T);

impl<T, S> FromRequest<S> for PostForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                FormRejection::InvalidFormContentType(_) => {
                    AppError::bad_request(anyhow!("Expected a form-encoded body"))
                }
                FormRejection::FailedToDeserializeForm(e) => {
                    AppError::bad_request(anyhow!("Invalid form data: {}", e.body_text()))
                }
                FormRejection::FailedToDeserializeFormBody(e) => {
                    AppError::bad_request(anyhow!("Invalid form data: {}", e.body_text()))
                }
                FormRejection::BytesRejection(e) => {
                    AppError::bad_request(anyhow!("Failed to read body: {}", e.body_text()))
                }
                other => AppError::unrecoverable(anyhow!(
                    "Form decode failed: {}",
                    other.body_text()
                )),
            })?;

        Ok(PostForm(value))
    }
}
