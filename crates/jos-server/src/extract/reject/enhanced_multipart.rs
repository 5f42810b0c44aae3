//! Multipart form extractor.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{FromRequest, Multipart as AxumMultipart, Request};
use derive_more::{Deref, DerefMut, From};

use crate::handler::{Error, ErrorKind};

/// [`axum::extract::Multipart`] whose rejections read
/// `Failed to parse multipart form: <reason>`.
#[must_use]
#[derive(Debug, Deref, DerefMut, From)]
pub struct Multipart(pub AxumMultipart);

impl Multipart {
    #[inline]
    pub fn into_inner(self) -> AxumMultipart {
        self.0
    }
}

impl<S> FromRequest<S> for Multipart
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        AxumMultipart::from_request(req, state)
            .await
            .map(Multipart)
            .map_err(Into::into)
    }
}

impl From<MultipartRejection> for Error<'static> {
    fn from(rejection: MultipartRejection) -> Self {
        ErrorKind::BadRequest.with_message(format!(
            "Failed to parse multipart form: {}",
            rejection.body_text()
        ))
    }
}

impl From<MultipartError> for Error<'static> {
    fn from(error: MultipartError) -> Self {
        let status = error.status();
        let kind = if status.as_u16() == 413 {
            ErrorKind::PayloadTooLarge
        } else {
            ErrorKind::BadRequest
        };

        kind.with_message(format!(
            "Failed to parse multipart form: {}",
            error.body_text()
        ))
    }
}

impl aide::OperationInput for Multipart {
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        AxumMultipart::operation_input(ctx, operation);
    }
}
