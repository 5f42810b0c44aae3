use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use crate::TRACING_TARGET_AUTHENTICATION;
use crate::handler::{Error, ErrorKind};

/// Raw bearer token of the `Authorization` header.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeader {
    token: String,
}

impl AuthHeader {
    #[inline]
    pub fn token(&self) -> &str {
        &self.token
    }

    fn missing() -> Error<'static> {
        ErrorKind::MissingAuthToken.with_resource("authentication")
    }
}

impl<S> FromRequestParts<S> for AuthHeader
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(auth_header) = parts.extensions.get::<Self>() {
            return Ok(auth_header.clone());
        }

        // A bare `Bearer` scheme is reported as missing, not malformed.
        let raw = parts
            .headers
            .get(AUTHORIZATION)
            .map(|value| value.as_bytes().trim_ascii());
        match raw {
            None => return Err(Self::missing()),
            Some(value) if value.is_empty() || value.eq_ignore_ascii_case(b"bearer") => {
                return Err(Self::missing());
            }
            Some(_) => {}
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    tracing::debug!(
                        target: TRACING_TARGET_AUTHENTICATION,
                        reason = %rejection,
                        "Rejected authorization header"
                    );
                    ErrorKind::MalformedAuthToken
                        .with_message("invalid token format: expected a Bearer token")
                        .with_resource("authentication")
                })?;

        let token = bearer.token().trim();
        if token.is_empty() {
            return Err(Self::missing());
        }

        let auth_header = Self {
            token: token.to_owned(),
        };
        parts.extensions.insert(auth_header.clone());
        Ok(auth_header)
    }
}
