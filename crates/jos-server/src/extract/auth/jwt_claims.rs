use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, decode_header};
use serde_json::{Map, Value};

use super::AuthHeader;
use crate::TRACING_TARGET_AUTHENTICATION;
use crate::handler::{Error, ErrorKind, Result};

/// Algorithms accepted in the token header.
pub const SUPPORTED_ALGORITHMS: [Algorithm; 8] = [
    Algorithm::HS256,
    Algorithm::HS384,
    Algorithm::HS512,
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::ES256,
    Algorithm::ES384,
];

/// Decoded, unverified token claims.
///
/// Inserted into the request extensions by the authentication middleware,
/// so handlers behind it can extract them without decoding twice.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthClaims {
    algorithm: Algorithm,
    claims: Map<String, Value>,
}

impl AuthClaims {
    /// Decodes the header and payload of a compact JWT.
    pub fn parse(token: &str) -> Result<Self> {
        let header = decode_header(token).map_err(|error| malformed(error.to_string()))?;
        if !SUPPORTED_ALGORITHMS.contains(&header.alg) {
            return Err(malformed(format!(
                "unsupported signing algorithm {:?}",
                header.alg
            )));
        }

        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| malformed("missing payload segment"))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|error| malformed(format!("payload is not base64url: {error}")))?;
        let claims: Map<String, Value> = serde_json::from_slice(&bytes)
            .map_err(|error| malformed(format!("payload is not a JSON object: {error}")))?;

        Ok(Self {
            algorithm: header.alg,
            claims,
        })
    }

    #[inline]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    #[inline]
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// Returns the `sub` claim when it is a string.
    pub fn subject(&self) -> Option<&str> {
        self.claims.get("sub").and_then(Value::as_str)
    }
}

fn malformed(reason: impl std::fmt::Display) -> Error<'static> {
    ErrorKind::MalformedAuthToken
        .with_message(format!("invalid token format: {reason}"))
        .with_resource("authentication")
}

impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Self>() {
            return Ok(claims.clone());
        }

        let auth_header = AuthHeader::from_request_parts(parts, state).await?;
        let claims = Self::parse(auth_header.token()).inspect_err(|error| {
            tracing::debug!(
                target: TRACING_TARGET_AUTHENTICATION,
                error = %error,
                "Rejected bearer token"
            );
        })?;

        parts.extensions.insert(claims.clone());
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    use super::*;

    fn token(algorithm: Algorithm) -> anyhow::Result<String> {
        let claims = json!({"sub": "operator", "exp": 4_102_444_800u64});
        let key = EncodingKey::from_secret(b"secret");
        Ok(encode(&Header::new(algorithm), &claims, &key)?)
    }

    #[test]
    fn hmac_token_is_decoded_without_verification() -> anyhow::Result<()> {
        let claims = AuthClaims::parse(&token(Algorithm::HS256)?)?;
        assert_eq!(claims.algorithm(), Algorithm::HS256);
        assert_eq!(claims.subject(), Some("operator"));
        Ok(())
    }

    #[test]
    fn garbage_is_malformed() {
        let error = AuthClaims::parse("not-a-token").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MalformedAuthToken);
        assert!(error.message().unwrap_or_default().starts_with("invalid token format"));
    }

    #[test]
    fn unsupported_algorithm_is_rejected() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"PS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"operator"}"#);
        let error = AuthClaims::parse(&format!("{header}.{payload}.c2ln")).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::MalformedAuthToken);
        assert!(error.message().unwrap_or_default().contains("PS256"));
    }
}
