//! Bearer-token identity.
//!
//! Tokens are issued elsewhere; this module only verifies them and turns
//! the `sub` claim into the caller's [`OwnerId`].

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use common::OwnerId;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use serde_json::Value;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Value,
}

/// Verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verifies `token` and returns the owner it was issued to.
    ///
    /// `sub` may be an integer or a string holding one.
    pub fn verify(&self, token: &str) -> Result<OwnerId, ApiError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => "Token has expired",
                ErrorKind::InvalidSignature => "Invalid token signature",
                _ => "Invalid token",
            };
            tracing::debug!(error = %e, "rejected bearer token");
            ApiError::Unauthorized(reason.to_string())
        })?;

        let owner = match &data.claims.sub {
            Value::Number(n) => n.as_i64().map(OwnerId::new),
            Value::String(s) => s.parse().ok(),
            _ => None,
        };
        owner.ok_or_else(|| ApiError::Unauthorized("Token subject is not a user id".to_string()))
    }

    /// Extracts the token from an `Authorization: Bearer ...` header value.
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub OwnerId);

impl<S, C> FromRequestParts<Arc<AppState<S, C>>> for AuthUser
where
    S: Send + Sync,
    C: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S, C>>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?
            .to_str()
            .map_err(|_| ApiError::Unauthorized("Invalid authorization header".to_string()))?;

        let token = JwtVerifier::extract_from_header(header)
            .ok_or_else(|| ApiError::Unauthorized("Expected a bearer token".to_string()))?;

        state.auth.verify(token).map(AuthUser)
    }
}
