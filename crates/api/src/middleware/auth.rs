//! Bearer token authentication middleware.
//!
//! Verifies the JWT on protected routes and stores the decoded
//! [`AuthClaims`] in request extensions. Handlers resolve the claims to a
//! donor, doctor or blood bank through the extractors in
//! [`crate::extractors`].

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::jwt::{JwtConfig, JwtError, PrincipalKind};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Verified token contents.
#[derive(Debug, Clone)]
pub struct AuthClaims {
    /// User id or blood bank id, depending on `kind`.
    pub principal_id: Uuid,
    pub kind: PrincipalKind,
    /// JWT ID (jti) for session tracking.
    pub jti: String,
}

impl AuthClaims {
    /// Verifies a token and extracts the principal it was issued to.
    pub fn from_token(jwt: &JwtConfig, token: &str) -> Result<Self, JwtError> {
        let claims = jwt.verify(token)?;
        Ok(Self {
            principal_id: claims.subject_id()?,
            kind: claims.kind,
            jti: claims.jti,
        })
    }
}

/// Returns the token of a `Bearer` Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Maps a verification failure to the response the client sees.
pub fn rejection(err: JwtError) -> ApiError {
    match err {
        JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
        other => {
            tracing::debug!(error = %other, "JWT validation failed");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        }
    }
}

/// Middleware that requires a valid access token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let claims = match bearer_token(req.headers()) {
        Some(token) => AuthClaims::from_token(&state.jwt, token),
        None => {
            return ApiError::Unauthorized("Missing or invalid Authorization header".to_string())
                .into_response();
        }
    };

    match claims {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => rejection(e).into_response(),
    }
}
