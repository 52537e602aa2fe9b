//! JWT Authentication Middleware
//!
//! Every registry route requires a bearer token signed with the configured
//! HS256 secret.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::request_id::RequestId;
use crate::infrastructure::driven_adapters::config::AppConfig;
use crate::infrastructure::driving_adapters::api_rest::AppState;
use crate::shared::errors::{ErrorDetail, ErrorResponse};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (caller identity, e.g. a provisioning pipeline)
    pub sub: String,
    #[serde(default)]
    pub role: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Caller identity extracted from the JWT
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller {
    pub id: String,
    pub role: Option<String>,
}

impl From<Claims> for AuthenticatedCaller {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
        }
    }
}

/// JWT authentication extractor
pub struct JwtAuth(pub AuthenticatedCaller);

/// Error type for authentication failures
#[derive(Debug)]
pub struct AuthError {
    message: String,
    request_id: Option<String>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorDetail {
                code: "UNAUTHORIZED".to_string(),
                message: self.message,
                details: None,
            },
            request_id: self.request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for JwtAuth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts.extensions.get::<RequestId>().map(ToString::to_string);
        let reject = |message: &str| AuthError {
            message: message.to_string(),
            request_id: request_id.clone(),
        };

        // Get config from request extensions
        let config = parts
            .extensions
            .get::<Arc<AppConfig>>()
            .cloned()
            .ok_or_else(|| reject("Configuration not available"))?;

        // Extract Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| reject("Missing Authorization header"))?;

        // Check Bearer prefix
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| reject("Invalid Authorization header format"))?;

        // Decode and validate with a pinned algorithm so a token cannot pick its own
        let mut validation = Validation::new(Algorithm::HS256);
        // Require a valid exp claim
        validation.validate_exp = true;
        // Clock skew tolerance in seconds
        validation.leeway = 60;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            // Keep validation details in the logs, not the response
            tracing::debug!(error = %e, "Rejected bearer token");
            reject("Invalid or expired token")
        })?;

        // Expose the caller identity to handlers
        Ok(JwtAuth(token_data.claims.into()))
    }
}

/// Middleware layer that adds config to request extensions for JWT validation
pub async fn add_config_extension(
    State(state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Response {
    request.extensions_mut().insert(Arc::clone(&state.config));
    next.run(request).await
}
