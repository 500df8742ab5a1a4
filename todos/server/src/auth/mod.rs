use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;

use crate::config::Config;
use crate::web::api::v1::FailureResponse;

/// Identity of the caller making the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserIdentity {
    pub id: i64,
}

impl UserIdentity {
    /// Creates a new UserIdentity instance.
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

/// Authentication state containing the JWT secret shared with the identity provider.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_secret: String,
}

impl AuthState {
    /// Creates a new AuthState from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct Claims {
    pub exp: usize,   // Expiry time of the token
    pub iat: usize,   // Issued at time of the token
    pub user_id: i64, // Owner of every todo touched with this token
}

/// Custom error type for authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No valid identity is attached to the request.
    #[error("Authentication required to access this resource")]
    Unauthenticated,
    /// Represents an error during JWT operations.
    #[error("JWT operation failed")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status_code = match self {
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Jwt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status_code, Json(FailureResponse::new(self.to_string()))).into_response()
    }
}

/// Resolves the caller of the current request.
///
/// Returns `AuthError::Unauthenticated` if `auth_user_middleware` did not attach an identity.
pub fn current_user(extensions: &Extensions) -> Result<UserIdentity, AuthError> {
    extensions
        .get::<UserIdentity>()
        .copied()
        .ok_or(AuthError::Unauthenticated)
}

impl<S> FromRequestParts<S> for UserIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(&parts.extensions)
    }
}

/// Authentication middleware that extracts the caller from the Authorization Bearer header.
/// Sets the UserIdentity extension if a valid JWT token is found; never rejects on its own.
pub async fn auth_user_middleware(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if let Some(token) = token {
        match decode_jwt(token, &state.jwt_secret) {
            Ok(claims) => {
                request
                    .extensions_mut()
                    .insert(UserIdentity::new(claims.user_id));
            }
            Err(err) => tracing::debug!("Rejected bearer token: {}", err),
        }
    }

    next.run(request).await
}

/// Middleware that ensures the caller is authenticated.
/// Returns UNAUTHORIZED if no UserIdentity extension is present.
/// This middleware should be applied after auth_user_middleware.
pub async fn require_auth_middleware(request: Request, next: Next) -> Response {
    if let Err(err) = current_user(request.extensions()) {
        return err.into_response();
    }

    next.run(request).await
}

/// Issues a 24 hour token for `user_id`.
pub fn encode_jwt(user_id: i64, jwt_secret: &str) -> Result<String, AuthError> {
    let now = chrono::Utc::now();
    let expire = chrono::Duration::hours(24);
    let exp = (now + expire).timestamp() as usize;
    let iat = now.timestamp() as usize;
    let claims = Claims { exp, iat, user_id };
    let jwt = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;
    Ok(jwt)
}

pub fn decode_jwt(token: &str, jwt_secret: &str) -> Result<Claims, AuthError> {
    let token_data = jsonwebtoken::decode(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
