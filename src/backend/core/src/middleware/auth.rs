//! Authentication middleware.
//!
//! Features:
//! - JWT bearer token validation (HS256)
//! - Token issuance with single global role + organization claims
//! - In-process revocation (logout) tracking
//! - Request context injection for downstream handlers
//!
//! Authentication is a boundary concern: a missing or invalid token is
//! rejected here with 401 and never reaches the authorization core, which
//! always receives a concrete actor.
//!
//! # Example
//!
//! ```rust,ignore
//! use campus_core::middleware::{AuthLayer, AuthConfig, TokenService};
//!
//! let tokens = Arc::new(TokenService::new(AuthConfig::new("secret")));
//! let app = Router::new()
//!     .route("/api/v1/courses", get(list_courses))
//!     .layer(AuthLayer::new(tokens));
//! ```

use axum::{
    body::Body,
    extract::{FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use futures::future::BoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use thiserror::Error;
use tower::{Layer, Service};
use tracing::debug;
use uuid::Uuid;

use crate::models::{GlobalRole, User};

// ═══════════════════════════════════════════════════════════════════════════════
// Error Types
// ═══════════════════════════════════════════════════════════════════════════════

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication credentials")]
    MissingCredentials,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Internal authentication error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "MISSING_CREDENTIALS",
                "Authentication credentials are required",
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "The provided token is invalid",
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_EXPIRED",
                "The authentication token has expired",
            ),
            Self::TokenRevoked => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_REVOKED",
                "The authentication token has been revoked",
            ),
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An authentication error occurred",
            ),
        };

        counter!(
            "campus_auth_errors_total",
            "error_type" => code.to_string()
        )
        .increment(1);

        let body = serde_json::json!({
            "success": false,
            "error": {
                "code": code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JWT Claims
// ═══════════════════════════════════════════════════════════════════════════════

/// JWT token claims.
///
/// `org_id` carries the *raw* organization id (including the marketplace
/// placeholder, if that is what the user row holds); normalization to
/// independent happens in the authz layer, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// User email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Global role (stable string form)
    pub role: String,

    /// Organization ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,

    /// Token ID for revocation tracking
    #[serde(default = "generate_jti")]
    pub jti: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

fn generate_jti() -> String {
    Uuid::new_v4().to_string()
}

impl Claims {
    /// Create claims for a user.
    pub fn for_user(user: &User, ttl: Duration, issuer: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id.to_string(),
            email: Some(user.email.clone()),
            role: user.role.as_str().to_string(),
            org_id: user.organization_id.map(|id| id.to_string()),
            jti: generate_jti(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: Some(issuer.into()),
        }
    }

    /// Check if the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════════

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for HS256 signing
    pub jwt_secret: String,

    /// Access token lifetime
    pub token_ttl: Duration,

    /// Token issuer claim
    pub issuer: String,

    /// Path prefixes that skip authentication entirely
    pub public_paths: Vec<String>,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::hours(1),
            issuer: "campus".to_string(),
            public_paths: vec![
                "/health".to_string(),
                "/metrics".to_string(),
                "/api/v1/auth/register".to_string(),
                "/api/v1/auth/login".to_string(),
                "/api/v1/certificates".to_string(),
            ],
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| path.starts_with(p))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Token Service
// ═══════════════════════════════════════════════════════════════════════════════

/// Issues and validates access tokens.
pub struct TokenService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// jti values revoked before their natural expiry (logout).
    revoked: DashMap<String, DateTime<Utc>>,
}

impl TokenService {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
            revoked: DashMap::new(),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Issue a signed access token for a user.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let claims = Claims::for_user(user, self.config.token_ttl, &self.config.issuer);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Validate a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        if self.revoked.contains_key(&data.claims.jti) {
            return Err(AuthError::TokenRevoked);
        }

        Ok(data.claims)
    }

    /// Revoke a token by its jti (logout). Expired entries are pruned
    /// opportunistically on each call.
    pub fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) {
        let now = Utc::now();
        self.revoked.retain(|_, exp| *exp > now);
        self.revoked.insert(jti.to_string(), expires_at);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Auth Context (extracted in handlers)
// ═══════════════════════════════════════════════════════════════════════════════

/// Verified request identity, injected into request extensions by
/// [`AuthService`].
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: GlobalRole,
    /// Raw organization claim; normalized by the authz layer.
    pub organization_id: Option<Uuid>,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthContext {
    fn from_claims(claims: &Claims) -> Result<Self, AuthError> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let role = GlobalRole::parse(&claims.role).ok_or(AuthError::InvalidToken)?;
        let organization_id = match &claims.org_id {
            Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| AuthError::InvalidToken)?),
            None => None,
        };

        Ok(Self {
            user_id,
            email: claims.email.clone(),
            role,
            organization_id,
            token_id: claims.jti.clone(),
            expires_at: claims.expires_at(),
        })
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Layer
// ═══════════════════════════════════════════════════════════════════════════════

/// Layer that authenticates requests before they reach handlers.
#[derive(Clone)]
pub struct AuthLayer {
    tokens: Arc<TokenService>,
}

impl AuthLayer {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            tokens: self.tokens.clone(),
        }
    }
}

/// Service that validates the bearer token and injects [`AuthContext`].
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    tokens: Arc<TokenService>,
}

impl<S> Service<Request<Body>> for AuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let tokens = self.tokens.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if tokens.config().is_public(request.uri().path()) {
                return inner.call(request).await;
            }

            let token = match bearer_token(&request) {
                Some(token) => token,
                None => return Ok(AuthError::MissingCredentials.into_response()),
            };

            let claims = match tokens.verify(&token) {
                Ok(claims) => claims,
                Err(err) => return Ok(err.into_response()),
            };

            let ctx = match AuthContext::from_claims(&claims) {
                Ok(ctx) => ctx,
                Err(err) => return Ok(err.into_response()),
            };

            debug!(user_id = %ctx.user_id, role = %ctx.role, "Request authenticated");
            request.extensions_mut().insert(ctx);

            inner.call(request).await
        })
    }
}

/// Pull the token out of the `Authorization: Bearer` header.
fn bearer_token(request: &Request<Body>) -> Option<String> {
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(AuthConfig::new("test-secret"))
    }

    fn user() -> User {
        User::new("ada@example.com", "Ada", "hash")
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let tokens = service();
        let user = user();

        let token = tokens.issue(&user).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, "student");
        assert!(claims.org_id.is_none());
    }

    #[test]
    fn test_org_claim_carries_raw_id() {
        let tokens = service();
        let org = Uuid::new_v4();
        let user = user().with_organization(org);

        let token = tokens.issue(&user).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.org_id, Some(org.to_string()));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let tokens = service();
        let other = TokenService::new(AuthConfig::new("different-secret"));

        let token = tokens.issue(&user()).unwrap();
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_revoked_token_rejected() {
        let tokens = service();
        let token = tokens.issue(&user()).unwrap();
        let claims = tokens.verify(&token).unwrap();

        tokens.revoke(&claims.jti, claims.expires_at());
        assert!(matches!(tokens.verify(&token), Err(AuthError::TokenRevoked)));
    }

    #[test]
    fn test_auth_context_from_claims() {
        let tokens = service();
        let user = user().with_role(GlobalRole::OrgAdmin);
        let token = tokens.issue(&user).unwrap();
        let claims = tokens.verify(&token).unwrap();

        let ctx = AuthContext::from_claims(&claims).unwrap();
        assert_eq!(ctx.user_id, user.id);
        assert_eq!(ctx.role, GlobalRole::OrgAdmin);
    }

    #[test]
    fn test_public_paths() {
        let config = AuthConfig::new("s");
        assert!(config.is_public("/health"));
        assert!(config.is_public("/api/v1/auth/login"));
        assert!(config.is_public("/api/v1/certificates/abcd1234"));
        assert!(!config.is_public("/api/v1/courses"));
    }
}
