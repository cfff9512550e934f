//! Axum middleware gating routes on a minimum global role.
//!
//! This layer covers route-level checks that are static per endpoint (e.g.
//! organization administration requires an org admin). Course-specific
//! decisions need the course row and cannot be made here; they happen in
//! handlers via [`super::policy::can`] with a freshly fetched
//! [`super::policy::ResourceContext`].

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::warn;

use crate::middleware::auth::AuthContext;
use crate::models::GlobalRole;

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Layer
// ═══════════════════════════════════════════════════════════════════════════════

/// Layer that rejects requests whose authenticated global role is not in the
/// allowed set. Super admins always pass.
///
/// # Example
///
/// ```rust,ignore
/// use campus_core::authz::RequireRoleLayer;
/// use campus_core::models::GlobalRole;
///
/// let app = Router::new()
///     .route("/api/v1/organizations", post(create_organization))
///     .route_layer(RequireRoleLayer::new(&[GlobalRole::OrgAdmin]));
/// ```
#[derive(Clone)]
pub struct RequireRoleLayer {
    allowed: &'static [GlobalRole],
}

impl RequireRoleLayer {
    pub fn new(allowed: &'static [GlobalRole]) -> Self {
        Self { allowed }
    }
}

impl<S> Layer<S> for RequireRoleLayer {
    type Service = RequireRoleService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireRoleService {
            inner,
            allowed: self.allowed,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Service
// ═══════════════════════════════════════════════════════════════════════════════

/// Service enforcing the role requirement per request.
#[derive(Clone)]
pub struct RequireRoleService<S> {
    inner: S,
    allowed: &'static [GlobalRole],
}

impl<S> Service<Request<Body>> for RequireRoleService<S>
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

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let allowed = self.allowed;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let ctx = request.extensions().get::<AuthContext>().cloned();

            let ctx = match ctx {
                Some(ctx) => ctx,
                None => {
                    return Ok(unauthenticated_response());
                }
            };

            if ctx.role != GlobalRole::SuperAdmin && !allowed.contains(&ctx.role) {
                warn!(
                    user_id = %ctx.user_id,
                    role = %ctx.role,
                    required = ?allowed,
                    "Role requirement not met"
                );
                return Ok(forbidden_response(&format!(
                    "This operation requires one of the following roles: {}",
                    allowed
                        .iter()
                        .map(|r| r.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }

            inner.call(request).await
        })
    }
}

/// Build a 401 Unauthorized JSON response.
fn unauthenticated_response() -> Response {
    let body = serde_json::json!({
        "success": false,
        "error": {
            "code": "UNAUTHENTICATED",
            "message": "Authentication required for this resource",
        }
    });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

/// Build a 403 Forbidden JSON response.
fn forbidden_response(message: &str) -> Response {
    let body = serde_json::json!({
        "success": false,
        "error": {
            "code": "INSUFFICIENT_ROLE",
            "message": message,
        }
    });
    (StatusCode::FORBIDDEN, Json(body)).into_response()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_construction() {
        let layer = RequireRoleLayer::new(&[GlobalRole::OrgAdmin]);
        assert_eq!(layer.allowed, &[GlobalRole::OrgAdmin]);
    }

    #[test]
    fn test_super_admin_always_in_allowed_set() {
        // The service special-cases SuperAdmin; the allowed slice never
        // needs to list it.
        let allowed: &[GlobalRole] = &[GlobalRole::Instructor];
        assert!(!allowed.contains(&GlobalRole::SuperAdmin));
    }
}
