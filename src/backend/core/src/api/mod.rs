//! API layer for Campus Core.
//!
//! REST interface via Axum. All authenticated routes sit behind
//! [`crate::middleware::AuthLayer`]; role-static admin routes additionally
//! carry a [`crate::authz::RequireRoleLayer`]. Course-level decisions happen
//! inside handlers and the storage layer with the permission evaluator.
//!
//! Boundary mapping of authorization outcomes:
//! - evaluator `Deny` becomes 403 with `{message}`
//! - resolver `OrganizationNotFound` becomes 400
//! - missing/invalid credentials become 401 (never reach the core)

mod handlers;
pub mod v1;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::db::{health::DatabaseHealthMonitor, Database};
use crate::middleware::{AuthLayer, TokenService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub tokens: Arc<TokenService>,
    pub db_health: DatabaseHealthMonitor,
    pub metrics: Option<PrometheusHandle>,
}

/// Build the API router.
///
/// - Health and metrics endpoints (unversioned, public)
/// - V1 API routes under `/api/v1/`
/// - Authentication, tracing, compression, CORS layers
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth = AuthLayer::new(state.tokens.clone());

    Router::new()
        // Unversioned endpoints (public)
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::prometheus_metrics))
        // V1 API (stable)
        .nest("/api/v1", v1::routes::v1_router())
        // Middleware (outermost last)
        .layer(auth)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// API response wrapper.
#[derive(serde::Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_code: None,
        }
    }

    pub fn error_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_code: Some(code.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success("test data");
        assert!(response.success);
        assert_eq!(response.data, Some("test data"));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_api_response_error() {
        let response: ApiResponse<()> = ApiResponse::error("test error");
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error, Some("test error".to_string()));
    }

    #[test]
    fn test_api_response_error_with_code() {
        let response: ApiResponse<()> = ApiResponse::error_with_code("denied", "CROSS_TENANT");
        assert_eq!(response.error_code, Some("CROSS_TENANT".to_string()));
    }
}
