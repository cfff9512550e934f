//! Error handling for Campus Core.
//!
//! One boundary error type (`CampusError`) carrying:
//! - a machine-readable [`ErrorCode`] with a stable numeric code
//! - HTTP status code mapping for API responses
//! - a user-facing message separate from the internal one
//! - severity-based logging via `tracing` and an error counter metric
//!
//! Authorization denials are *not* errors inside the core; the evaluator
//! returns [`crate::authz::Decision`] values. They only become a
//! `CampusError` (and then a 403/400 response) at the HTTP boundary, via the
//! `From` impls at the bottom of this module.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

use crate::authz::{DenyReason, VisibilityError};

// ═══════════════════════════════════════════════════════════════════════════════
// Result Type Alias
// ═══════════════════════════════════════════════════════════════════════════════

/// A specialized Result type for Campus operations.
pub type Result<T> = std::result::Result<T, CampusError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes for API responses.
///
/// These codes are stable and can be used by clients for programmatic error
/// handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Course & content errors (1000-1099)
    CourseNotFound,
    ModuleNotFound,
    LessonNotFound,
    CourseNotPublished,
    CourseIncomplete,

    // Enrollment & certification errors (1100-1199)
    EnrollmentNotFound,
    AlreadyEnrolled,
    CertificateNotFound,
    CertificateAlreadyIssued,

    // Staff errors (1200-1299)
    StaffNotFound,
    AlreadyStaff,
    OwnerIsImplicitStaff,

    // Database errors (2000-2099)
    DatabaseError,
    DatabaseConnectionFailed,
    RecordNotFound,
    DuplicateRecord,

    // Serialization errors (2200-2299)
    SerializationError,

    // Authentication & authorization (4000-4099)
    Unauthenticated,
    InvalidToken,
    TokenExpired,
    InvalidCredentials,
    InsufficientRole,
    CrossTenant,

    // Validation errors (4100-4199)
    ValidationError,
    InvalidInput,

    // Tenancy errors (4200-4299)
    OrganizationNotFound,
    UserNotFound,
    InvalidAccessCode,
    DuplicateSlug,

    // Configuration errors (5000-5099)
    ConfigurationError,

    // Internal errors (9000-9099)
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error.
    pub const fn numeric_code(&self) -> u32 {
        match self {
            Self::CourseNotFound => 1000,
            Self::ModuleNotFound => 1001,
            Self::LessonNotFound => 1002,
            Self::CourseNotPublished => 1003,
            Self::CourseIncomplete => 1004,

            Self::EnrollmentNotFound => 1100,
            Self::AlreadyEnrolled => 1101,
            Self::CertificateNotFound => 1102,
            Self::CertificateAlreadyIssued => 1103,

            Self::StaffNotFound => 1200,
            Self::AlreadyStaff => 1201,
            Self::OwnerIsImplicitStaff => 1202,

            Self::DatabaseError => 2000,
            Self::DatabaseConnectionFailed => 2001,
            Self::RecordNotFound => 2002,
            Self::DuplicateRecord => 2003,

            Self::SerializationError => 2200,

            Self::Unauthenticated => 4000,
            Self::InvalidToken => 4001,
            Self::TokenExpired => 4002,
            Self::InvalidCredentials => 4003,
            Self::InsufficientRole => 4010,
            Self::CrossTenant => 4011,

            Self::ValidationError => 4100,
            Self::InvalidInput => 4101,

            Self::OrganizationNotFound => 4200,
            Self::UserNotFound => 4201,
            Self::InvalidAccessCode => 4202,
            Self::DuplicateSlug => 4203,

            Self::ConfigurationError => 5000,

            Self::InternalError => 9000,
        }
    }

    /// Get the HTTP status code for this error.
    pub const fn http_status(&self) -> StatusCode {
        match self {
            // Not Found (404)
            Self::CourseNotFound
            | Self::ModuleNotFound
            | Self::LessonNotFound
            | Self::EnrollmentNotFound
            | Self::CertificateNotFound
            | Self::StaffNotFound
            | Self::UserNotFound
            | Self::RecordNotFound => StatusCode::NOT_FOUND,

            // Conflict (409)
            Self::AlreadyEnrolled
            | Self::CertificateAlreadyIssued
            | Self::AlreadyStaff
            | Self::OwnerIsImplicitStaff
            | Self::DuplicateRecord
            | Self::DuplicateSlug => StatusCode::CONFLICT,

            // Unprocessable Entity (422)
            Self::ValidationError | Self::InvalidInput | Self::CourseIncomplete => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            // Unauthorized (401)
            Self::Unauthenticated
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,

            // Forbidden (403)
            Self::InsufficientRole | Self::CrossTenant | Self::CourseNotPublished => {
                StatusCode::FORBIDDEN
            }

            // Bad Request (400): a dangling tenant reference is a data
            // problem in the request's context, not an authorization denial.
            Self::OrganizationNotFound | Self::InvalidAccessCode => StatusCode::BAD_REQUEST,

            // Service Unavailable (503)
            Self::DatabaseConnectionFailed => StatusCode::SERVICE_UNAVAILABLE,

            // Internal Server Error (500)
            Self::DatabaseError
            | Self::SerializationError
            | Self::ConfigurationError
            | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error is retryable. Authorization decisions never are:
    /// they are deterministic over their inputs.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::DatabaseConnectionFailed | Self::DatabaseError)
    }

    /// Get the error category for grouping.
    pub const fn category(&self) -> &'static str {
        match self.numeric_code() {
            1000..=1099 => "course",
            1100..=1199 => "enrollment",
            1200..=1299 => "staff",
            2000..=2099 => "database",
            2200..=2299 => "serialization",
            4000..=4099 => "authorization",
            4100..=4199 => "validation",
            4200..=4299 => "tenancy",
            5000..=5099 => "configuration",
            _ => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Severity
// ═══════════════════════════════════════════════════════════════════════════════

/// Severity level for errors (affects logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// User errors (bad input, denied actions, missing records)
    Low,
    /// Operational issues
    Medium,
    /// System errors
    High,
}

impl ErrorSeverity {
    pub const fn from_code(code: &ErrorCode) -> Self {
        match code {
            ErrorCode::DatabaseError
            | ErrorCode::DatabaseConnectionFailed
            | ErrorCode::SerializationError
            | ErrorCode::ConfigurationError
            | ErrorCode::InternalError => Self::High,

            // A dangling organization reference is an integrity problem
            // worth operator attention, unlike a plain denial.
            ErrorCode::OrganizationNotFound => Self::Medium,

            _ => Self::Low,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Error Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The main error type for Campus Core.
#[derive(Error, Debug)]
pub struct CampusError {
    /// Machine-readable error code
    code: ErrorCode,

    /// User-friendly error message (safe to expose to clients)
    user_message: Cow<'static, str>,

    /// Detailed internal message (for logging only)
    internal_message: Option<String>,

    /// The source error that caused this error
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl fmt::Display for CampusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.user_message)?;
        if let Some(ref internal) = self.internal_message {
            write!(f, " (internal: {})", internal)?;
        }
        Ok(())
    }
}

impl CampusError {
    // ─────────────────────────────────────────────────────────────────────────
    // Constructors
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new error with code and user message.
    pub fn new(code: ErrorCode, user_message: impl Into<Cow<'static, str>>) -> Self {
        let error = Self {
            code,
            user_message: user_message.into(),
            internal_message: None,
            source: None,
        };
        error.record_metrics();
        error
    }

    /// Create an error with both user and internal messages.
    pub fn with_internal(
        code: ErrorCode,
        user_message: impl Into<Cow<'static, str>>,
        internal_message: impl Into<String>,
    ) -> Self {
        let mut error = Self::new(code, user_message);
        error.internal_message = Some(internal_message.into());
        error
    }

    /// Create an internal error (500).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_internal(ErrorCode::InternalError, "An internal error occurred", message)
    }

    /// Create a not found error.
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl fmt::Display) -> Self {
        let entity_type = entity_type.into();
        let code = match entity_type.as_str() {
            "course" => ErrorCode::CourseNotFound,
            "module" => ErrorCode::ModuleNotFound,
            "lesson" => ErrorCode::LessonNotFound,
            "user" => ErrorCode::UserNotFound,
            "organization" => ErrorCode::OrganizationNotFound,
            "enrollment" => ErrorCode::EnrollmentNotFound,
            "certificate" => ErrorCode::CertificateNotFound,
            _ => ErrorCode::RecordNotFound,
        };
        Self::new(code, format!("{} not found: {}", entity_type, entity_id))
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Create an unauthenticated error (the boundary's concern; the authz
    /// core never sees a request without an actor).
    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::Unauthenticated, "Authentication required")
    }

    /// Create an invalid credentials error.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials, "Invalid email or password")
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder Methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn internal_message(&self) -> Option<&str> {
        self.internal_message.as_deref()
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::from_code(&self.code)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Logging
    // ─────────────────────────────────────────────────────────────────────────

    /// Log this error with appropriate severity.
    pub fn log(&self) {
        let code = self.code.to_string();
        let category = self.code.category();
        let status = self.http_status().as_u16();

        match self.severity() {
            ErrorSeverity::High => {
                error!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    source = ?self.source,
                    "High severity error"
                );
            }
            ErrorSeverity::Medium => {
                warn!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    "Medium severity error"
                );
            }
            ErrorSeverity::Low => {
                tracing::debug!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    "Low severity error"
                );
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Metrics
    // ─────────────────────────────────────────────────────────────────────────

    fn record_metrics(&self) {
        counter!(
            "campus_errors_total",
            "code" => self.code.to_string(),
            "category" => self.code.category().to_string(),
        )
        .increment(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// API Response
// ═══════════════════════════════════════════════════════════════════════════════

/// Error response for API clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Whether the request was successful (always false for errors)
    pub success: bool,

    /// Error information
    pub error: ErrorInfo,
}

/// Detailed error information for API responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Numeric error code
    pub numeric_code: u32,

    /// User-friendly error message
    pub message: String,

    /// Timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<&CampusError> for ErrorResponse {
    fn from(error: &CampusError) -> Self {
        Self {
            success: false,
            error: ErrorInfo {
                code: error.code,
                numeric_code: error.code.numeric_code(),
                message: error.user_message.to_string(),
                timestamp: chrono::Utc::now(),
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Axum Integration
// ═══════════════════════════════════════════════════════════════════════════════

impl IntoResponse for CampusError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.http_status();
        let response = ErrorResponse::from(&self);

        (status, Json(response)).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Boundary translation of authorization outcomes
// ═══════════════════════════════════════════════════════════════════════════════

/// `Deny` becomes HTTP 403 with the reason as message.
impl From<DenyReason> for CampusError {
    fn from(reason: DenyReason) -> Self {
        let code = match reason {
            DenyReason::InsufficientRole => ErrorCode::InsufficientRole,
            DenyReason::CrossTenant => ErrorCode::CrossTenant,
        };
        Self::new(code, reason.to_string())
    }
}

/// Resolver failure becomes HTTP 400. Fail-closed is preserved: the caller
/// gets an error, never a broader course list.
impl From<VisibilityError> for CampusError {
    fn from(error: VisibilityError) -> Self {
        match error {
            VisibilityError::OrganizationNotFound(org_id) => Self::with_internal(
                ErrorCode::OrganizationNotFound,
                "Your organization could not be resolved",
                format!("dangling organization reference: {org_id}"),
            ),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// From Implementations for Common Error Types
// ═══════════════════════════════════════════════════════════════════════════════

impl From<sqlx::Error> for CampusError {
    fn from(error: sqlx::Error) -> Self {
        let (code, user_msg) = match &error {
            sqlx::Error::RowNotFound => (
                ErrorCode::RecordNotFound,
                "The requested record was not found",
            ),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    return Self::with_internal(
                        ErrorCode::DuplicateRecord,
                        "A record with this identifier already exists",
                        format!("constraint violation: {}", constraint),
                    )
                    .with_source(error);
                }
                (ErrorCode::DatabaseError, "A database error occurred")
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => (
                ErrorCode::DatabaseConnectionFailed,
                "Unable to connect to the database",
            ),
            _ => (ErrorCode::DatabaseError, "A database error occurred"),
        };

        Self::with_internal(code, user_msg, error.to_string()).with_source(error)
    }
}

impl From<serde_json::Error> for CampusError {
    fn from(error: serde_json::Error) -> Self {
        Self::with_internal(
            ErrorCode::SerializationError,
            "Failed to process JSON data",
            error.to_string(),
        )
        .with_source(error)
    }
}

impl From<std::io::Error> for CampusError {
    fn from(error: std::io::Error) -> Self {
        Self::with_internal(
            ErrorCode::InternalError,
            "An I/O error occurred",
            error.to_string(),
        )
        .with_source(error)
    }
}

impl From<anyhow::Error> for CampusError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<CampusError>() {
            Ok(campus_error) => campus_error,
            Err(error) => Self::with_internal(
                ErrorCode::InternalError,
                "An internal error occurred",
                error.to_string(),
            ),
        }
    }
}

impl From<config::ConfigError> for CampusError {
    fn from(error: config::ConfigError) -> Self {
        Self::with_internal(
            ErrorCode::ConfigurationError,
            "Configuration error occurred",
            error.to_string(),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::CourseNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::InsufficientRole.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ErrorCode::CrossTenant.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ErrorCode::OrganizationNotFound.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::Unauthenticated.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::ValidationError.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_authorization_errors_never_retryable() {
        assert!(!ErrorCode::InsufficientRole.is_retryable());
        assert!(!ErrorCode::CrossTenant.is_retryable());
        assert!(!ErrorCode::OrganizationNotFound.is_retryable());
        assert!(ErrorCode::DatabaseConnectionFailed.is_retryable());
    }

    #[test]
    fn test_deny_reason_maps_to_403() {
        let err: CampusError = DenyReason::InsufficientRole.into();
        assert_eq!(err.http_status(), StatusCode::FORBIDDEN);

        let err: CampusError = DenyReason::CrossTenant.into();
        assert_eq!(err.code(), ErrorCode::CrossTenant);
        assert_eq!(err.http_status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_visibility_error_maps_to_400() {
        let err: CampusError = VisibilityError::OrganizationNotFound(uuid::Uuid::new_v4()).into();
        assert_eq!(err.code(), ErrorCode::OrganizationNotFound);
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_picks_specific_code() {
        assert_eq!(
            CampusError::not_found("course", "abc").code(),
            ErrorCode::CourseNotFound
        );
        assert_eq!(
            CampusError::not_found("widget", "abc").code(),
            ErrorCode::RecordNotFound
        );
    }

    #[test]
    fn test_error_response_serialization() {
        let error = CampusError::validation("Title must not be empty");
        let response = ErrorResponse::from(&error);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("VALIDATION_ERROR"));
        assert!(json.contains("Title must not be empty"));
    }

    #[test]
    fn test_error_display_includes_internal() {
        let error = CampusError::with_internal(
            ErrorCode::DatabaseError,
            "A database error occurred",
            "connection refused: localhost:5432",
        );

        let display = format!("{}", error);
        assert!(display.contains("DatabaseError"));
        assert!(display.contains("connection refused"));
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(
            ErrorSeverity::from_code(&ErrorCode::InsufficientRole),
            ErrorSeverity::Low
        );
        assert_eq!(
            ErrorSeverity::from_code(&ErrorCode::OrganizationNotFound),
            ErrorSeverity::Medium
        );
        assert_eq!(
            ErrorSeverity::from_code(&ErrorCode::DatabaseError),
            ErrorSeverity::High
        );
    }
}
