//! # Campus Core
//!
//! Multi-tenant Learning Management System backend.
//!
//! ## Architecture
//!
//! - **Authz Engine**: identity normalization, a pure permission evaluator,
//!   and a visibility resolver for tenant/marketplace course listing
//! - **Models**: users, organizations, courses, staff, content, enrollment
//! - **Database**: PostgreSQL storage with decision-and-write transactions
//! - **API**: Axum REST interface with JWT authentication
//! - **Telemetry**: structured logging and Prometheus metrics
//! - **Middleware**: bearer-token authentication and role-gated routes

pub mod api;
pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod telemetry;

pub use error::{CampusError, ErrorCode, ErrorSeverity, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::authz::{
        can, resolve_course_scope, Action, Actor, CourseScope, Decision, DenyReason,
        EffectiveRole, RequireRoleLayer, ResourceContext, ResourceKind, TenantRef,
        VisibilityError,
    };
    pub use crate::db::{CourseUpdate, Database};
    pub use crate::error::{CampusError, ErrorCode, ErrorSeverity, Result};
    pub use crate::middleware::{AuthConfig, AuthContext, AuthLayer, Claims, TokenService};
    pub use crate::models::{
        Certificate, Course, CourseModule, CourseRole, CourseStaff, Enrollment, GlobalRole,
        Lesson, Organization, Quiz, User, PUBLIC_MARKETPLACE_SLUG,
    };
    pub use crate::pagination::{PageMetadata, Paginated, PaginationParams};
}
