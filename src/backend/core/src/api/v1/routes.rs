//! V1 API routes for Campus Core.
//!
//! This module defines all V1 API routes and their handlers.

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::api::{handlers, AppState};
use crate::authz::RequireRoleLayer;
use crate::models::GlobalRole;

/// V1 API prefix.
pub const V1_PREFIX: &str = "/api/v1";

/// Build the V1 API router.
///
/// All routes are mounted under `/api/v1/`.
///
/// # Endpoints
///
/// ## Auth
/// - `POST /api/v1/auth/register` - Register (always as student)
/// - `POST /api/v1/auth/login` - Obtain an access token
/// - `POST /api/v1/auth/logout` - Revoke the current token
/// - `POST /api/v1/auth/join` - Join an organization by access code
/// - `GET  /api/v1/me` - Current user
/// - `GET  /api/v1/me/certificates` - Current user's certificates
///
/// ## Courses
/// - `GET    /api/v1/courses` - Visibility-resolved course listing
/// - `POST   /api/v1/courses` - Create a course (authoring roles)
/// - `GET    /api/v1/courses/:id` - Get course (view)
/// - `PATCH  /api/v1/courses/:id` - Update course (edit)
/// - `DELETE /api/v1/courses/:id` - Delete course (owner)
/// - `POST   /api/v1/courses/:id/publish` - Publish course (edit)
///
/// ## Staff
/// - `GET    /api/v1/courses/:id/staff` - Roster (staff)
/// - `POST   /api/v1/courses/:id/staff` - Add staff (owner)
/// - `DELETE /api/v1/courses/:id/staff/:user_id` - Remove staff (owner)
///
/// ## Content
/// - `GET/POST /api/v1/courses/:id/modules` - List/create modules
/// - `GET/POST /api/v1/modules/:id/lessons` - List/create lessons
/// - `POST /api/v1/lessons/:id/quizzes` - Create quiz
///
/// ## Enrollment & certification
/// - `POST /api/v1/courses/:id/enroll` - Enroll (published, visible)
/// - `POST /api/v1/lessons/:id/complete` - Record lesson completion
/// - `POST /api/v1/courses/:id/certificate` - Issue certificate
/// - `GET  /api/v1/certificates/:serial` - Public verification
///
/// ## Administration
/// - `GET/POST /api/v1/organizations` - List/create tenants (super admin)
/// - `GET /api/v1/organizations/:id` - Get tenant (members and admins)
/// - `PATCH /api/v1/users/:id/role` - Update global role (org/super admin)
/// - `PATCH /api/v1/users/:id/organization` - Reassign tenant (super admin)
pub fn v1_router() -> Router<AppState> {
    // Super-admin-only surface: the empty allowed set passes no one except
    // the implicit super admin.
    let super_admin_routes = Router::new()
        .route(
            "/organizations",
            post(handlers::create_organization).get(handlers::list_organizations),
        )
        .route(
            "/users/:id/organization",
            patch(handlers::update_user_organization),
        )
        .route_layer(RequireRoleLayer::new(&[]));

    let org_admin_routes = Router::new()
        .route("/users/:id/role", patch(handlers::update_user_role))
        .route_layer(RequireRoleLayer::new(&[GlobalRole::OrgAdmin]));

    Router::new()
        // Auth endpoints
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/join", post(handlers::join_organization))
        .route("/me", get(handlers::me))
        .route("/me/certificates", get(handlers::my_certificates))
        // Course endpoints (the create handler gates on authoring roles,
        // the one decision global roles make for courses)
        .route(
            "/courses",
            get(handlers::list_courses).post(handlers::create_course),
        )
        .route(
            "/courses/:id",
            get(handlers::get_course)
                .patch(handlers::update_course)
                .delete(handlers::delete_course),
        )
        .route("/courses/:id/publish", post(handlers::publish_course))
        // Staff endpoints
        .route(
            "/courses/:id/staff",
            get(handlers::list_staff).post(handlers::add_staff),
        )
        .route("/courses/:id/staff/:user_id", delete(handlers::remove_staff))
        // Content endpoints
        .route(
            "/courses/:id/modules",
            get(handlers::list_modules).post(handlers::create_module),
        )
        .route(
            "/modules/:id/lessons",
            get(handlers::list_lessons).post(handlers::create_lesson),
        )
        .route("/lessons/:id/quizzes", post(handlers::create_quiz))
        // Enrollment & certification endpoints
        .route("/courses/:id/enroll", post(handlers::enroll))
        .route("/lessons/:id/complete", post(handlers::complete_lesson))
        .route("/courses/:id/certificate", post(handlers::issue_certificate))
        .route("/certificates/:serial", get(handlers::verify_certificate))
        // Organization endpoints (member-visible)
        .route("/organizations/:id", get(handlers::get_organization))
        // Role-gated route groups
        .merge(super_admin_routes)
        .merge(org_admin_routes)
}

/// V1 API route constants for use in clients and documentation.
pub mod paths {
    // Auth routes
    pub const REGISTER: &str = "/api/v1/auth/register";
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const ME: &str = "/api/v1/me";

    // Course routes
    pub const COURSES: &str = "/api/v1/courses";
    pub const COURSE: &str = "/api/v1/courses/:id";
    pub const COURSE_PUBLISH: &str = "/api/v1/courses/:id/publish";
    pub const COURSE_STAFF: &str = "/api/v1/courses/:id/staff";
    pub const COURSE_ENROLL: &str = "/api/v1/courses/:id/enroll";
    pub const COURSE_CERTIFICATE: &str = "/api/v1/courses/:id/certificate";

    // Content routes
    pub const COURSE_MODULES: &str = "/api/v1/courses/:id/modules";
    pub const MODULE_LESSONS: &str = "/api/v1/modules/:id/lessons";

    // Certificate routes
    pub const CERTIFICATE_VERIFY: &str = "/api/v1/certificates/:serial";

    // Administration routes
    pub const ORGANIZATIONS: &str = "/api/v1/organizations";
    pub const USER_ROLE: &str = "/api/v1/users/:id/role";
}
