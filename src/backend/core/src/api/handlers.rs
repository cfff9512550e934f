//! API request handlers with proper error propagation.
//!
//! All handlers return `Result<impl IntoResponse, CampusError>` so that
//! errors are automatically converted to appropriate HTTP status codes via
//! the `IntoResponse` implementation on `CampusError`, including the
//! authorization boundary mapping (`Deny` to 403, `OrganizationNotFound`
//! to 400).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

use super::{ApiResponse, AppState};
use crate::authz::{can, resolve_course_scope, Action, Actor, ResourceContext, ResourceKind};
use crate::db::CourseUpdate;
use crate::error::{CampusError, ErrorCode};
use crate::middleware::AuthContext;
use crate::models::{
    Course, CourseModule, CourseRole, GlobalRole, Lesson, Organization, Quiz, User,
    PUBLIC_MARKETPLACE_SLUG,
};
use crate::pagination::PaginationParams;

// ═══════════════════════════════════════════════════════════════════════════════
// Health & Metrics
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db = state.db_health.check().await;
    Json(serde_json::json!({
        "status": if db.healthy { "healthy" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics {
        Some(handle) => handle.render(),
        None => String::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Shared helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Fresh actor for the authenticated user. Role and tenant come from the
/// user row, not the token, so admin changes take effect immediately.
async fn load_actor(state: &AppState, auth: &AuthContext) -> Result<Actor, CampusError> {
    state.db.load_actor(auth.user_id).await
}

fn hash_password(password: &str) -> Result<String, CampusError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CampusError::internal(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn slug_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^[a-z0-9][a-z0-9-]{1,62}$").unwrap())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Auth Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    /// Optional organization access code for self-service join at signup.
    pub access_code: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, CampusError> {
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(CampusError::validation("A valid email address is required"));
    }
    if req.name.trim().is_empty() {
        return Err(CampusError::validation("Name cannot be empty"));
    }
    if req.password.len() < 8 {
        return Err(CampusError::validation(
            "Password must be at least 8 characters",
        ));
    }

    // Registration always creates a student; privileged roles come from
    // admin tooling only.
    let mut user = User::new(req.email.trim(), req.name.trim(), hash_password(&req.password)?);

    if let Some(code) = req.access_code.as_deref() {
        let org = state
            .db
            .get_organization_by_access_code(code)
            .await?
            .ok_or_else(|| {
                CampusError::new(ErrorCode::InvalidAccessCode, "Unknown organization access code")
            })?;
        user.organization_id = Some(org.id);
    }

    state.db.insert_user(&user).await?;
    let token = state
        .tokens
        .issue(&user)
        .map_err(|e| CampusError::internal(e.to_string()))?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ApiResponse::success(SessionResponse { user, token })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, CampusError> {
    let user = state
        .db
        .get_user_by_email(req.email.trim())
        .await?
        .ok_or_else(CampusError::invalid_credentials)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(CampusError::invalid_credentials());
    }

    let token = state
        .tokens
        .issue(&user)
        .map_err(|e| CampusError::internal(e.to_string()))?;

    Ok(Json(ApiResponse::success(SessionResponse { user, token })))
}

pub async fn logout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<impl IntoResponse, CampusError> {
    state.tokens.revoke(&auth.token_id, auth.expires_at);
    Ok(Json(ApiResponse::success(serde_json::json!({
        "logged_out": true
    }))))
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<impl IntoResponse, CampusError> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| CampusError::not_found("user", auth.user_id))?;
    Ok(Json(ApiResponse::success(user)))
}

#[derive(Deserialize)]
pub struct JoinRequest {
    pub access_code: String,
}

/// Self-service organization join via access code.
pub async fn join_organization(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<JoinRequest>,
) -> Result<impl IntoResponse, CampusError> {
    let org = state
        .db
        .get_organization_by_access_code(req.access_code.trim())
        .await?
        .ok_or_else(|| {
            CampusError::new(ErrorCode::InvalidAccessCode, "Unknown organization access code")
        })?;

    let user = state
        .db
        .update_user_organization(auth.user_id, Some(org.id))
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Organization Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub slug: String,
    pub access_code: String,
}

pub async fn create_organization(
    State(state): State<AppState>,
    Json(req): Json<CreateOrganizationRequest>,
) -> Result<impl IntoResponse, CampusError> {
    if req.name.trim().is_empty() {
        return Err(CampusError::validation("Organization name cannot be empty"));
    }
    if !slug_regex().is_match(&req.slug) {
        return Err(CampusError::validation(
            "Slug must be lowercase alphanumeric with dashes (2-63 chars)",
        ));
    }
    if req.slug == PUBLIC_MARKETPLACE_SLUG {
        return Err(CampusError::validation(
            "This slug is reserved for the public marketplace",
        ));
    }
    if req.access_code.trim().len() < 4 {
        return Err(CampusError::validation(
            "Access code must be at least 4 characters",
        ));
    }

    let org = Organization::new(req.name.trim(), req.slug, req.access_code.trim());
    state.db.insert_organization(&org).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ApiResponse::success(org)),
    ))
}

pub async fn list_organizations(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, CampusError> {
    let page = state.db.list_organizations(params).await?;
    Ok(Json(ApiResponse::success(page)))
}

pub async fn get_organization(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(org_id): Path<Uuid>,
) -> Result<impl IntoResponse, CampusError> {
    let actor = load_actor(&state, &auth).await?;
    let org = state
        .db
        .get_organization(org_id)
        .await?
        .ok_or_else(|| CampusError::not_found("organization", org_id))?;

    // Members may view their own tenant; everyone else goes through the
    // evaluator (org admins of the same tenant, super admins).
    if actor.tenant.organization_id() != Some(org_id) {
        let marketplace = state.db.marketplace_id().await?;
        let ctx = ResourceContext::organization(&org, marketplace);
        can(&actor, Action::View, ResourceKind::Organization, &ctx).require()?;
    }

    Ok(Json(ApiResponse::success(org)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// User Administration Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: GlobalRole,
}

pub async fn update_user_role(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, CampusError> {
    let actor = load_actor(&state, &auth).await?;
    let target = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| CampusError::not_found("user", user_id))?;

    let marketplace = state.db.marketplace_id().await?;
    let ctx = ResourceContext::user(&target, marketplace);
    can(&actor, Action::Edit, ResourceKind::User, &ctx).require()?;

    // Granting the god-mode role is reserved for holders of it.
    if req.role == GlobalRole::SuperAdmin && actor.global_role != GlobalRole::SuperAdmin {
        return Err(CampusError::new(
            ErrorCode::InsufficientRole,
            "Only a super admin may grant super_admin",
        ));
    }

    let user = state.db.update_user_role(user_id, req.role).await?;
    Ok(Json(ApiResponse::success(user)))
}

#[derive(Deserialize)]
pub struct UpdateUserOrganizationRequest {
    /// `null` detaches the user (back to independent).
    pub organization_id: Option<Uuid>,
}

pub async fn update_user_organization(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserOrganizationRequest>,
) -> Result<impl IntoResponse, CampusError> {
    if let Some(org_id) = req.organization_id {
        state
            .db
            .get_organization(org_id)
            .await?
            .ok_or_else(|| CampusError::not_found("organization", org_id))?;
    }

    let user = state
        .db
        .update_user_organization(user_id, req.organization_id)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Course Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: Option<String>,
    /// Marketplace listing request; honored only for independent owners.
    pub is_public: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub published: Option<bool>,
    pub is_public: Option<bool>,
}

/// Course listing, shaped by the visibility resolver.
pub async fn list_courses(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, CampusError> {
    let actor = load_actor(&state, &auth).await?;
    let organization = state.db.actor_organization(&actor).await?;

    // Fail-closed: a dangling tenant reference is a 400, never a wider list.
    let scope = resolve_course_scope(&actor, organization.as_ref())?;

    let page = state.db.list_courses(scope, params).await?;
    Ok(Json(ApiResponse::success(page)))
}

pub async fn create_course(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, CampusError> {
    if req.title.trim().is_empty() {
        return Err(CampusError::validation("Course title cannot be empty"));
    }

    let owner = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| CampusError::not_found("user", auth.user_id))?;

    // Brand-new resource creation is the one place the global role decides.
    if !owner.role.can_author_courses() {
        return Err(CampusError::new(
            ErrorCode::InsufficientRole,
            "Your role cannot create courses",
        ));
    }

    let course = state
        .db
        .insert_course(
            &owner,
            req.title.trim().to_string(),
            req.description.unwrap_or_default(),
            req.is_public.unwrap_or(false),
        )
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ApiResponse::success(course)),
    ))
}

pub async fn get_course(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, CampusError> {
    let actor = load_actor(&state, &auth).await?;
    let course = fetch_course(&state, course_id).await?;

    let ctx = state.db.course_context(&actor, &course).await?;
    can(&actor, Action::View, ResourceKind::Course, &ctx).require()?;

    Ok(Json(ApiResponse::success(course)))
}

pub async fn update_course(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<impl IntoResponse, CampusError> {
    if let Some(title) = &req.title {
        if title.trim().is_empty() {
            return Err(CampusError::validation("Course title cannot be empty"));
        }
    }

    let actor = load_actor(&state, &auth).await?;
    let course = state
        .db
        .update_course(
            &actor,
            course_id,
            CourseUpdate {
                title: req.title,
                description: req.description,
                published: req.published,
                is_public: req.is_public,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(course)))
}

pub async fn delete_course(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, CampusError> {
    let actor = load_actor(&state, &auth).await?;
    state.db.delete_course(&actor, course_id).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "id": course_id,
        "deleted": true
    }))))
}

pub async fn publish_course(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, CampusError> {
    let actor = load_actor(&state, &auth).await?;
    let course = state
        .db
        .update_course(
            &actor,
            course_id,
            CourseUpdate {
                published: Some(true),
                ..CourseUpdate::default()
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(course)))
}

async fn fetch_course(state: &AppState, course_id: Uuid) -> Result<Course, CampusError> {
    state
        .db
        .get_course(course_id)
        .await?
        .ok_or_else(|| CampusError::not_found("course", course_id))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Course Staff Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub struct AddStaffRequest {
    pub user_id: Uuid,
    pub role: CourseRole,
}

/// Staff roster; staff-facing (grade-level access).
pub async fn list_staff(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, CampusError> {
    let actor = load_actor(&state, &auth).await?;
    let course = fetch_course(&state, course_id).await?;

    let ctx = state.db.course_context(&actor, &course).await?;
    can(&actor, Action::Grade, ResourceKind::Course, &ctx).require()?;

    let staff = state.db.list_staff(course_id).await?;
    Ok(Json(ApiResponse::success(staff)))
}

pub async fn add_staff(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
    Json(req): Json<AddStaffRequest>,
) -> Result<impl IntoResponse, CampusError> {
    let actor = load_actor(&state, &auth).await?;

    // The assignee must exist before the transaction bothers the course row.
    state
        .db
        .get_user(req.user_id)
        .await?
        .ok_or_else(|| CampusError::not_found("user", req.user_id))?;

    let staff = state
        .db
        .add_staff(&actor, course_id, req.user_id, req.role)
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ApiResponse::success(staff)),
    ))
}

pub async fn remove_staff(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((course_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, CampusError> {
    let actor = load_actor(&state, &auth).await?;
    state.db.remove_staff(&actor, course_id, user_id).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "course_id": course_id,
        "user_id": user_id,
        "removed": true
    }))))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Content Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub struct CreateModuleRequest {
    pub title: String,
    pub position: Option<i32>,
}

#[derive(Deserialize)]
pub struct CreateLessonRequest {
    pub title: String,
    pub body: Option<String>,
    pub position: Option<i32>,
}

#[derive(Deserialize)]
pub struct CreateQuizRequest {
    pub questions: serde_json::Value,
    pub pass_score: Option<i32>,
}

pub async fn create_module(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
    Json(req): Json<CreateModuleRequest>,
) -> Result<impl IntoResponse, CampusError> {
    if req.title.trim().is_empty() {
        return Err(CampusError::validation("Module title cannot be empty"));
    }

    let actor = load_actor(&state, &auth).await?;
    let course = fetch_course(&state, course_id).await?;

    let ctx = state.db.course_context(&actor, &course).await?;
    can(&actor, Action::Edit, ResourceKind::Course, &ctx).require()?;

    let module = CourseModule::new(course_id, req.title.trim(), req.position.unwrap_or(0));
    state.db.insert_module(&module).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ApiResponse::success(module)),
    ))
}

pub async fn list_modules(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, CampusError> {
    let actor = load_actor(&state, &auth).await?;
    let course = fetch_course(&state, course_id).await?;

    let ctx = state.db.course_context(&actor, &course).await?;
    can(&actor, Action::View, ResourceKind::Course, &ctx).require()?;

    let modules = state.db.list_modules(course_id).await?;
    Ok(Json(ApiResponse::success(modules)))
}

pub async fn create_lesson(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(module_id): Path<Uuid>,
    Json(req): Json<CreateLessonRequest>,
) -> Result<impl IntoResponse, CampusError> {
    if req.title.trim().is_empty() {
        return Err(CampusError::validation("Lesson title cannot be empty"));
    }

    let actor = load_actor(&state, &auth).await?;
    let module = state
        .db
        .get_module(module_id)
        .await?
        .ok_or_else(|| CampusError::not_found("module", module_id))?;
    let course = fetch_course(&state, module.course_id).await?;

    let ctx = state.db.course_context(&actor, &course).await?;
    can(&actor, Action::Edit, ResourceKind::Course, &ctx).require()?;

    let lesson = Lesson::new(
        module_id,
        req.title.trim(),
        req.body.unwrap_or_default(),
        req.position.unwrap_or(0),
    );
    state.db.insert_lesson(&lesson).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ApiResponse::success(lesson)),
    ))
}

pub async fn list_lessons(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(module_id): Path<Uuid>,
) -> Result<impl IntoResponse, CampusError> {
    let actor = load_actor(&state, &auth).await?;
    let module = state
        .db
        .get_module(module_id)
        .await?
        .ok_or_else(|| CampusError::not_found("module", module_id))?;
    let course = fetch_course(&state, module.course_id).await?;

    let ctx = state.db.course_context(&actor, &course).await?;
    can(&actor, Action::View, ResourceKind::Course, &ctx).require()?;

    let lessons = state.db.list_lessons(module_id).await?;
    Ok(Json(ApiResponse::success(lessons)))
}

pub async fn create_quiz(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(lesson_id): Path<Uuid>,
    Json(req): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, CampusError> {
    let pass_score = req.pass_score.unwrap_or(70);
    if !(0..=100).contains(&pass_score) {
        return Err(CampusError::validation("pass_score must be between 0 and 100"));
    }

    let actor = load_actor(&state, &auth).await?;
    let course = state
        .db
        .course_of_lesson(lesson_id)
        .await?
        .ok_or_else(|| CampusError::not_found("lesson", lesson_id))?;

    let ctx = state.db.course_context(&actor, &course).await?;
    can(&actor, Action::Edit, ResourceKind::Course, &ctx).require()?;

    let quiz = Quiz::new(lesson_id, req.questions, pass_score);
    state.db.insert_quiz(&quiz).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ApiResponse::success(quiz)),
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Enrollment & Certification Handlers
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn enroll(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, CampusError> {
    let actor = load_actor(&state, &auth).await?;
    let enrollment = state.db.enroll(&actor, course_id).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ApiResponse::success(enrollment)),
    ))
}

pub async fn complete_lesson(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(lesson_id): Path<Uuid>,
) -> Result<impl IntoResponse, CampusError> {
    let enrollment = state.db.complete_lesson(auth.user_id, lesson_id).await?;
    Ok(Json(ApiResponse::success(enrollment)))
}

pub async fn issue_certificate(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, CampusError> {
    let certificate = state.db.issue_certificate(auth.user_id, course_id).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ApiResponse::success(certificate)),
    ))
}

pub async fn my_certificates(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<impl IntoResponse, CampusError> {
    let certificates = state.db.list_certificates(auth.user_id).await?;
    Ok(Json(ApiResponse::success(certificates)))
}

/// Public certificate verification: no authentication, serial lookup only.
pub async fn verify_certificate(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<impl IntoResponse, CampusError> {
    let certificate = state
        .db
        .get_certificate_by_serial(&serial)
        .await?
        .ok_or_else(|| CampusError::not_found("certificate", serial))?;

    Ok(Json(ApiResponse::success(certificate)))
}
