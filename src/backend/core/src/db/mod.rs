//! Database layer for Campus.
//!
//! Uses PostgreSQL for persistent storage with sqlx.
//!
//! Write paths that are gated by an authorization decision (course update,
//! delete, staff changes, enrollment) fetch the resource context and perform
//! the write inside one transaction, so the decision and the write see the
//! same snapshot. The permission evaluator itself stays pure; this module
//! only composes the fetch, the [`can`] decision, and the write.

pub mod health;

use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::authz::{
    can, clamp_is_public, Action, Actor, CourseScope, ResourceContext, ResourceKind, TenantRef,
};
use crate::error::{CampusError, ErrorCode, Result};
use crate::models::{
    Certificate, Course, CourseModule, CourseRole, CourseStaff, Enrollment, GlobalRole, Lesson,
    Organization, Quiz, User, PUBLIC_MARKETPLACE_SLUG,
};
use crate::pagination::{Paginated, PaginationParams};

/// Database connection and operations.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    /// Cached id of the reserved marketplace tenant.
    marketplace_id: OnceCell<Uuid>,
}

/// Mutable course fields accepted by the update path. `None` leaves the
/// stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub published: Option<bool>,
    pub is_public: Option<bool>,
}

impl Database {
    /// Create a new database connection pool.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(5)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self {
            pool,
            marketplace_id: OnceCell::new(),
        })
    }

    /// Wrap an existing pool (tests, health monitor).
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            marketplace_id: OnceCell::new(),
        }
    }

    /// Run migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CampusError::from(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Marketplace tenant
    // ═══════════════════════════════════════════════════════════════════════════

    /// Create the reserved marketplace tenant if it does not exist yet.
    /// Idempotent; called at startup. The unique slug index guarantees the
    /// "exactly one marketplace" invariant under concurrent starts.
    pub async fn ensure_marketplace(&self) -> Result<Uuid> {
        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM organizations WHERE slug = $1")
                .bind(PUBLIC_MARKETPLACE_SLUG)
                .fetch_optional(&self.pool)
                .await?;

        if let Some((id,)) = existing {
            return Ok(id);
        }

        let org = Organization::new("Public Marketplace", PUBLIC_MARKETPLACE_SLUG, "PUBLIC");
        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, slug, access_code, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(org.id)
        .bind(&org.name)
        .bind(&org.slug)
        .bind(&org.access_code)
        .bind(org.created_at)
        .bind(org.updated_at)
        .execute(&self.pool)
        .await?;

        // Re-read: a concurrent start may have won the insert.
        let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM organizations WHERE slug = $1")
            .bind(PUBLIC_MARKETPLACE_SLUG)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    /// Id of the reserved marketplace tenant, cached after first lookup.
    pub async fn marketplace_id(&self) -> Result<Uuid> {
        self.marketplace_id
            .get_or_try_init(|| async {
                let row: (Uuid,) =
                    sqlx::query_as("SELECT id FROM organizations WHERE slug = $1")
                        .bind(PUBLIC_MARKETPLACE_SLUG)
                        .fetch_one(&self.pool)
                        .await?;
                Ok::<_, CampusError>(row.0)
            })
            .await
            .map(|id| *id)
    }

    /// Build the normalized actor for an authenticated user id.
    pub async fn load_actor(&self, user_id: Uuid) -> Result<Actor> {
        let user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| CampusError::not_found("user", user_id))?;
        let marketplace = self.marketplace_id().await?;
        Ok(Actor::from_user(&user, marketplace))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // User Operations
    // ═══════════════════════════════════════════════════════════════════════════

    /// Insert a new user.
    pub async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, organization_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.organization_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get user by ID.
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Get user by email (login path).
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Update a user's global role (admin tooling).
    pub async fn update_user_role(&self, user_id: Uuid, role: GlobalRole) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CampusError::not_found("user", user_id))?;
        Ok(user)
    }

    /// Reassign a user to an organization (or detach with `None`).
    pub async fn update_user_organization(
        &self,
        user_id: Uuid,
        organization_id: Option<Uuid>,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET organization_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CampusError::not_found("user", user_id))?;
        Ok(user)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Organization Operations
    // ═══════════════════════════════════════════════════════════════════════════

    /// Insert a new organization.
    pub async fn insert_organization(&self, org: &Organization) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, slug, access_code, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(org.id)
        .bind(&org.name)
        .bind(&org.slug)
        .bind(&org.access_code)
        .bind(org.created_at)
        .bind(org.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.constraint() == Some("organizations_slug_key") => {
                CampusError::new(
                    ErrorCode::DuplicateSlug,
                    format!("An organization with slug '{}' already exists", org.slug),
                )
            }
            _ => CampusError::from(e),
        })?;

        Ok(())
    }

    /// Get organization by ID.
    pub async fn get_organization(&self, org_id: Uuid) -> Result<Option<Organization>> {
        let org = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(org_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(org)
    }

    /// Get organization by access code (self-service join).
    pub async fn get_organization_by_access_code(&self, code: &str) -> Result<Option<Organization>> {
        let org =
            sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE access_code = $1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;
        Ok(org)
    }

    /// List all organizations (super admin surface).
    pub async fn list_organizations(&self, params: PaginationParams) -> Result<Paginated<Organization>> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM organizations")
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, Organization>(
            "SELECT * FROM organizations ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Paginated::new(items, params, total as u64))
    }

    /// The organization row backing the actor's tenant, if any. Used by the
    /// visibility resolver's fail-closed check.
    pub async fn actor_organization(&self, actor: &Actor) -> Result<Option<Organization>> {
        match actor.tenant {
            TenantRef::Independent => Ok(None),
            TenantRef::Tenant(org_id) => self.get_organization(org_id).await,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Course Operations
    // ═══════════════════════════════════════════════════════════════════════════

    /// Create a course owned by `owner`.
    ///
    /// The course is attached to the owner's organization, or to the
    /// marketplace tenant when the owner is independent (the column is NOT
    /// NULL). The marketplace-publishing gate is applied here, never trusted
    /// from input: `is_public` survives only for independent owners.
    pub async fn insert_course(
        &self,
        owner: &User,
        title: String,
        description: String,
        is_public: bool,
    ) -> Result<Course> {
        let marketplace = self.marketplace_id().await?;
        let tenant = TenantRef::normalize(owner.organization_id, marketplace);

        let mut course = Course::new(
            tenant.organization_id().unwrap_or(marketplace),
            owner.id,
            title,
            description,
        );
        course.is_public = clamp_is_public(is_public, tenant);

        sqlx::query(
            r#"
            INSERT INTO courses (id, organization_id, instructor_id, title, description,
                                 published, is_public, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(course.id)
        .bind(course.organization_id)
        .bind(course.instructor_id)
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.published)
        .bind(course.is_public)
        .bind(course.created_at)
        .bind(course.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(course)
    }

    /// Get course by ID.
    pub async fn get_course(&self, course_id: Uuid) -> Result<Option<Course>> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    /// The actor's view-relevant facts for one course: staff role and
    /// enrollment, fetched together for the permission evaluator.
    pub async fn course_context(&self, actor: &Actor, course: &Course) -> Result<ResourceContext> {
        let staff_role = self.get_staff_role(course.id, actor.id).await?;
        let enrolled = self.get_enrollment(course.id, actor.id).await?.is_some();
        let marketplace = self.marketplace_id().await?;
        Ok(ResourceContext::course(course, marketplace, staff_role, enrolled))
    }

    /// Update a course. The edit decision and the write share one
    /// transaction; the publish gate re-derives the owner's independence
    /// inside it, so an owner who joined an organization since creation can
    /// no longer hold `is_public`.
    pub async fn update_course(
        &self,
        actor: &Actor,
        course_id: Uuid,
        update: CourseUpdate,
    ) -> Result<Course> {
        let marketplace = self.marketplace_id().await?;
        let mut tx = self.pool.begin().await?;

        let course = Self::lock_course(&mut tx, course_id).await?;
        let staff_role = Self::staff_role_tx(&mut tx, course_id, actor.id).await?;

        let ctx = ResourceContext::course(&course, marketplace, staff_role, false);
        can(actor, Action::Edit, ResourceKind::Course, &ctx).require()?;

        // Publish gate: only an independent owner may hold is_public.
        let owner = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(course.instructor_id)
            .fetch_one(&mut *tx)
            .await?;
        let owner_tenant = TenantRef::normalize(owner.organization_id, marketplace);

        let is_public = clamp_is_public(update.is_public.unwrap_or(course.is_public), owner_tenant);

        let updated = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET title = $2, description = $3, published = $4, is_public = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(course_id)
        .bind(update.title.unwrap_or(course.title))
        .bind(update.description.unwrap_or(course.description))
        .bind(update.published.unwrap_or(course.published))
        .bind(is_public)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a course. Owner-only; decision and delete share a transaction
    /// so an ownership change between check and act is impossible.
    pub async fn delete_course(&self, actor: &Actor, course_id: Uuid) -> Result<()> {
        let marketplace = self.marketplace_id().await?;
        let mut tx = self.pool.begin().await?;

        let course = Self::lock_course(&mut tx, course_id).await?;
        let staff_role = Self::staff_role_tx(&mut tx, course_id, actor.id).await?;

        let ctx = ResourceContext::course(&course, marketplace, staff_role, false);
        can(actor, Action::Delete, ResourceKind::Course, &ctx).require()?;

        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// List courses visible under `scope`, newest first.
    ///
    /// Each [`CourseScope`] variant translates to the SQL equivalent of
    /// [`CourseScope::permits`]; the two are kept in lockstep by tests.
    pub async fn list_courses(
        &self,
        scope: CourseScope,
        params: PaginationParams,
    ) -> Result<Paginated<Course>> {
        let (items, total) = match scope {
            CourseScope::Marketplace => {
                let total: (i64,) = sqlx::query_as(
                    "SELECT COUNT(*) FROM courses WHERE is_public = TRUE AND published = TRUE",
                )
                .fetch_one(&self.pool)
                .await?;
                let items = sqlx::query_as::<_, Course>(
                    r#"
                    SELECT * FROM courses
                    WHERE is_public = TRUE AND published = TRUE
                    ORDER BY created_at DESC LIMIT $1 OFFSET $2
                    "#,
                )
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(&self.pool)
                .await?;
                (items, total.0)
            }
            CourseScope::TenantCatalog { organization_id } => {
                let total: (i64,) =
                    sqlx::query_as("SELECT COUNT(*) FROM courses WHERE organization_id = $1")
                        .bind(organization_id)
                        .fetch_one(&self.pool)
                        .await?;
                let items = sqlx::query_as::<_, Course>(
                    r#"
                    SELECT * FROM courses
                    WHERE organization_id = $1
                    ORDER BY created_at DESC LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(organization_id)
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(&self.pool)
                .await?;
                (items, total.0)
            }
            CourseScope::StaffAssignments {
                organization_id,
                user_id,
            } => {
                let total: (i64,) = sqlx::query_as(
                    r#"
                    SELECT COUNT(*) FROM courses
                    WHERE organization_id = $1
                      AND (instructor_id = $2
                           OR id IN (SELECT course_id FROM course_staff WHERE user_id = $2))
                    "#,
                )
                .bind(organization_id)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
                let items = sqlx::query_as::<_, Course>(
                    r#"
                    SELECT * FROM courses
                    WHERE organization_id = $1
                      AND (instructor_id = $2
                           OR id IN (SELECT course_id FROM course_staff WHERE user_id = $2))
                    ORDER BY created_at DESC LIMIT $3 OFFSET $4
                    "#,
                )
                .bind(organization_id)
                .bind(user_id)
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(&self.pool)
                .await?;
                (items, total.0)
            }
            CourseScope::TenantPublished { organization_id } => {
                let total: (i64,) = sqlx::query_as(
                    "SELECT COUNT(*) FROM courses WHERE organization_id = $1 AND published = TRUE",
                )
                .bind(organization_id)
                .fetch_one(&self.pool)
                .await?;
                let items = sqlx::query_as::<_, Course>(
                    r#"
                    SELECT * FROM courses
                    WHERE organization_id = $1 AND published = TRUE
                    ORDER BY created_at DESC LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(organization_id)
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(&self.pool)
                .await?;
                (items, total.0)
            }
        };

        Ok(Paginated::new(items, params, total as u64))
    }

    async fn lock_course(tx: &mut Transaction<'_, Postgres>, course_id: Uuid) -> Result<Course> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1 FOR UPDATE")
            .bind(course_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| CampusError::not_found("course", course_id))
    }

    async fn staff_role_tx(
        tx: &mut Transaction<'_, Postgres>,
        course_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CourseRole>> {
        let row: Option<(CourseRole,)> = sqlx::query_as(
            "SELECT role FROM course_staff WHERE course_id = $1 AND user_id = $2",
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row.map(|(role,)| role))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Course Staff Operations
    // ═══════════════════════════════════════════════════════════════════════════

    /// The actor's staff role on a course, if assigned.
    pub async fn get_staff_role(&self, course_id: Uuid, user_id: Uuid) -> Result<Option<CourseRole>> {
        let row: Option<(CourseRole,)> = sqlx::query_as(
            "SELECT role FROM course_staff WHERE course_id = $1 AND user_id = $2",
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(role,)| role))
    }

    /// List staff assignments of a course.
    pub async fn list_staff(&self, course_id: Uuid) -> Result<Vec<CourseStaff>> {
        let staff = sqlx::query_as::<_, CourseStaff>(
            "SELECT * FROM course_staff WHERE course_id = $1 ORDER BY added_at",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(staff)
    }

    /// Add a staff member to a course (manage_team, owner only).
    ///
    /// The owner is implicit staff and is never written here; an explicit
    /// `instructor` role is rejected so the owner stays singular (also
    /// enforced by a check constraint).
    pub async fn add_staff(
        &self,
        actor: &Actor,
        course_id: Uuid,
        user_id: Uuid,
        role: CourseRole,
    ) -> Result<CourseStaff> {
        if role == CourseRole::Instructor {
            return Err(CampusError::new(
                ErrorCode::OwnerIsImplicitStaff,
                "The course owner is the singular instructor; assign co_instructor or ta instead",
            ));
        }

        let marketplace = self.marketplace_id().await?;
        let mut tx = self.pool.begin().await?;

        let course = Self::lock_course(&mut tx, course_id).await?;
        let actor_staff = Self::staff_role_tx(&mut tx, course_id, actor.id).await?;

        let ctx = ResourceContext::course(&course, marketplace, actor_staff, false);
        can(actor, Action::ManageTeam, ResourceKind::Course, &ctx).require()?;

        if course.instructor_id == user_id {
            return Err(CampusError::new(
                ErrorCode::OwnerIsImplicitStaff,
                "The course owner already holds the instructor role implicitly",
            ));
        }

        let staff = CourseStaff::new(course_id, user_id, role).granted_by(actor.id);
        sqlx::query(
            r#"
            INSERT INTO course_staff (course_id, user_id, role, added_by, added_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(staff.course_id)
        .bind(staff.user_id)
        .bind(staff.role)
        .bind(staff.added_by)
        .bind(staff.added_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.constraint() == Some("course_staff_pkey") => {
                CampusError::new(ErrorCode::AlreadyStaff, "User is already staff on this course")
            }
            _ => CampusError::from(e),
        })?;

        tx.commit().await?;
        Ok(staff)
    }

    /// Remove a staff member from a course (manage_team, owner only).
    pub async fn remove_staff(&self, actor: &Actor, course_id: Uuid, user_id: Uuid) -> Result<()> {
        let marketplace = self.marketplace_id().await?;
        let mut tx = self.pool.begin().await?;

        let course = Self::lock_course(&mut tx, course_id).await?;
        let actor_staff = Self::staff_role_tx(&mut tx, course_id, actor.id).await?;

        let ctx = ResourceContext::course(&course, marketplace, actor_staff, false);
        can(actor, Action::ManageTeam, ResourceKind::Course, &ctx).require()?;

        let result = sqlx::query("DELETE FROM course_staff WHERE course_id = $1 AND user_id = $2")
            .bind(course_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CampusError::new(
                ErrorCode::StaffNotFound,
                "User is not staff on this course",
            ));
        }

        tx.commit().await?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Content Operations
    // ═══════════════════════════════════════════════════════════════════════════

    /// Insert a module (caller has already checked `edit`).
    pub async fn insert_module(&self, module: &CourseModule) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO course_modules (id, course_id, title, position, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(module.id)
        .bind(module.course_id)
        .bind(&module.title)
        .bind(module.position)
        .bind(module.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// List modules of a course in position order.
    pub async fn list_modules(&self, course_id: Uuid) -> Result<Vec<CourseModule>> {
        let modules = sqlx::query_as::<_, CourseModule>(
            "SELECT * FROM course_modules WHERE course_id = $1 ORDER BY position",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(modules)
    }

    /// Get a module by ID.
    pub async fn get_module(&self, module_id: Uuid) -> Result<Option<CourseModule>> {
        let module = sqlx::query_as::<_, CourseModule>("SELECT * FROM course_modules WHERE id = $1")
            .bind(module_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(module)
    }

    /// Insert a lesson (caller has already checked `edit`).
    pub async fn insert_lesson(&self, lesson: &Lesson) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO lessons (id, module_id, title, body, position, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(lesson.id)
        .bind(lesson.module_id)
        .bind(&lesson.title)
        .bind(&lesson.body)
        .bind(lesson.position)
        .bind(lesson.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// List lessons of a module in position order.
    pub async fn list_lessons(&self, module_id: Uuid) -> Result<Vec<Lesson>> {
        let lessons = sqlx::query_as::<_, Lesson>(
            "SELECT * FROM lessons WHERE module_id = $1 ORDER BY position",
        )
        .bind(module_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lessons)
    }

    /// Get a lesson by ID.
    pub async fn get_lesson(&self, lesson_id: Uuid) -> Result<Option<Lesson>> {
        let lesson = sqlx::query_as::<_, Lesson>("SELECT * FROM lessons WHERE id = $1")
            .bind(lesson_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lesson)
    }

    /// The course a lesson belongs to (via its module).
    pub async fn course_of_lesson(&self, lesson_id: Uuid) -> Result<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            SELECT c.* FROM courses c
            JOIN course_modules m ON m.course_id = c.id
            JOIN lessons l ON l.module_id = m.id
            WHERE l.id = $1
            "#,
        )
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    /// Insert a quiz (caller has already checked `edit`).
    pub async fn insert_quiz(&self, quiz: &Quiz) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO quizzes (id, lesson_id, questions, pass_score, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(quiz.id)
        .bind(quiz.lesson_id)
        .bind(&quiz.questions)
        .bind(quiz.pass_score)
        .bind(quiz.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Enrollment & Certification Operations
    // ═══════════════════════════════════════════════════════════════════════════

    /// Get an enrollment by (course, user).
    pub async fn get_enrollment(&self, course_id: Uuid, user_id: Uuid) -> Result<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "SELECT * FROM enrollments WHERE course_id = $1 AND user_id = $2",
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }

    /// Enroll the actor in a course. The course must be visible to the actor
    /// (`view` decision) and published.
    pub async fn enroll(&self, actor: &Actor, course_id: Uuid) -> Result<Enrollment> {
        let marketplace = self.marketplace_id().await?;
        let mut tx = self.pool.begin().await?;

        let course = Self::lock_course(&mut tx, course_id).await?;
        let staff_role = Self::staff_role_tx(&mut tx, course_id, actor.id).await?;

        let ctx = ResourceContext::course(&course, marketplace, staff_role, false);
        can(actor, Action::View, ResourceKind::Course, &ctx).require()?;

        if !course.published {
            return Err(CampusError::new(
                ErrorCode::CourseNotPublished,
                "Cannot enroll in an unpublished course",
            ));
        }

        let enrollment = Enrollment::new(course_id, actor.id);
        sqlx::query(
            r#"
            INSERT INTO enrollments (id, course_id, user_id, enrolled_at, completed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(enrollment.id)
        .bind(enrollment.course_id)
        .bind(enrollment.user_id)
        .bind(enrollment.enrolled_at)
        .bind(enrollment.completed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db)
                if db.constraint() == Some("enrollments_course_id_user_id_key") =>
            {
                CampusError::new(ErrorCode::AlreadyEnrolled, "Already enrolled in this course")
            }
            _ => CampusError::from(e),
        })?;

        tx.commit().await?;
        Ok(enrollment)
    }

    /// Record completion of a lesson under the actor's enrollment. When the
    /// last lesson of the course completes, the enrollment is marked
    /// completed in the same transaction.
    pub async fn complete_lesson(&self, actor_id: Uuid, lesson_id: Uuid) -> Result<Enrollment> {
        let course = self
            .course_of_lesson(lesson_id)
            .await?
            .ok_or_else(|| CampusError::not_found("lesson", lesson_id))?;

        let mut tx = self.pool.begin().await?;

        let enrollment = sqlx::query_as::<_, Enrollment>(
            "SELECT * FROM enrollments WHERE course_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(course.id)
        .bind(actor_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            CampusError::new(ErrorCode::EnrollmentNotFound, "Not enrolled in this course")
        })?;

        sqlx::query(
            r#"
            INSERT INTO lesson_progress (enrollment_id, lesson_id, completed_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (enrollment_id, lesson_id) DO NOTHING
            "#,
        )
        .bind(enrollment.id)
        .bind(lesson_id)
        .execute(&mut *tx)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM lessons l
            JOIN course_modules m ON l.module_id = m.id
            WHERE m.course_id = $1
            "#,
        )
        .bind(course.id)
        .fetch_one(&mut *tx)
        .await?;

        let (done,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM lesson_progress WHERE enrollment_id = $1")
                .bind(enrollment.id)
                .fetch_one(&mut *tx)
                .await?;

        let enrollment = if done >= total && enrollment.completed_at.is_none() {
            sqlx::query_as::<_, Enrollment>(
                "UPDATE enrollments SET completed_at = NOW() WHERE id = $1 RETURNING *",
            )
            .bind(enrollment.id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            enrollment
        };

        tx.commit().await?;
        Ok(enrollment)
    }

    /// Issue a certificate for a completed enrollment.
    pub async fn issue_certificate(&self, actor_id: Uuid, course_id: Uuid) -> Result<Certificate> {
        let enrollment = self
            .get_enrollment(course_id, actor_id)
            .await?
            .ok_or_else(|| {
                CampusError::new(ErrorCode::EnrollmentNotFound, "Not enrolled in this course")
            })?;

        if !enrollment.is_completed() {
            return Err(CampusError::new(
                ErrorCode::CourseIncomplete,
                "Complete all lessons before requesting a certificate",
            ));
        }

        let certificate = Certificate::issue(course_id, actor_id);
        sqlx::query(
            r#"
            INSERT INTO certificates (id, course_id, user_id, serial, issued_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(certificate.id)
        .bind(certificate.course_id)
        .bind(certificate.user_id)
        .bind(&certificate.serial)
        .bind(certificate.issued_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db)
                if db.constraint() == Some("certificates_course_id_user_id_key") =>
            {
                CampusError::new(
                    ErrorCode::CertificateAlreadyIssued,
                    "A certificate was already issued for this course",
                )
            }
            _ => CampusError::from(e),
        })?;

        Ok(certificate)
    }

    /// Public certificate verification by serial.
    pub async fn get_certificate_by_serial(&self, serial: &str) -> Result<Option<Certificate>> {
        let certificate =
            sqlx::query_as::<_, Certificate>("SELECT * FROM certificates WHERE serial = $1")
                .bind(serial)
                .fetch_optional(&self.pool)
                .await?;
        Ok(certificate)
    }

    /// List the actor's certificates.
    pub async fn list_certificates(&self, user_id: Uuid) -> Result<Vec<Certificate>> {
        let certificates = sqlx::query_as::<_, Certificate>(
            "SELECT * FROM certificates WHERE user_id = $1 ORDER BY issued_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(certificates)
    }
}
