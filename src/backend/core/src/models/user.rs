//! User identity: the global role and (optional) organization membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A user's platform-wide role.
///
/// This is distinct from any per-course staff role the same user may hold
/// (see [`crate::models::CourseRole`]): a global `instructor` has no special
/// authority over a course they are not assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "global_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GlobalRole {
    Student,
    Instructor,
    Ta,
    CoInstructor,
    OrgAdmin,
    SuperAdmin,
}

impl GlobalRole {
    /// Stable string form used in JWT claims and API payloads.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Instructor => "instructor",
            Self::Ta => "ta",
            Self::CoInstructor => "co_instructor",
            Self::OrgAdmin => "org_admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// Parse from the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "instructor" => Some(Self::Instructor),
            "ta" => Some(Self::Ta),
            "co_instructor" => Some(Self::CoInstructor),
            "org_admin" => Some(Self::OrgAdmin),
            "super_admin" => Some(Self::SuperAdmin),
            _ => None,
        }
    }

    /// Whether this role can be assigned to course staff anywhere
    /// (instructor, TA, or co-instructor).
    pub const fn teaches(&self) -> bool {
        matches!(self, Self::Instructor | Self::Ta | Self::CoInstructor)
    }

    /// Whether this role may create new courses.
    pub const fn can_author_courses(&self) -> bool {
        matches!(
            self,
            Self::Instructor | Self::CoInstructor | Self::OrgAdmin | Self::SuperAdmin
        )
    }
}

impl fmt::Display for GlobalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered user.
///
/// `organization_id = NULL` means the user is independent (B2C, public
/// marketplace). The reserved marketplace organization id is treated as
/// equivalent to NULL everywhere; normalization happens in
/// [`crate::authz::TenantRef`], never ad hoc.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: GlobalRole,
    pub organization_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user record. Registration always starts as `Student`;
    /// other roles are granted through admin tooling.
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            password_hash: password_hash.into(),
            role: GlobalRole::Student,
            organization_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the role (admin bulk-import path).
    pub fn with_role(mut self, role: GlobalRole) -> Self {
        self.role = role;
        self
    }

    /// Attach the user to an organization.
    pub fn with_organization(mut self, organization_id: Uuid) -> Self {
        self.organization_id = Some(organization_id);
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
