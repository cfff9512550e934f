//! Course and per-course staff assignment models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A per-course staff role, distinct from the holder's global role.
///
/// The course owner (`course.instructor_id`) is never stored in
/// `course_staff`; their `instructor` role is implicit and computed (see
/// [`crate::authz::EffectiveRole`]). A migration-level constraint forbids
/// explicit `instructor` rows so the owner stays singular.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "course_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CourseRole {
    Instructor,
    CoInstructor,
    Ta,
}

impl CourseRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Instructor => "instructor",
            Self::CoInstructor => "co_instructor",
            Self::Ta => "ta",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "instructor" => Some(Self::Instructor),
            "co_instructor" => Some(Self::CoInstructor),
            "ta" => Some(Self::Ta),
            _ => None,
        }
    }
}

impl fmt::Display for CourseRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A course. `organization_id` is always set: independent instructors'
/// courses are attached to the reserved marketplace tenant.
///
/// Invariant enforced at write time (never trusted from input):
/// `is_public = true` only while the owning instructor is independent.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Owner (instructor of record). Always has full course authority.
    pub instructor_id: Uuid,
    pub title: String,
    pub description: String,
    /// Visible to its audience at all (draft until then).
    pub published: bool,
    /// Listed in the public marketplace catalog.
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn new(
        organization_id: Uuid,
        instructor_id: Uuid,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            instructor_id,
            title: title.into(),
            description: description.into(),
            published: false,
            is_public: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Staff assignment on one specific course.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseStaff {
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub role: CourseRole,
    /// Who granted the assignment (the course owner, via manage_team).
    pub added_by: Option<Uuid>,
    pub added_at: DateTime<Utc>,
}

impl CourseStaff {
    pub fn new(course_id: Uuid, user_id: Uuid, role: CourseRole) -> Self {
        Self {
            course_id,
            user_id,
            role,
            added_by: None,
            added_at: Utc::now(),
        }
    }

    pub fn granted_by(mut self, user_id: Uuid) -> Self {
        self.added_by = Some(user_id);
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
