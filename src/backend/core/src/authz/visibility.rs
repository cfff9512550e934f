//! Visibility resolver: shapes course listing queries per actor.
//!
//! Listing is a query-shaping decision distinct from per-item permission
//! checks: the resolver picks one of four filter shapes
//! ([`CourseScope`]), which the storage layer translates to SQL and which
//! [`CourseScope::permits`] mirrors as a pure predicate so the two can be
//! tested against each other.
//!
//! Branch order matters: the independent/marketplace check runs first,
//! because an independent user's raw organization id may be the non-null
//! marketplace placeholder, which would otherwise match tenant-scoped
//! branches.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::identity::{Actor, TenantRef};
use crate::models::{Course, GlobalRole, Organization};

/// Resolver failures. Fail-closed: no scope is produced on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisibilityError {
    /// The actor references a tenant whose organization row is missing.
    /// A data-integrity problem, surfaced as HTTP 400 at the boundary.
    #[error("organization not found for actor tenant {0}")]
    OrganizationNotFound(Uuid),
}

/// The filter shapes a course listing can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope")]
pub enum CourseScope {
    /// Public marketplace catalog: `is_public AND published`, any tenant.
    Marketplace,
    /// Whole tenant catalog, drafts included (org admins).
    TenantCatalog { organization_id: Uuid },
    /// Courses the actor owns or staffs within their tenant.
    StaffAssignments { organization_id: Uuid, user_id: Uuid },
    /// Published courses of the actor's tenant (plain students).
    TenantPublished { organization_id: Uuid },
}

impl CourseScope {
    /// Pure form of the filter: would this scope include `course`?
    ///
    /// `is_staff_on_course` is the caller-supplied fact "the scope's user
    /// has a staff row on this course"; it is only consulted by
    /// [`CourseScope::StaffAssignments`].
    pub fn permits(&self, course: &Course, is_staff_on_course: bool) -> bool {
        match self {
            Self::Marketplace => course.is_public && course.published,
            Self::TenantCatalog { organization_id } => course.organization_id == *organization_id,
            Self::StaffAssignments {
                organization_id,
                user_id,
            } => {
                course.organization_id == *organization_id
                    && (course.instructor_id == *user_id || is_staff_on_course)
            }
            Self::TenantPublished { organization_id } => {
                course.organization_id == *organization_id && course.published
            }
        }
    }
}

/// Resolve the listing scope for `actor`.
///
/// `organization` is the actor's tenant row as loaded by the caller
/// (`None` when the row is missing). Independent actors never need it.
pub fn resolve_course_scope(
    actor: &Actor,
    organization: Option<&Organization>,
) -> Result<CourseScope, VisibilityError> {
    // Independent actors browse the marketplace, whatever their global role.
    let org_id = match actor.tenant {
        TenantRef::Independent => return Ok(CourseScope::Marketplace),
        TenantRef::Tenant(id) => id,
    };

    // Fail closed on a dangling tenant reference.
    match organization {
        Some(org) if org.id == org_id => {}
        _ => return Err(VisibilityError::OrganizationNotFound(org_id)),
    }

    Ok(match actor.global_role {
        GlobalRole::SuperAdmin | GlobalRole::OrgAdmin => CourseScope::TenantCatalog {
            organization_id: org_id,
        },
        role if role.teaches() => CourseScope::StaffAssignments {
            organization_id: org_id,
            user_id: actor.id,
        },
        _ => CourseScope::TenantPublished {
            organization_id: org_id,
        },
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn org(id: Uuid) -> Organization {
        let mut o = Organization::new("Org", "org", "CODE");
        o.id = id;
        o
    }

    fn course_in(org_id: Uuid, instructor: Uuid) -> Course {
        Course::new(org_id, instructor, "Course", "")
    }

    #[test]
    fn test_independent_actor_gets_marketplace() {
        let actor = Actor::new(Uuid::new_v4(), GlobalRole::Instructor, TenantRef::Independent);
        assert_eq!(
            resolve_course_scope(&actor, None),
            Ok(CourseScope::Marketplace)
        );
    }

    #[test]
    fn test_org_admin_gets_full_tenant_catalog() {
        let org_id = Uuid::new_v4();
        let actor = Actor::new(Uuid::new_v4(), GlobalRole::OrgAdmin, TenantRef::Tenant(org_id));
        assert_eq!(
            resolve_course_scope(&actor, Some(&org(org_id))),
            Ok(CourseScope::TenantCatalog {
                organization_id: org_id
            })
        );
    }

    #[test]
    fn test_tenant_instructor_sees_only_assignments() {
        let org_id = Uuid::new_v4();
        let actor = Actor::new(Uuid::new_v4(), GlobalRole::Instructor, TenantRef::Tenant(org_id));
        assert_eq!(
            resolve_course_scope(&actor, Some(&org(org_id))),
            Ok(CourseScope::StaffAssignments {
                organization_id: org_id,
                user_id: actor.id,
            })
        );
    }

    #[test]
    fn test_tenant_student_sees_published_only() {
        let org_id = Uuid::new_v4();
        let actor = Actor::new(Uuid::new_v4(), GlobalRole::Student, TenantRef::Tenant(org_id));
        assert_eq!(
            resolve_course_scope(&actor, Some(&org(org_id))),
            Ok(CourseScope::TenantPublished {
                organization_id: org_id
            })
        );
    }

    #[test]
    fn test_missing_organization_fails_closed() {
        let org_id = Uuid::new_v4();
        let actor = Actor::new(Uuid::new_v4(), GlobalRole::Student, TenantRef::Tenant(org_id));

        assert_eq!(
            resolve_course_scope(&actor, None),
            Err(VisibilityError::OrganizationNotFound(org_id))
        );
        // A row for a different organization is just as dangling.
        assert_eq!(
            resolve_course_scope(&actor, Some(&org(Uuid::new_v4()))),
            Err(VisibilityError::OrganizationNotFound(org_id))
        );
    }

    #[test]
    fn test_marketplace_scope_requires_public_and_published() {
        let scope = CourseScope::Marketplace;
        let mut course = course_in(Uuid::new_v4(), Uuid::new_v4());

        assert!(!scope.permits(&course, false));
        course.published = true;
        assert!(!scope.permits(&course, false));
        course.is_public = true;
        assert!(scope.permits(&course, false));
    }

    #[test]
    fn test_marketplace_scope_ignores_owning_tenant() {
        let scope = CourseScope::Marketplace;
        let mut course = course_in(Uuid::new_v4(), Uuid::new_v4());
        course.published = true;
        course.is_public = true;
        assert!(scope.permits(&course, false));
    }

    #[test]
    fn test_tenant_catalog_includes_drafts() {
        let org_id = Uuid::new_v4();
        let scope = CourseScope::TenantCatalog {
            organization_id: org_id,
        };
        let draft = course_in(org_id, Uuid::new_v4());
        assert!(scope.permits(&draft, false));
        assert!(!scope.permits(&course_in(Uuid::new_v4(), Uuid::new_v4()), false));
    }

    #[test]
    fn test_staff_assignments_owned_or_staffed_only() {
        let org_id = Uuid::new_v4();
        let me = Uuid::new_v4();
        let scope = CourseScope::StaffAssignments {
            organization_id: org_id,
            user_id: me,
        };

        // Owned.
        assert!(scope.permits(&course_in(org_id, me), false));
        // Staffed.
        assert!(scope.permits(&course_in(org_id, Uuid::new_v4()), true));
        // Someone else's course in the same tenant.
        assert!(!scope.permits(&course_in(org_id, Uuid::new_v4()), false));
        // Staffed but cross-tenant: tenant filter wins.
        assert!(!scope.permits(&course_in(Uuid::new_v4(), Uuid::new_v4()), true));
    }

    #[test]
    fn test_tenant_published_excludes_drafts_and_other_tenants() {
        let org_id = Uuid::new_v4();
        let scope = CourseScope::TenantPublished {
            organization_id: org_id,
        };

        let mut published = course_in(org_id, Uuid::new_v4());
        published.published = true;
        assert!(scope.permits(&published, false));

        assert!(!scope.permits(&course_in(org_id, Uuid::new_v4()), false));

        let mut other_tenant = course_in(Uuid::new_v4(), Uuid::new_v4());
        other_tenant.published = true;
        assert!(!scope.permits(&other_tenant, false));
    }
}
