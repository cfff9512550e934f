//! Permission evaluator tests.
//!
//! Tests cover:
//! - Tenant isolation across organizations
//! - Owner supremacy over staff for destructive actions
//! - Super-admin bypass of all checks
//! - The marketplace publish gate
//! - The concrete TA staffing scenario

use campus_core::authz::{
    can, clamp_is_public, Action, Actor, Decision, DenyReason, ResourceContext, ResourceKind,
    TenantRef,
};
use campus_core::models::{Course, CourseRole, GlobalRole};
use uuid::Uuid;

const ALL_ACTIONS: [Action; 5] = [
    Action::View,
    Action::Edit,
    Action::Delete,
    Action::ManageTeam,
    Action::Grade,
];

fn marketplace() -> Uuid {
    Uuid::new_v4()
}

fn course_in(org: Uuid) -> Course {
    Course::new(org, Uuid::new_v4(), "Distributed Systems", "")
}

fn ctx_for(course: &Course, marketplace: Uuid) -> ResourceContext {
    ResourceContext::course(course, marketplace, None, false)
}

// ============================================================================
// Tenant isolation
// ============================================================================

#[test]
fn test_tenant_isolation_private_course_invisible_cross_tenant() {
    let marketplace = marketplace();
    let org_a = Uuid::new_v4();
    let org_b = Uuid::new_v4();

    // Unpublished and published-but-private variants both deny.
    for (published, public) in [(false, false), (true, false), (false, true)] {
        let mut course = course_in(org_a);
        course.published = published;
        course.is_public = public;
        let ctx = ctx_for(&course, marketplace);

        for role in [
            GlobalRole::Student,
            GlobalRole::Instructor,
            GlobalRole::Ta,
            GlobalRole::CoInstructor,
        ] {
            let outsider = Actor::new(Uuid::new_v4(), role, TenantRef::Tenant(org_b));
            assert!(
                can(&outsider, Action::View, ResourceKind::Course, &ctx).is_denied(),
                "role {role:?} published={published} public={public} must be denied"
            );
        }
    }
}

#[test]
fn test_tenant_isolation_org_admin_denied_with_cross_tenant_reason() {
    let marketplace = marketplace();
    let org_a = Uuid::new_v4();
    let admin_b = Actor::new(
        Uuid::new_v4(),
        GlobalRole::OrgAdmin,
        TenantRef::Tenant(Uuid::new_v4()),
    );

    let mut course = course_in(org_a);
    course.published = true;
    let ctx = ctx_for(&course, marketplace);

    for action in ALL_ACTIONS {
        assert_eq!(
            can(&admin_b, action, ResourceKind::Course, &ctx),
            Decision::Deny(DenyReason::CrossTenant),
            "org_admin must be denied {action} cross-tenant"
        );
    }
}

#[test]
fn test_marketplace_course_is_the_cross_tenant_exception() {
    let marketplace = marketplace();
    let mut course = course_in(marketplace);
    course.published = true;
    course.is_public = true;
    let ctx = ctx_for(&course, marketplace);

    let student = Actor::new(
        Uuid::new_v4(),
        GlobalRole::Student,
        TenantRef::Tenant(Uuid::new_v4()),
    );
    assert!(can(&student, Action::View, ResourceKind::Course, &ctx).is_allowed());
}

// ============================================================================
// Owner supremacy
// ============================================================================

#[test]
fn test_owner_always_deletes_own_course() {
    let marketplace = marketplace();
    let org = Uuid::new_v4();

    for (role, tenant) in [
        (GlobalRole::Instructor, TenantRef::Tenant(org)),
        (GlobalRole::Instructor, TenantRef::Independent),
        (GlobalRole::CoInstructor, TenantRef::Tenant(org)),
    ] {
        let owner = Actor::new(Uuid::new_v4(), role, tenant);
        let mut course = Course::new(org, owner.id, "Owned", "");
        course.organization_id = tenant.organization_id().unwrap_or(marketplace);
        let ctx = ResourceContext::course(&course, marketplace, None, false);

        assert!(can(&owner, Action::Delete, ResourceKind::Course, &ctx).is_allowed());
        assert!(can(&owner, Action::ManageTeam, ResourceKind::Course, &ctx).is_allowed());
    }
}

#[test]
fn test_staff_nonowner_never_deletes() {
    // Non-administrative global roles gain nothing from a staff row when it
    // comes to destructive actions; org/super admins bypass staff
    // resolution entirely and are covered by their own tests.
    let marketplace = marketplace();
    let org = Uuid::new_v4();
    let course = course_in(org);

    for global_role in [
        GlobalRole::Student,
        GlobalRole::Instructor,
        GlobalRole::Ta,
        GlobalRole::CoInstructor,
    ] {
        for staff_role in [CourseRole::CoInstructor, CourseRole::Ta] {
            let staff = Actor::new(Uuid::new_v4(), global_role, TenantRef::Tenant(org));
            let ctx = ResourceContext::course(&course, marketplace, Some(staff_role), false);

            assert!(
                can(&staff, Action::Delete, ResourceKind::Course, &ctx).is_denied(),
                "global {global_role:?} with staff {staff_role:?} must not delete"
            );
            assert!(
                can(&staff, Action::ManageTeam, ResourceKind::Course, &ctx).is_denied(),
                "global {global_role:?} with staff {staff_role:?} must not manage the team"
            );
        }
    }
}

#[test]
fn test_global_role_never_substitutes_for_course_role() {
    let marketplace = marketplace();
    let org = Uuid::new_v4();
    let course = course_in(org);
    let ctx = ctx_for(&course, marketplace);

    // A global instructor in the same tenant, not staff on this course.
    let instructor = Actor::new(Uuid::new_v4(), GlobalRole::Instructor, TenantRef::Tenant(org));

    assert_eq!(
        can(&instructor, Action::Edit, ResourceKind::Course, &ctx),
        Decision::Deny(DenyReason::InsufficientRole)
    );
    assert!(can(&instructor, Action::Grade, ResourceKind::Course, &ctx).is_denied());
}

// ============================================================================
// Super-admin bypass
// ============================================================================

#[test]
fn test_super_admin_allows_everything_everywhere() {
    let marketplace = marketplace();
    let admin = Actor::new(Uuid::new_v4(), GlobalRole::SuperAdmin, TenantRef::Independent);

    let course = course_in(Uuid::new_v4());
    let course_ctx = ctx_for(&course, marketplace);

    for action in ALL_ACTIONS {
        for kind in [ResourceKind::Course, ResourceKind::User, ResourceKind::Organization] {
            assert!(
                can(&admin, action, kind, &course_ctx).is_allowed(),
                "super_admin denied {action} on {kind:?}"
            );
        }
    }

    // Tenant membership of the super admin changes nothing.
    let tenant_admin = Actor::new(
        Uuid::new_v4(),
        GlobalRole::SuperAdmin,
        TenantRef::Tenant(Uuid::new_v4()),
    );
    assert!(can(&tenant_admin, Action::Delete, ResourceKind::Course, &course_ctx).is_allowed());
}

// ============================================================================
// Publish gate
// ============================================================================

#[test]
fn test_publish_gate_clamps_for_tenant_owners() {
    let org = Uuid::new_v4();
    assert!(!clamp_is_public(true, TenantRef::Tenant(org)));
    assert!(!clamp_is_public(false, TenantRef::Tenant(org)));
}

#[test]
fn test_publish_gate_honors_independent_owners() {
    assert!(clamp_is_public(true, TenantRef::Independent));
    assert!(!clamp_is_public(false, TenantRef::Independent));
}

#[test]
fn test_publish_gate_after_owner_joins_organization() {
    // Scenario: an independent instructor publishes publicly, then gains an
    // organization via admin action. Subsequent writes must clamp the flag
    // back to false.
    let marketplace = marketplace();

    let owner_tenant_before = TenantRef::normalize(None, marketplace);
    assert!(clamp_is_public(true, owner_tenant_before));

    let org = Uuid::new_v4();
    let owner_tenant_after = TenantRef::normalize(Some(org), marketplace);
    assert!(!clamp_is_public(true, owner_tenant_after));
}

// ============================================================================
// Concrete scenario: TA staffing
// ============================================================================

#[test]
fn test_ta_staffing_scenario() {
    // Instructor I owns C2 in Org A; TA T is added via CourseStaff(C2, T, ta).
    let marketplace = marketplace();
    let org_a = Uuid::new_v4();
    let instructor_id = Uuid::new_v4();
    let course = Course::new(org_a, instructor_id, "Algorithms", "");

    let ta = Actor::new(Uuid::new_v4(), GlobalRole::Ta, TenantRef::Tenant(org_a));
    let ctx = ResourceContext::course(&course, marketplace, Some(CourseRole::Ta), false);

    assert!(can(&ta, Action::Grade, ResourceKind::Course, &ctx).is_allowed());
    assert!(can(&ta, Action::Delete, ResourceKind::Course, &ctx).is_denied());
    assert!(can(&ta, Action::ManageTeam, ResourceKind::Course, &ctx).is_denied());
}
