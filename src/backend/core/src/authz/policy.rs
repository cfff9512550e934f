//! Permission evaluator.
//!
//! Answers "may actor X perform action Y on resource Z?" as a pure decision
//! function over pre-fetched records. The evaluator never performs lookups;
//! the caller supplies the actor's staff row, the resource's tenant, and the
//! enrollment flag in [`ResourceContext`], fetched in the same snapshot as
//! any write the decision gates.
//!
//! Evaluation short-circuits in a fixed order (the ordering is load-bearing
//! because roles overlap):
//!
//! 1. `super_admin`: unconditional allow.
//! 2. `org_admin`: allow within their own tenant, cross-tenant deny,
//!    before any staff-role resolution.
//! 3. Courses: resolve the effective course role (owner beats staff row),
//!    then apply the per-action rule table.
//! 4. Everything else: deny.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use super::identity::{Actor, TenantRef};
use crate::models::{Course, CourseRole, GlobalRole, Organization, User};

// ═══════════════════════════════════════════════════════════════════════════════
// Actions and resources
// ═══════════════════════════════════════════════════════════════════════════════

/// Closed set of gated operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Edit,
    Delete,
    ManageTeam,
    Grade,
}

impl Action {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::ManageTeam => "manage_team",
            Self::Grade => "grade",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of resource an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Course,
    User,
    Organization,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Effective course role
// ═══════════════════════════════════════════════════════════════════════════════

/// An actor's authorization role scoped to one specific course.
///
/// The owner role is computed from `course.instructor_id`, never duplicated
/// into the staff table; a stray non-owner `instructor` staff row (forbidden
/// by constraint, but handled defensibly here) ranks below the owner: it can
/// edit and grade but never delete or manage the team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectiveRole {
    /// The instructor of record (`course.instructor_id`).
    Owner,
    /// Explicit staff assignment on this course.
    Staff(CourseRole),
    /// Not staff on this course.
    None,
}

impl EffectiveRole {
    /// Resolve the effective role: owner wins, then the staff row, else none.
    pub fn compute(actor_id: Uuid, owner_id: Option<Uuid>, staff_role: Option<CourseRole>) -> Self {
        if owner_id == Some(actor_id) {
            return Self::Owner;
        }
        match staff_role {
            Some(role) => Self::Staff(role),
            None => Self::None,
        }
    }

    pub fn is_staff(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// The per-action rule table, kept as data so the policy is auditable and
/// testable as a table. `View` is absent: its rule also depends on
/// published/enrolled state and is handled in [`can`].
const ACTION_RULES: &[(Action, &[EffectiveRole])] = &[
    (Action::Delete, &[EffectiveRole::Owner]),
    (Action::ManageTeam, &[EffectiveRole::Owner]),
    (
        Action::Edit,
        &[
            EffectiveRole::Owner,
            EffectiveRole::Staff(CourseRole::Instructor),
            EffectiveRole::Staff(CourseRole::CoInstructor),
        ],
    ),
    (
        Action::Grade,
        &[
            EffectiveRole::Owner,
            EffectiveRole::Staff(CourseRole::Instructor),
            EffectiveRole::Staff(CourseRole::CoInstructor),
            EffectiveRole::Staff(CourseRole::Ta),
        ],
    ),
];

/// Effective roles allowed to perform `action` on a course.
pub fn allowed_roles(action: Action) -> &'static [EffectiveRole] {
    ACTION_RULES
        .iter()
        .find(|(a, _)| *a == action)
        .map(|(_, roles)| *roles)
        .unwrap_or(&[])
}

// ═══════════════════════════════════════════════════════════════════════════════
// Decision
// ═══════════════════════════════════════════════════════════════════════════════

/// Why an action was denied. Returned as a value, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No role path allows the action.
    InsufficientRole,
    /// The role would suffice, but the resource belongs to another tenant.
    CrossTenant,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientRole => write!(f, "insufficient role for this action"),
            Self::CrossTenant => write!(f, "resource belongs to another organization"),
        }
    }
}

/// Result of a permission evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }

    /// Convert to a `Result` for `?`-style enforcement at the boundary.
    pub fn require(self) -> Result<(), DenyReason> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Resource context
// ═══════════════════════════════════════════════════════════════════════════════

/// Pre-fetched facts about the target resource, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceContext {
    /// Normalized tenant owning the resource.
    pub tenant: TenantRef,
    /// Resource owner (a course's instructor of record), if the kind has one.
    pub owner_id: Option<Uuid>,
    /// The actor's staff row on this course, if any.
    pub staff_role: Option<CourseRole>,
    pub published: bool,
    pub public: bool,
    /// Whether the actor is enrolled; derived by the caller, never here.
    pub enrolled: bool,
}

impl ResourceContext {
    /// Context for a course action.
    pub fn course(
        course: &Course,
        marketplace_id: Uuid,
        staff_role: Option<CourseRole>,
        enrolled: bool,
    ) -> Self {
        Self {
            tenant: TenantRef::normalize(Some(course.organization_id), marketplace_id),
            owner_id: Some(course.instructor_id),
            staff_role,
            published: course.published,
            public: course.is_public,
            enrolled,
        }
    }

    /// Context for an action on an organization itself.
    pub fn organization(org: &Organization, marketplace_id: Uuid) -> Self {
        Self {
            tenant: TenantRef::normalize(Some(org.id), marketplace_id),
            owner_id: None,
            staff_role: None,
            published: false,
            public: false,
            enrolled: false,
        }
    }

    /// Context for an action targeting another user record.
    pub fn user(target: &User, marketplace_id: Uuid) -> Self {
        Self {
            tenant: TenantRef::normalize(target.organization_id, marketplace_id),
            owner_id: Some(target.id),
            staff_role: None,
            published: false,
            public: false,
            enrolled: false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Evaluation
// ═══════════════════════════════════════════════════════════════════════════════

/// Decide whether `actor` may perform `action` on the resource described by
/// `ctx`. Pure; first match wins.
pub fn can(actor: &Actor, action: Action, resource: ResourceKind, ctx: &ResourceContext) -> Decision {
    // 1. Unconditional god-mode.
    if actor.global_role == GlobalRole::SuperAdmin {
        return Decision::Allow;
    }

    // 2. Org admins hold every permission inside their own tenant and none
    //    outside it, before any staff-role resolution.
    if actor.global_role == GlobalRole::OrgAdmin {
        let decision = if ctx.tenant == actor.tenant {
            Decision::Allow
        } else {
            Decision::Deny(DenyReason::CrossTenant)
        };
        trace_decision(actor, action, resource, decision);
        return decision;
    }

    let decision = match resource {
        ResourceKind::Course => {
            let effective = EffectiveRole::compute(actor.id, ctx.owner_id, ctx.staff_role);
            match action {
                Action::View => view_decision(actor, ctx, effective),
                _ if allowed_roles(action).contains(&effective) => Decision::Allow,
                _ => Decision::Deny(DenyReason::InsufficientRole),
            }
        }
        // User and organization mutations are the province of admins,
        // handled above; everything else falls through.
        ResourceKind::User | ResourceKind::Organization => {
            Decision::Deny(DenyReason::InsufficientRole)
        }
    };

    trace_decision(actor, action, resource, decision);
    decision
}

/// `view` combines staff access, enrollment, and publication state.
fn view_decision(actor: &Actor, ctx: &ResourceContext, effective: EffectiveRole) -> Decision {
    if effective.is_staff() || ctx.enrolled {
        return Decision::Allow;
    }
    if ctx.published {
        // Marketplace courses are world-readable; tenant courses only
        // within their tenant.
        if ctx.public || ctx.tenant == actor.tenant {
            return Decision::Allow;
        }
        return Decision::Deny(DenyReason::CrossTenant);
    }
    Decision::Deny(DenyReason::InsufficientRole)
}

/// Write-time gate for marketplace publishing.
///
/// `is_public = true` is only permitted while the owning instructor is
/// independent; B2B tenants never publish to the marketplace. The gate
/// clamps the stored value rather than erroring, and is applied on every
/// write (never trusted from input), so an owner who has since joined an
/// organization loses the flag on their next update.
pub fn clamp_is_public(requested: bool, owner_tenant: TenantRef) -> bool {
    requested && owner_tenant.is_independent()
}

fn trace_decision(actor: &Actor, action: Action, resource: ResourceKind, decision: Decision) {
    if let Decision::Deny(reason) = decision {
        debug!(
            actor_id = %actor.id,
            role = %actor.global_role,
            action = %action,
            resource = ?resource,
            reason = %reason,
            "Permission denied"
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
