//! Tenancy and authorization engine.
//!
//! Three cooperating, purely functional components, evaluated over
//! already-fetched records (no I/O in any of them):
//!
//! - **Identity model** ([`identity`]): normalizes the dual "no organization"
//!   vs "marketplace organization" representation into a single
//!   [`TenantRef`], so downstream logic never special-cases either form.
//! - **Permission evaluator** ([`policy`]): decides allow/deny for one
//!   `(actor, action, resource)` tuple from explicit, pre-fetched context.
//!   Denials are values, not errors.
//! - **Visibility resolver** ([`visibility`]): shapes listing queries into
//!   one of four [`CourseScope`] filter predicates, failing closed when the
//!   actor's tenant cannot be resolved.
//!
//! The HTTP layer translates decisions at the boundary: `Deny` becomes 403,
//! `OrganizationNotFound` becomes 400 (see [`crate::error`]).
//!
//! Caller discipline: the context passed to [`policy::can`] must be fetched
//! in the same transaction/snapshot as any write the decision gates.

pub mod identity;
pub mod layer;
pub mod policy;
pub mod visibility;

pub use identity::{Actor, TenantRef};
pub use layer::{RequireRoleLayer, RequireRoleService};
pub use policy::{
    can, clamp_is_public, Action, Decision, DenyReason, EffectiveRole, ResourceContext,
    ResourceKind,
};
pub use visibility::{resolve_course_scope, CourseScope, VisibilityError};
