//! Identity model: global role plus normalized tenant membership.
//!
//! The storage layer carries two representations of "not affiliated with a
//! paying organization": `organization_id = NULL` and membership in the
//! reserved marketplace tenant. This module is the single seam where both
//! collapse into [`TenantRef::Independent`]; nothing downstream may compare
//! raw organization ids against the marketplace id again.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::{GlobalRole, User};

/// Canonical tenant membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "organization_id")]
pub enum TenantRef {
    /// Not tied to a paying organization; operates in the public marketplace.
    Independent,
    /// Member of the given organization.
    Tenant(Uuid),
}

impl TenantRef {
    /// Normalize a raw `organization_id` column value.
    ///
    /// Both `None` and the reserved marketplace tenant map to
    /// [`TenantRef::Independent`]; after this point the two are
    /// indistinguishable everywhere, including audit output.
    pub fn normalize(organization_id: Option<Uuid>, marketplace_id: Uuid) -> Self {
        match organization_id {
            None => Self::Independent,
            Some(id) if id == marketplace_id => Self::Independent,
            Some(id) => Self::Tenant(id),
        }
    }

    pub fn is_independent(&self) -> bool {
        matches!(self, Self::Independent)
    }

    /// The organization id for tenant members, `None` when independent.
    pub fn organization_id(&self) -> Option<Uuid> {
        match self {
            Self::Independent => None,
            Self::Tenant(id) => Some(*id),
        }
    }
}

impl fmt::Display for TenantRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Independent => write!(f, "independent"),
            Self::Tenant(id) => write!(f, "tenant({id})"),
        }
    }
}

/// The normalized requesting identity handed to the permission evaluator and
/// visibility resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub global_role: GlobalRole,
    pub tenant: TenantRef,
}

impl Actor {
    pub fn new(id: Uuid, global_role: GlobalRole, tenant: TenantRef) -> Self {
        Self {
            id,
            global_role,
            tenant,
        }
    }

    /// Build from a loaded user row, normalizing tenant membership.
    pub fn from_user(user: &User, marketplace_id: Uuid) -> Self {
        Self {
            id: user.id,
            global_role: user.role,
            tenant: TenantRef::normalize(user.organization_id, marketplace_id),
        }
    }

    pub fn is_independent(&self) -> bool {
        self.tenant.is_independent()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_org_normalizes_to_independent() {
        let marketplace = Uuid::new_v4();
        assert_eq!(
            TenantRef::normalize(None, marketplace),
            TenantRef::Independent
        );
    }

    #[test]
    fn test_marketplace_org_normalizes_to_independent() {
        let marketplace = Uuid::new_v4();
        assert_eq!(
            TenantRef::normalize(Some(marketplace), marketplace),
            TenantRef::Independent
        );
    }

    #[test]
    fn test_real_org_stays_tenant() {
        let marketplace = Uuid::new_v4();
        let org = Uuid::new_v4();
        assert_eq!(
            TenantRef::normalize(Some(org), marketplace),
            TenantRef::Tenant(org)
        );
    }

    #[test]
    fn test_both_independent_forms_are_equal() {
        // Regression against the dual-representation bug: a null-org user
        // and a marketplace-tenant user produce identical actors.
        let marketplace = Uuid::new_v4();
        let id = Uuid::new_v4();

        let mut null_org = User::new("a@example.com", "A", "h");
        null_org.id = id;
        let mut placeholder_org = User::new("a@example.com", "A", "h");
        placeholder_org.id = id;
        placeholder_org.organization_id = Some(marketplace);

        assert_eq!(
            Actor::from_user(&null_org, marketplace),
            Actor::from_user(&placeholder_org, marketplace)
        );
    }

    #[test]
    fn test_organization_id_accessor() {
        let org = Uuid::new_v4();
        assert_eq!(TenantRef::Tenant(org).organization_id(), Some(org));
        assert_eq!(TenantRef::Independent.organization_id(), None);
    }
}
