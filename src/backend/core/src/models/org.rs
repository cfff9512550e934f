//! Organization (tenant) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved slug of the public marketplace tenant.
///
/// Exactly one organization carries this slug. It exists so that
/// `courses.organization_id` can stay NOT NULL for independent instructors'
/// courses; users attached to it are treated as independent (see
/// [`crate::authz::TenantRef::normalize`]).
pub const PUBLIC_MARKETPLACE_SLUG: &str = "marketplace";

/// An organization (tenant) owning courses and members.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    /// URL-safe unique identifier.
    pub slug: String,
    /// Self-service join code, unique across tenants.
    pub access_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        access_code: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            access_code: access_code.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this is the reserved public marketplace tenant (derived from
    /// the slug, not stored).
    pub fn is_public_marketplace(&self) -> bool {
        self.slug == PUBLIC_MARKETPLACE_SLUG
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marketplace_derived_from_slug() {
        let org = Organization::new("Acme Learning", "acme", "ACME-2024");
        assert!(!org.is_public_marketplace());

        let marketplace = Organization::new("Marketplace", PUBLIC_MARKETPLACE_SLUG, "PUBLIC");
        assert!(marketplace.is_public_marketplace());
    }
}
