//! Caller identity and tenant lookup keys.

use uuid::Uuid;

use crate::models::Role;

/// The authenticated identity acting in a request, as asserted by a verified
/// token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub role: Role,
}

impl Principal {
    pub fn scope(&self) -> TenantScope {
        TenantScope::from(self.tenant_id)
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn is_tenant_admin(&self) -> bool {
        self.role == Role::TenantAdmin
    }
}

/// A principal plus request metadata that ends up in audit entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub principal: Principal,
    pub ip_address: Option<String>,
}

impl Caller {
    pub fn new(principal: Principal, ip_address: Option<String>) -> Self {
        Self {
            principal,
            ip_address,
        }
    }
}

/// Tenant component of a user lookup key.
///
/// `NoTenant` only ever matches users stored without a tenant; it never acts as
/// a wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TenantScope {
    WithTenant(Uuid),
    NoTenant,
}

impl TenantScope {
    pub fn tenant_id(&self) -> Option<Uuid> {
        match self {
            TenantScope::WithTenant(id) => Some(*id),
            TenantScope::NoTenant => None,
        }
    }

    pub fn matches(&self, tenant_id: Option<Uuid>) -> bool {
        self.tenant_id() == tenant_id
    }
}

impl From<Option<Uuid>> for TenantScope {
    fn from(tenant_id: Option<Uuid>) -> Self {
        match tenant_id {
            Some(id) => TenantScope::WithTenant(id),
            None => TenantScope::NoTenant,
        }
    }
}

/// Client-supplied hint naming the tenant to log into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantHint {
    Subdomain(String),
    Id(String),
}

impl TenantHint {
    /// Build a hint from optional request fields. Blank values count as absent
    /// and the subdomain wins when both are given.
    pub fn from_parts(subdomain: Option<&str>, tenant_id: Option<&str>) -> Option<Self> {
        fn present(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|v| !v.is_empty())
        }
        if let Some(subdomain) = present(subdomain) {
            return Some(TenantHint::Subdomain(subdomain.to_string()));
        }
        present(tenant_id).map(|id| TenantHint::Id(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdomain_wins_over_id() {
        let hint = TenantHint::from_parts(Some("acme"), Some("0190c0de-0000-7000-8000-000000000000"));
        assert_eq!(hint, Some(TenantHint::Subdomain("acme".into())));
    }

    #[test]
    fn blank_parts_are_absent() {
        assert_eq!(TenantHint::from_parts(Some("  "), None), None);
        assert_eq!(
            TenantHint::from_parts(Some(""), Some("abc")),
            Some(TenantHint::Id("abc".into()))
        );
    }

    #[test]
    fn no_tenant_scope_only_matches_missing_tenant() {
        let id = Uuid::now_v7();
        assert!(TenantScope::NoTenant.matches(None));
        assert!(!TenantScope::NoTenant.matches(Some(id)));
        assert!(TenantScope::WithTenant(id).matches(Some(id)));
        assert!(!TenantScope::WithTenant(id).matches(None));
    }
}
