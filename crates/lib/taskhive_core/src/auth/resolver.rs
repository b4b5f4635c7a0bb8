//! Tenant resolution for login.

use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::identity::TenantHint;
use crate::models::Tenant;
use crate::store::TenantStore;
use crate::validation::normalize;

/// Resolve an optional hint to an active tenant.
///
/// * no hint → `Ok(None)`; the caller proceeds tenant-less
/// * unknown subdomain/id, or an id that is not a UUID → `NotFound`
/// * tenant exists but is not active → `Forbidden`
pub async fn resolve_tenant<S>(store: &S, hint: Option<&TenantHint>) -> CoreResult<Option<Tenant>>
where
    S: TenantStore + ?Sized,
{
    let Some(hint) = hint else {
        return Ok(None);
    };

    let tenant = match hint {
        TenantHint::Subdomain(subdomain) => store.tenant_by_subdomain(&normalize(subdomain)).await?,
        TenantHint::Id(raw) => match Uuid::parse_str(raw.trim()) {
            Ok(id) => store.tenant_by_id(id).await?,
            Err(_) => None,
        },
    };

    let tenant = tenant.ok_or_else(|| CoreError::not_found("Tenant"))?;
    if !tenant.is_active() {
        return Err(CoreError::Forbidden("Tenant is not active".into()));
    }
    Ok(Some(tenant))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TenantStatus;
    use crate::store::MemoryStore;
    use crate::testing;

    #[tokio::test]
    async fn no_hint_is_none() {
        let store = MemoryStore::new();
        assert!(resolve_tenant(&store, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resolves_by_subdomain_case_insensitively() {
        let store = MemoryStore::new();
        let (tenant, _) = testing::seed_tenant(&store, "acme").await;
        let hint = TenantHint::Subdomain(" ACME ".into());
        let found = resolve_tenant(&store, Some(&hint)).await.unwrap().unwrap();
        assert_eq!(found.id, tenant.id);
    }

    #[tokio::test]
    async fn resolves_by_id() {
        let store = MemoryStore::new();
        let (tenant, _) = testing::seed_tenant(&store, "acme").await;
        let hint = TenantHint::Id(tenant.id.to_string());
        let found = resolve_tenant(&store, Some(&hint)).await.unwrap().unwrap();
        assert_eq!(found.subdomain, "acme");
    }

    #[tokio::test]
    async fn unknown_and_malformed_are_not_found() {
        let store = MemoryStore::new();
        for hint in [
            TenantHint::Subdomain("nope".into()),
            TenantHint::Id(Uuid::now_v7().to_string()),
            TenantHint::Id("not-a-uuid".into()),
        ] {
            let err = resolve_tenant(&store, Some(&hint)).await.unwrap_err();
            assert!(matches!(err, CoreError::NotFound(ref m) if m == "Tenant not found"));
        }
    }

    #[tokio::test]
    async fn inactive_tenant_is_forbidden() {
        let store = MemoryStore::new();
        let (tenant, _) = testing::seed_tenant(&store, "acme").await;
        store
            .set_tenant_status(tenant.id, TenantStatus::Suspended)
            .await
            .unwrap();
        let hint = TenantHint::Subdomain("acme".into());
        let err = resolve_tenant(&store, Some(&hint)).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }
}
