use crate::backend::BackendClient;
use crate::models::TenantId;

/// Maps a company name to its backend id with a single exact-match lookup.
///
/// Backend failures are logged and reported as "not found" so callers never
/// see backend error detail.
pub async fn resolve_tenant(backend: &dyn BackendClient, name: &str) -> Option<TenantId> {
    match backend.find_tenants_by_name(name).await {
        Ok(rows) => {
            let id = rows.into_iter().next().map(|row| row.id);
            match &id {
                Some(id) => log::info!("🏢 Company '{}' resolved to {}", name, id),
                None => log::info!("🏢 Company '{}' has no match", name),
            }
            id
        }
        Err(e) => {
            log::error!("❌ Error fetching company '{}': {}", name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubBackend;
    use serde_json::json;

    #[tokio::test]
    async fn test_first_match_wins() {
        let backend = StubBackend::new()
            .with_tenant("Acme", json!("c-1"))
            .with_tenant("Acme", json!("c-2"));

        let id = resolve_tenant(&backend, "Acme").await;

        assert_eq!(id, Some(TenantId::from(json!("c-1"))));
        assert_eq!(backend.tenant_lookups(), 1);
    }

    #[tokio::test]
    async fn test_no_match_is_not_found() {
        let backend = StubBackend::new().with_tenant("Acme", json!("c-1"));
        assert_eq!(resolve_tenant(&backend, "acme").await, None);
    }

    #[tokio::test]
    async fn test_backend_error_is_not_found() {
        let backend = StubBackend::new()
            .with_tenant("Acme", json!("c-1"))
            .failing_tenant_lookup();

        assert_eq!(resolve_tenant(&backend, "Acme").await, None);
        assert_eq!(backend.tenant_lookups(), 1);
    }
}
