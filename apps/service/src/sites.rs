use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::Store;
use crate::database::models::Site;
use crate::error::{MonitorError, Result};
use crate::validation::{
    validate_change_threshold, validate_check_frequency, validate_http_endpoint, validate_site_name,
};

/// Input for creating a site
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDraft {
    pub name: String,
    pub url: String,
    pub check_frequency: Option<u32>,
    pub change_threshold: Option<f64>,
    pub is_active: Option<bool>,
}

/// Partial update of a site; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub check_frequency: Option<u32>,
    pub change_threshold: Option<f64>,
    pub is_active: Option<bool>,
}

/// Site registry - operator-facing CRUD with validation. Sites are never
/// hard-deleted so their history stays queryable.
pub struct SiteRegistry {
    store: Arc<dyn Store>,
}

impl SiteRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, draft: SiteDraft) -> Result<Site> {
        let mut site = Site::new(draft.name.trim(), draft.url.trim());
        if let Some(frequency) = draft.check_frequency {
            site.check_frequency = frequency;
        }
        if let Some(threshold) = draft.change_threshold {
            site.change_threshold = threshold;
        }
        if let Some(active) = draft.is_active {
            site.is_active = active;
        }

        validate(&site)?;
        self.ensure_url_available(&site.url, None).await?;

        self.store.insert_site(&site).await?;
        tracing::info!("Created site {} ({}) checking every {}s", site.name, site.url, site.check_frequency);
        Ok(site)
    }

    pub async fn update(&self, id: Uuid, patch: SitePatch) -> Result<Site> {
        let mut site = self.get(id).await?;

        if let Some(name) = patch.name {
            site.name = name.trim().to_string();
        }
        if let Some(url) = patch.url {
            site.url = url.trim().to_string();
        }
        if let Some(frequency) = patch.check_frequency {
            site.check_frequency = frequency;
        }
        if let Some(threshold) = patch.change_threshold {
            site.change_threshold = threshold;
        }
        if let Some(active) = patch.is_active {
            site.is_active = active;
        }

        validate(&site)?;
        self.ensure_url_available(&site.url, Some(site.id)).await?;

        site.updated_at = Utc::now();
        self.store.update_site(&site).await?;
        Ok(site)
    }

    /// Soft delete: the site stops being checked but keeps its history
    pub async fn deactivate(&self, id: Uuid) -> Result<Site> {
        let mut site = self.get(id).await?;
        if site.is_active {
            site.is_active = false;
            site.updated_at = Utc::now();
            self.store.update_site(&site).await?;
            tracing::info!("Deactivated site {} ({})", site.name, site.url);
        }
        Ok(site)
    }

    pub async fn get(&self, id: Uuid) -> Result<Site> {
        self.store.get_site(id).await?.ok_or_else(|| MonitorError::not_found("Site", id))
    }

    pub async fn list(&self, active_only: bool) -> Result<Vec<Site>> {
        self.store.list_sites(active_only).await
    }

    async fn ensure_url_available(&self, url: &str, own_id: Option<Uuid>) -> Result<()> {
        match self.store.find_site_by_url(url).await? {
            Some(existing) if Some(existing.id) != own_id => {
                Err(MonitorError::validation(format!("A site with URL {url} already exists")))
            }
            _ => Ok(()),
        }
    }
}

fn validate(site: &Site) -> Result<()> {
    validate_site_name(&site.name).to_result()?;
    validate_http_endpoint(&site.url).to_result()?;
    validate_check_frequency(site.check_frequency).to_result()?;
    validate_change_threshold(site.change_threshold).to_result()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::create_test_store;

    fn draft(url: &str) -> SiteDraft {
        SiteDraft { name: "Example".into(), url: url.into(), check_frequency: None, change_threshold: None, is_active: None }
    }

    #[tokio::test]
    async fn test_create_applies_defaults() -> Result<()> {
        let (store, _dir) = create_test_store().await?;
        let registry = SiteRegistry::new(store);

        let site = registry.create(draft("https://example.com")).await?;

        assert_eq!(site.check_frequency, 300);
        assert_eq!(site.change_threshold, 10.0);
        assert!(site.is_active);
        assert_eq!(registry.get(site.id).await?, site);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() -> Result<()> {
        let (store, _dir) = create_test_store().await?;
        let registry = SiteRegistry::new(store);

        let too_fast = SiteDraft { check_frequency: Some(60), ..draft("https://example.com") };
        assert!(matches!(registry.create(too_fast).await, Err(MonitorError::Validation(_))));

        let bad_url = draft("ftp://example.com");
        assert!(matches!(registry.create(bad_url).await, Err(MonitorError::Validation(_))));

        let bad_threshold = SiteDraft { change_threshold: Some(150.0), ..draft("https://example.com") };
        assert!(matches!(registry.create(bad_threshold).await, Err(MonitorError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_url_is_rejected() -> Result<()> {
        let (store, _dir) = create_test_store().await?;
        let registry = SiteRegistry::new(store);

        let first = registry.create(draft("https://example.com")).await?;
        assert!(matches!(registry.create(draft("https://example.com")).await, Err(MonitorError::Validation(_))));

        let other = registry.create(draft("https://other.example.com")).await?;
        let collision = SitePatch { url: Some(first.url.clone()), ..SitePatch::default() };
        assert!(matches!(registry.update(other.id, collision).await, Err(MonitorError::Validation(_))));

        // Re-saving its own URL is fine
        let same = SitePatch { url: Some(first.url.clone()), name: Some("Renamed".into()), ..SitePatch::default() };
        assert_eq!(registry.update(first.id, same).await?.name, "Renamed");
        Ok(())
    }

    #[tokio::test]
    async fn test_deactivate_keeps_site() -> Result<()> {
        let (store, _dir) = create_test_store().await?;
        let registry = SiteRegistry::new(store);
        let site = registry.create(draft("https://example.com")).await?;

        let deactivated = registry.deactivate(site.id).await?;

        assert!(!deactivated.is_active);
        assert!(registry.list(true).await?.is_empty());
        assert_eq!(registry.list(false).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_site_is_not_found() -> Result<()> {
        let (store, _dir) = create_test_store().await?;
        let registry = SiteRegistry::new(store);
        assert!(matches!(registry.get(Uuid::new_v4()).await, Err(MonitorError::NotFound { .. })));
        assert!(matches!(
            registry.update(Uuid::new_v4(), SitePatch::default()).await,
            Err(MonitorError::NotFound { .. })
        ));
        Ok(())
    }
}
