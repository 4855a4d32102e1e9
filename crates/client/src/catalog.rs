//! Cached catalog of installed apps, their actions and configured assets.
//!
//! The catalog is read once per client from the action builder endpoint and
//! reused until [`SoarClient::invalidate_catalog`] is called.

use std::sync::{Arc, PoisonError};

use serde::Deserialize;
use soar_model::{ActionDefinition, App, Asset, AssetId, SoarError};
use tracing::debug;

use crate::transport::{ApiRequest, Query};
use crate::SoarClient;

/// Snapshot of the action builder endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub apps: Vec<App>,
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl SoarClient {
    /// The cached catalog, fetched on first use.
    pub async fn catalog(&self) -> Result<Arc<Catalog>, SoarError> {
        let cached = self
            .catalog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(cached) = cached {
            return Ok(cached);
        }

        let fetched: Arc<Catalog> = Arc::new(
            self.transport
                .decode(ApiRequest::get("build_action"))
                .await?,
        );
        debug!(
            apps = fetched.apps.len(),
            actions = fetched.actions.len(),
            assets = fetched.assets.len(),
            "Catalog loaded"
        );
        *self.catalog.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&fetched));
        Ok(fetched)
    }

    pub async fn get_apps(&self) -> Result<Vec<App>, SoarError> {
        Ok(self.catalog().await?.apps.clone())
    }

    /// First app whose name contains `name`, ignoring case.
    pub async fn get_app(&self, name: &str) -> Result<Option<App>, SoarError> {
        Ok(self
            .catalog()
            .await?
            .apps
            .iter()
            .find(|app| app.name_matches(name))
            .cloned())
    }

    pub async fn get_actions(&self) -> Result<Vec<ActionDefinition>, SoarError> {
        Ok(self.catalog().await?.actions.clone())
    }

    pub async fn get_assets(&self) -> Result<Vec<Asset>, SoarError> {
        Ok(self.catalog().await?.assets.clone())
    }

    pub async fn get_asset_ids(&self) -> Result<Vec<AssetId>, SoarError> {
        Ok(self
            .catalog()
            .await?
            .assets
            .iter()
            .filter_map(|asset| asset.id)
            .collect())
    }

    /// First asset whose name contains `name`, as matched by the server.
    ///
    /// Not served from the cache.
    pub async fn get_asset(&self, name: &str) -> Result<Asset, SoarError> {
        let assets: Vec<Asset> = self
            .transport
            .list(
                ApiRequest::get("asset")
                    .query(Query::new().text("_filter_name__icontains", name)),
            )
            .await?;
        assets.into_iter().next().ok_or_else(|| SoarError::NotFound {
            what: "asset",
            name: name.to_string(),
        })
    }
}
