use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
    config::{Config, ConfigError},
    entity::{FitmentContext, StorageError, VehicleId, FITMENT_STORAGE_KEY},
};

use super::storage::FitmentStore;

#[derive(Debug, Error)]
pub enum HandoffError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to serialize fitment: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persists a resolved vehicle and builds the filtered catalog URL.
pub struct Handoff {
    store: Arc<dyn FitmentStore>,
    listing: Url,
    filter_param: String,
}

impl Handoff {
    pub fn new(store: Arc<dyn FitmentStore>, config: &Config) -> Result<Self, ConfigError> {
        let mut listing = config.store_url()?;
        let invalid = ConfigError::InvalidStoreDomain(listing.to_string());
        listing
            .path_segments_mut()
            .map_err(|_| invalid)?
            .clear()
            .push("collections")
            .push(&config.collection);

        Ok(Self {
            store,
            listing,
            filter_param: config.filter_param.clone(),
        })
    }

    /// Catalog listing filtered to one vehicle.
    pub fn catalog_url(&self, id: &VehicleId) -> Url {
        let mut url = self.listing.clone();
        url.query_pairs_mut()
            .append_pair(&self.filter_param, id.as_str());
        url
    }

    /// Overwrite the stored fitment with `context` and return where to navigate.
    pub fn apply(&self, context: &FitmentContext) -> Result<Url, HandoffError> {
        let json = serde_json::to_string(context)?;
        self.store.put(FITMENT_STORAGE_KEY, &json)?;

        let url = self.catalog_url(&context.id);
        info!("selected {} ({}), navigating to {}", context.label(), context.id, url);
        Ok(url)
    }
}

/// The fitment last written by any session, if one was stored.
///
/// Only reads `store`, so it needs no storefront configuration.
pub fn stored_context(store: &dyn FitmentStore) -> Result<Option<FitmentContext>, StorageError> {
    store
        .get(FITMENT_STORAGE_KEY)?
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(StorageError::from)
}
