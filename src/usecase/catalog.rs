use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, error, info, warn};

use crate::{
    config::Config,
    entity::{FetchError, VehicleRecord},
};

use super::storefront::{MetaobjectPage, MetaobjectSource, PageRequest};

/// Result of a catalog load across the candidate type names.
#[derive(Debug, Clone, Default)]
pub struct CatalogLoad {
    /// The type name that produced records, None if every candidate was empty
    pub type_name: Option<String>,
    pub records: Arc<Vec<VehicleRecord>>,
}

/// Sweeps every page of the vehicle catalog from a [`MetaobjectSource`].
pub struct CatalogFetcher {
    source: Arc<dyn MetaobjectSource>,
    type_names: Vec<String>,
    page_size: u32,
    max_pages: u32,
    /// Completed non-empty sweeps by type name
    cache: Cache<String, Arc<Vec<VehicleRecord>>>,
}

impl CatalogFetcher {
    pub fn new(source: Arc<dyn MetaobjectSource>, config: &Config) -> Self {
        Self {
            source,
            type_names: config.type_names.clone(),
            page_size: config.page_size(),
            max_pages: config.max_pages(),
            cache: Cache::builder()
                .time_to_live(config.cache_ttl())
                .max_capacity(8)
                .build(),
        }
    }

    /// Load the catalog under the first type name that yields any records.
    ///
    /// Later candidates are only tried when an earlier one is empty, and
    /// results are never merged. An error under any candidate aborts the load.
    pub async fn load_catalog(&self) -> Result<CatalogLoad, FetchError> {
        for type_name in &self.type_names {
            let records = self.load_all(type_name).await?;
            if !records.is_empty() {
                info!("loaded {} vehicles as '{}'", records.len(), type_name);
                return Ok(CatalogLoad {
                    type_name: Some(type_name.clone()),
                    records,
                });
            }
            warn!("no vehicles found as '{}'", type_name);
        }

        info!("vehicle catalog is empty");
        Ok(CatalogLoad::default())
    }

    /// Follow the pagination cursor for one type name and flatten all pages.
    ///
    /// Nothing collected before a failing page is returned.
    pub async fn load_all(&self, type_name: &str) -> Result<Arc<Vec<VehicleRecord>>, FetchError> {
        if let Some(cached) = self.cache.get(type_name).await {
            debug!("cache hit for '{}'", type_name);
            return Ok(cached);
        }

        let mut records = Vec::new();
        let mut after: Option<String> = None;
        let mut exhausted = false;

        for page_number in 1..=self.max_pages {
            let request = PageRequest {
                type_name: type_name.to_string(),
                first: self.page_size,
                after: after.take(),
            };

            let MetaobjectPage { nodes, page_info } =
                self.source.page(&request).await.map_err(|e| {
                    error!(
                        "aborting '{}' load at page {}: {}",
                        type_name, page_number, e
                    );
                    e
                })?;

            debug!(
                "page {} of '{}' returned {} nodes",
                page_number,
                type_name,
                nodes.len()
            );

            for node in &nodes {
                match VehicleRecord::from_fields(node.id.as_str(), node.fields()) {
                    Some(record) => records.push(record),
                    None => debug!("skipping {}: missing year, make or model", node.id),
                }
            }

            match page_info.end_cursor {
                Some(cursor) if page_info.has_next_page => after = Some(cursor),
                _ => {
                    exhausted = true;
                    break;
                }
            }
        }

        if !exhausted {
            warn!(
                "stopped '{}' after {} pages, more were reported",
                type_name, self.max_pages
            );
        }

        let records = Arc::new(records);
        if !records.is_empty() {
            self.cache
                .insert(type_name.to_string(), records.clone())
                .await;
        }
        Ok(records)
    }
}
