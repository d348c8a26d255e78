mod catalog;
mod handoff;
mod storage;
mod storefront;

pub use catalog::{CatalogFetcher, CatalogLoad};
pub use handoff::{stored_context, Handoff, HandoffError};
pub use storage::{FileStore, FitmentStore};
#[cfg(test)]
pub use storage::MemoryStore;
pub use storefront::{http_client, MetaobjectSource, StorefrontClient};

#[cfg(test)]
pub(crate) use storefront::fake;
