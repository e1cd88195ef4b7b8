use crate::error::Result;
use crate::models::provider::annotate;
use crate::models::variant::ModelVariant;
use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

/// Point-in-time catalog listing, shared read-only between callers
pub type Snapshot = Arc<[ModelVariant]>;

/// Remote listing of catalog variants
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch every variant, in the order the service ranks them
    async fn fetch_catalog(&self) -> Result<Vec<ModelVariant>>;
}

/// Most recently fetched catalog snapshot.
///
/// Fetches are serialized so concurrent callers of [`CatalogCache::get`]
/// trigger at most one remote listing. The snapshot itself is swapped
/// whole and never mutated after classification.
#[derive(Debug, Default)]
pub struct CatalogCache {
    snapshot: RwLock<Option<Snapshot>>,
    fetch_gate: Mutex<()>,
}

impl CatalogCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached snapshot, fetching and classifying it first if needed
    pub async fn get(&self, source: &dyn CatalogSource) -> Result<Snapshot> {
        if let Some(snapshot) = self.current() {
            tracing::debug!("Catalog cache hit ({} variants)", snapshot.len());
            return Ok(snapshot);
        }

        let _gate = self.fetch_gate.lock().await;
        // Another caller may have filled the slot while we waited
        if let Some(snapshot) = self.current() {
            return Ok(snapshot);
        }

        let variants = source.fetch_catalog().await?;
        let snapshot: Snapshot = annotate(variants).into();
        tracing::info!("Fetched catalog with {} variants", snapshot.len());

        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Discard the cached snapshot. The next [`CatalogCache::get`] refetches.
    pub fn refresh(&self) {
        tracing::debug!("Catalog cache cleared");
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// True once a snapshot is held
    #[must_use]
    pub fn is_fetched(&self) -> bool {
        self.current().is_some()
    }

    fn current(&self) -> Option<Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
