use crate::error::CatalogError;
use crate::gateway::{AggregationResult, AggregationSpec, BackendGateway, IndexMapping};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

struct CacheEntry {
    fetched_at: Instant,
    mappings: Vec<IndexMapping>,
}

/// Memoizes `discover_mappings` for a fixed TTL. Mapping pulls are expensive
/// and the mapping changes slowly, so repeated discovery within the TTL is
/// served from memory. Expired entries are evicted lazily on access; a
/// failed refetch leaves nothing cached. Aggregations pass through.
pub struct CachedGateway<G> {
    inner: G,
    ttl: Duration,
    cache: Mutex<Option<CacheEntry>>,
}

impl<G: BackendGateway> CachedGateway<G> {
    pub fn new(inner: G, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: Mutex::new(None),
        }
    }
}

impl<G: BackendGateway> BackendGateway for CachedGateway<G> {
    fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    fn discover_mappings(&self) -> Result<Vec<IndexMapping>, CatalogError> {
        let mut cache = self.cache.lock();
        if let Some(entry) = cache.as_ref() {
            if entry.fetched_at.elapsed() < self.ttl {
                return Ok(entry.mappings.clone());
            }
            *cache = None;
        }
        let mappings = self.inner.discover_mappings()?;
        *cache = Some(CacheEntry {
            fetched_at: Instant::now(),
            mappings: mappings.clone(),
        });
        Ok(mappings)
    }

    fn aggregate(
        &self,
        table: &str,
        spec: &AggregationSpec,
    ) -> Result<AggregationResult, CatalogError> {
        self.inner.aggregate(table, spec)
    }
}
