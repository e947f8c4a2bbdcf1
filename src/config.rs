use crate::error::CatalogError;
use std::time::Duration;

/// Runtime configuration for a schema catalog instance.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Above this measured cardinality a column's value space is treated as
    /// effectively unique and never enumerated.
    pub unique_threshold: u64,
    /// Above this measured cardinality a numeric column stops enumerating and
    /// is described as a continuous range instead.
    pub numeric_enumeration_threshold: u64,
    /// Cardinality-estimate precision requested for numeric column types.
    pub numeric_precision_threshold: u32,
    /// Cardinality-estimate precision requested for all other column types.
    pub default_precision_threshold: u32,
    /// Maximum age of a column's statistics before it is eligible for
    /// recomputation.
    pub staleness: Duration,
    /// Bounded wait on the work queue before the worker runs an idle cycle.
    pub queue_pop_timeout: Duration,
    /// Sleep between idle cycles once the queue has drained.
    pub idle_sleep: Duration,
    /// How long a memoized mapping-discovery result stays fresh.
    pub mapping_cache_ttl: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            unique_threshold: 1000,
            numeric_enumeration_threshold: 30,
            numeric_precision_threshold: 10,
            default_precision_threshold: 100,
            staleness: Duration::from_secs(2 * 60 * 60),
            queue_pop_timeout: Duration::from_secs(10 * 60),
            idle_sleep: Duration::from_secs(60),
            mapping_cache_ttl: Duration::from_secs(5 * 60),
        }
    }
}

impl CatalogConfig {
    /// Tight intervals for development and test harnesses.
    pub fn fast_refresh() -> Self {
        Self {
            staleness: Duration::from_millis(50),
            queue_pop_timeout: Duration::from_millis(20),
            idle_sleep: Duration::from_millis(5),
            mapping_cache_ttl: Duration::from_millis(100),
            ..Self::default()
        }
    }
}

pub fn validate_config(config: &CatalogConfig) -> Result<(), CatalogError> {
    if config.unique_threshold == 0 {
        return Err(CatalogError::InvalidConfig {
            message: "unique_threshold must be positive".into(),
        });
    }
    if config.numeric_enumeration_threshold >= config.unique_threshold {
        return Err(CatalogError::InvalidConfig {
            message: "numeric_enumeration_threshold must be below unique_threshold".into(),
        });
    }
    if config.numeric_precision_threshold == 0 || config.default_precision_threshold == 0 {
        return Err(CatalogError::InvalidConfig {
            message: "precision thresholds must be positive".into(),
        });
    }
    if config.staleness.is_zero() {
        return Err(CatalogError::InvalidConfig {
            message: "staleness window must be positive".into(),
        });
    }
    if config.queue_pop_timeout.is_zero() || config.idle_sleep.is_zero() {
        return Err(CatalogError::InvalidConfig {
            message: "worker intervals must be positive".into(),
        });
    }
    Ok(())
}
