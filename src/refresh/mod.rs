pub mod gate;
pub mod queue;

use crate::catalog::column::{Column, ColumnKey, Table};
use crate::catalog::domain::{Domain, DomainClass, classify};
use crate::catalog::{CatalogStore, ColumnStatsUpdate, now_micros};
use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::gateway::mapping::parse_properties;
use crate::gateway::{AggregationSpec, AggregationValue, BackendGateway};
use crate::refresh::gate::ReadinessGate;
use crate::refresh::queue::WorkQueue;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

/// The background refresh engine. One instance runs for the lifetime of a
/// catalog on a dedicated thread: an initial full mapping pull, then a drain
/// loop over the work queue with periodic staleness rescans.
pub(crate) struct RefreshWorker {
    store: Arc<CatalogStore>,
    gateway: Arc<dyn BackendGateway>,
    queue: Arc<WorkQueue>,
    ready: Arc<ReadinessGate>,
    stop: Arc<ReadinessGate>,
    config: CatalogConfig,
}

impl RefreshWorker {
    pub(crate) fn new(
        store: Arc<CatalogStore>,
        gateway: Arc<dyn BackendGateway>,
        queue: Arc<WorkQueue>,
        ready: Arc<ReadinessGate>,
        stop: Arc<ReadinessGate>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            queue,
            ready,
            stop,
            config,
        }
    }

    /// Thread entry point. A discovery failure here is fatal to catalog
    /// readiness: it is recorded for readers and the worker exits.
    pub(crate) fn run(self) {
        info!("initial mapping discovery");
        match self.discover() {
            Ok((tables, columns)) => {
                info!(tables, columns, "initial mapping discovery complete");
            }
            Err(err) => {
                error!(error = %err, "initial mapping discovery failed");
                self.store.set_bootstrap_failure(err.to_string());
                self.ready.signal();
                return;
            }
        }
        self.ready.signal();
        self.drain();
    }

    /// Pulls every index/alias mapping from the backend and upserts the
    /// discovered tables and columns, enqueueing each column for a
    /// statistics pass. When several indices share an alias, only the newest
    /// index's fields populate that alias.
    fn discover(&self) -> Result<(usize, usize), CatalogError> {
        let mut mappings = self
            .gateway
            .discover_mappings()
            .map_err(|err| CatalogError::Discovery(err.to_string()))?;
        mappings.sort_by(|a, b| {
            b.sort_key
                .cmp(&a.sort_key)
                .then_with(|| b.index.cmp(&a.index))
        });

        let mut alias_done: HashSet<&str> = HashSet::new();
        let mut tables = 0usize;
        let mut columns = 0usize;
        for mapping in &mappings {
            let parsed = parse_properties(&mapping.index, &mapping.properties)
                .map_err(|err| CatalogError::Discovery(err.to_string()))?;

            self.store.upsert_table(self.table_record(&mapping.index));
            tables += 1;
            for column in &parsed {
                self.store.upsert_column(column.clone());
                self.queue.push(column.key());
                columns += 1;
            }

            for alias in &mapping.aliases {
                if !alias_done.insert(alias.as_str()) {
                    continue;
                }
                self.store.upsert_table(self.table_record(alias));
                tables += 1;
                for column in &parsed {
                    let aliased = column.with_table(alias);
                    self.queue.push(aliased.key());
                    self.store.upsert_column(aliased);
                    columns += 1;
                }
            }
        }
        Ok((tables, columns))
    }

    fn table_record(&self, name: &str) -> Table {
        Table {
            name: name.to_string(),
            url: format!("{}/{}", self.gateway.base_url(), name.replace('.', "/")),
            query_path: None,
        }
    }

    fn drain(&self) {
        while !self.stop.is_signaled() {
            match self.queue.pop(self.config.queue_pop_timeout) {
                Some(key) => self.process(key),
                None => self.idle_cycle(),
            }
        }
        info!("refresh worker stopped");
    }

    fn process(&self, key: ColumnKey) {
        let Some(column) = self.store.column(&key) else {
            return;
        };
        // Structural containers carry no value statistics.
        if column.column_type.is_structural() {
            return;
        }
        match self.refresh_column(&column) {
            Ok(()) => info!(table = %key.table, column = %key.abs_name, "column statistics updated"),
            Err(err) => {
                // Non-fatal: the column keeps its prior statistics and is
                // retried on the next staleness pass.
                warn!(
                    table = %key.table,
                    column = %key.abs_name,
                    error = %err,
                    "column statistics refresh failed"
                );
            }
        }
    }

    fn idle_cycle(&self) {
        if self.stop.is_signaled() {
            return;
        }
        let stale = self
            .store
            .stale_columns(now_micros(), self.config.staleness);
        if !stale.is_empty() {
            let added = self.queue.extend(stale);
            if added > 0 {
                info!(columns = added, "re-enqueued stale columns");
            }
        }
        self.stop.wait_timeout(self.config.idle_sleep);
    }

    /// Measures cardinality, classifies the column, enumerates partitions
    /// when the value space is small enough, and commits everything in one
    /// store update. Any backend failure leaves the record untouched.
    fn refresh_column(&self, column: &Column) -> Result<(), CatalogError> {
        assert!(
            !column.column_type.is_structural(),
            "structural column {}.{} has no value statistics",
            column.table,
            column.abs_name
        );
        let stat_err = |message: String| CatalogError::StatAggregation {
            table: column.table.clone(),
            column: column.abs_name.clone(),
            message,
        };

        let precision_threshold = if column.column_type.is_numeric() {
            self.config.numeric_precision_threshold
        } else {
            self.config.default_precision_threshold
        };
        let spec = match column.nested_path.first() {
            Some(path) => AggregationSpec::NestedCardinality {
                path: path.clone(),
                field: column.abs_name.clone(),
                precision_threshold,
            },
            None => AggregationSpec::Cardinality {
                field: column.abs_name.clone(),
                precision_threshold,
            },
        };
        let result = self
            .gateway
            .aggregate(&column.table, &spec)
            .map_err(|err| stat_err(err.to_string()))?;
        let AggregationValue::Cardinality(cardinality) = result.value else {
            return Err(stat_err("expected a cardinality estimate".into()));
        };

        let update = match classify(column.column_type, cardinality, &self.config) {
            DomainClass::Unique => ColumnStatsUpdate {
                count: Some(result.doc_count),
                cardinality: Some(cardinality),
                domain: Some(Domain::Unique),
                clear_partitions: true,
                last_updated: now_micros(),
                ..ColumnStatsUpdate::default()
            },
            DomainClass::Numeric => ColumnStatsUpdate {
                count: Some(result.doc_count),
                cardinality: Some(cardinality),
                domain: Some(Domain::Numeric),
                clear_partitions: true,
                last_updated: now_micros(),
                ..ColumnStatsUpdate::default()
            },
            DomainClass::Enumerable => {
                let spec = match column.nested_path.first() {
                    Some(path) => AggregationSpec::NestedTerms {
                        path: path.clone(),
                        field: column.abs_name.clone(),
                        size: self.config.unique_threshold,
                    },
                    None => AggregationSpec::Terms {
                        field: column.abs_name.clone(),
                        size: self.config.unique_threshold,
                    },
                };
                let result = self
                    .gateway
                    .aggregate(&column.table, &spec)
                    .map_err(|err| stat_err(err.to_string()))?;
                let AggregationValue::Buckets(mut partitions) = result.value else {
                    return Err(stat_err("expected terms buckets".into()));
                };
                partitions.sort();
                partitions.dedup();
                ColumnStatsUpdate {
                    count: Some(result.doc_count),
                    cardinality: Some(cardinality),
                    partitions: Some(partitions.clone()),
                    domain: Some(Domain::SimpleSet { partitions }),
                    last_updated: now_micros(),
                    ..ColumnStatsUpdate::default()
                }
            }
        };
        self.store.update_column_stats(&column.key(), update)
    }
}
