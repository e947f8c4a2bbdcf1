pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod refresh;

pub use crate::catalog::column::{
    Column, ColumnKey, ColumnType, META_COLUMNS, META_TABLES, ScalarValue, Table,
};
pub use crate::catalog::domain::{Domain, DomainClass};
pub use crate::catalog::{CatalogStore, ColumnStatsUpdate};
pub use crate::config::CatalogConfig;
pub use crate::error::{CatalogError, CatalogErrorCode};
pub use crate::gateway::{
    AggregationResult, AggregationSpec, AggregationValue, BackendGateway, IndexMapping,
};

use crate::config::validate_config;
use crate::refresh::RefreshWorker;
use crate::refresh::gate::ReadinessGate;
use crate::refresh::queue::WorkQueue;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::info;

/// A self-maintaining schema catalog over one backend connection.
///
/// `open` returns immediately; a dedicated worker thread performs the first
/// full mapping pull and then keeps column statistics eventually consistent.
/// Readers query concurrently through `get_table`/`get_columns`; a query for
/// a table the first pass has not reached yet blocks on the readiness gate
/// rather than observing an empty catalog.
pub struct SchemaCatalog {
    store: Arc<CatalogStore>,
    queue: Arc<WorkQueue>,
    ready: Arc<ReadinessGate>,
    stop: Arc<ReadinessGate>,
    worker: Option<JoinHandle<()>>,
}

impl SchemaCatalog {
    pub fn open(
        config: CatalogConfig,
        gateway: Arc<dyn BackendGateway>,
    ) -> Result<Self, CatalogError> {
        validate_config(&config)?;
        info!(
            backend = gateway.base_url(),
            unique_threshold = config.unique_threshold,
            numeric_enumeration_threshold = config.numeric_enumeration_threshold,
            numeric_precision_threshold = config.numeric_precision_threshold,
            default_precision_threshold = config.default_precision_threshold,
            staleness_secs = config.staleness.as_secs(),
            queue_pop_timeout_secs = config.queue_pop_timeout.as_secs(),
            idle_sleep_secs = config.idle_sleep.as_secs(),
            "catalog config"
        );
        let ready = Arc::new(ReadinessGate::new());
        let stop = Arc::new(ReadinessGate::new());
        let store = Arc::new(CatalogStore::new(Arc::clone(&ready)));
        let queue = Arc::new(WorkQueue::new());
        let worker = RefreshWorker::new(
            Arc::clone(&store),
            gateway,
            Arc::clone(&queue),
            Arc::clone(&ready),
            Arc::clone(&stop),
            config,
        );
        let handle = std::thread::Builder::new()
            .name("catalog-refresh".into())
            .spawn(move || worker.run())?;
        Ok(Self {
            store,
            queue,
            ready,
            stop,
            worker: Some(handle),
        })
    }

    /// Blocks until the first discovery pass has finished, surfacing a
    /// discovery failure so startup code can retry or abort.
    pub fn wait_until_ready(&self) -> Result<(), CatalogError> {
        self.ready.wait();
        match self.store.bootstrap_failure() {
            Some(message) => Err(CatalogError::Discovery(message)),
            None => Ok(()),
        }
    }

    pub fn get_table(&self, name: &str) -> Option<Table> {
        self.store.get_table(name)
    }

    /// The table's columns, name-sorted. Blocks on the readiness gate for a
    /// table the first discovery pass has not reached yet; a table unknown
    /// after that pass is `NotFound`.
    pub fn get_columns(&self, table: &str) -> Result<Vec<Column>, CatalogError> {
        self.store.get_columns(table, true)
    }

    /// Direct access to the underlying store.
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Cooperative shutdown: wakes and joins the worker. In-flight backend
    /// calls complete rather than being aborted.
    pub fn stop(mut self) {
        self.request_stop();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }

    fn request_stop(&self) {
        self.stop.signal();
        self.queue.close();
    }
}

impl Drop for SchemaCatalog {
    fn drop(&mut self) {
        // stop() already joined; otherwise detach the worker after waking it.
        if self.worker.is_some() {
            self.request_stop();
        }
    }
}
