pub mod column;
pub mod domain;

use crate::catalog::column::{
    Column, ColumnKey, META_COLUMNS, META_TABLES, ScalarValue, Table, meta_columns_schema,
    meta_table_record, meta_tables_schema,
};
use crate::catalog::domain::Domain;
use crate::error::{CatalogError, ResourceType};
use crate::refresh::gate::ReadinessGate;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Default)]
struct StoreInner {
    tables: HashMap<String, Table>,
    columns: HashMap<ColumnKey, Column>,
}

/// Statistics applied to one column in a single lock acquisition, so readers
/// never observe a half-updated record. Clears are applied after sets.
#[derive(Debug, Clone, Default)]
pub struct ColumnStatsUpdate {
    pub count: Option<u64>,
    pub cardinality: Option<u64>,
    pub partitions: Option<Vec<ScalarValue>>,
    pub domain: Option<Domain>,
    pub clear_partitions: bool,
    pub clear_domain: bool,
    pub last_updated: u64,
}

/// In-memory collections of Table and Column records, guarded by a single
/// lock. Mutated by the refresh worker; read by any number of threads.
/// Records are never removed during normal operation.
pub struct CatalogStore {
    inner: Mutex<StoreInner>,
    ready: Arc<ReadinessGate>,
    bootstrap_failure: Mutex<Option<String>>,
}

impl CatalogStore {
    pub fn new(ready: Arc<ReadinessGate>) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            ready,
            bootstrap_failure: Mutex::new(None),
        }
    }

    /// Replaces the record for `table.name`. Table records are immutable in
    /// place; rediscovery swaps in a whole new record.
    pub fn upsert_table(&self, table: Table) {
        let mut inner = self.inner.lock();
        inner.tables.insert(table.name.clone(), table);
    }

    /// Merges a column by `(table, abs_name)`: mapping attributes come from
    /// the new record, statistics already computed are preserved when the new
    /// record carries none. Returns whether a new record was inserted.
    pub fn upsert_column(&self, column: Column) -> bool {
        let mut inner = self.inner.lock();
        match inner.columns.entry(column.key()) {
            std::collections::hash_map::Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.name = column.name;
                existing.column_type = column.column_type;
                existing.nested_path = column.nested_path;
                existing.relative = column.relative;
                if column.domain.is_some() {
                    existing.domain = column.domain;
                }
                if column.count.is_some() {
                    existing.count = column.count;
                }
                if column.cardinality.is_some() {
                    existing.cardinality = column.cardinality;
                }
                if column.partitions.is_some() {
                    existing.partitions = column.partitions;
                }
                if column.last_updated.is_some() {
                    existing.last_updated = column.last_updated;
                }
                false
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(column);
                true
            }
        }
    }

    pub fn get_table(&self, name: &str) -> Option<Table> {
        if let Some(meta) = meta_table_record(name) {
            return Some(meta);
        }
        self.inner.lock().tables.get(name).cloned()
    }

    /// All known tables, name-sorted.
    pub fn tables(&self) -> Vec<Table> {
        let inner = self.inner.lock();
        let mut tables: Vec<Table> = inner.tables.values().cloned().collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        tables
    }

    /// Columns of `table`, name-sorted. With `must_have_data`, an empty
    /// result first waits for the initial discovery pass to finish and
    /// retries once; a table still unknown after that is a definite
    /// `NotFound`. The virtual `meta.*` tables answer immediately from their
    /// fixed schemas.
    pub fn get_columns(
        &self,
        table: &str,
        must_have_data: bool,
    ) -> Result<Vec<Column>, CatalogError> {
        if table == META_COLUMNS {
            return Ok(meta_columns_schema());
        }
        if table == META_TABLES {
            return Ok(meta_tables_schema());
        }

        let columns = self.columns_of(table);
        if !columns.is_empty() || !must_have_data {
            return Ok(columns);
        }

        // The table may simply not have been discovered yet; wait out the
        // first pass with the store lock released, then look again.
        self.ready.wait();
        if let Some(message) = self.bootstrap_failure() {
            return Err(CatalogError::Discovery(message));
        }
        let columns = self.columns_of(table);
        if columns.is_empty() {
            return Err(CatalogError::NotFound {
                resource_type: ResourceType::Table,
                resource_id: table.to_string(),
            });
        }
        Ok(columns)
    }

    fn columns_of(&self, table: &str) -> Vec<Column> {
        let inner = self.inner.lock();
        let mut columns: Vec<Column> = inner
            .columns
            .values()
            .filter(|c| c.table == table)
            .cloned()
            .collect();
        columns.sort_by(|a, b| a.name.cmp(&b.name));
        columns
    }

    pub fn column(&self, key: &ColumnKey) -> Option<Column> {
        self.inner.lock().columns.get(key).cloned()
    }

    pub fn column_count(&self) -> usize {
        self.inner.lock().columns.len()
    }

    pub fn update_column_stats(
        &self,
        key: &ColumnKey,
        update: ColumnStatsUpdate,
    ) -> Result<(), CatalogError> {
        let mut inner = self.inner.lock();
        let Some(column) = inner.columns.get_mut(key) else {
            return Err(CatalogError::NotFound {
                resource_type: ResourceType::Column,
                resource_id: format!("{}.{}", key.table, key.abs_name),
            });
        };
        if let Some(count) = update.count {
            column.count = Some(count);
        }
        if let Some(cardinality) = update.cardinality {
            column.cardinality = Some(cardinality);
        }
        if let Some(partitions) = update.partitions {
            column.partitions = Some(partitions);
        }
        if let Some(domain) = update.domain {
            column.domain = Some(domain);
        }
        if update.clear_partitions {
            column.partitions = None;
        }
        if update.clear_domain {
            column.domain = None;
        }
        column.last_updated = Some(update.last_updated);
        Ok(())
    }

    /// Non-structural columns whose statistics are missing or older than the
    /// staleness window, as input to an idle rescan.
    pub fn stale_columns(&self, now_micros: u64, staleness: Duration) -> Vec<ColumnKey> {
        let cutoff = now_micros.saturating_sub(staleness.as_micros() as u64);
        let inner = self.inner.lock();
        inner
            .columns
            .values()
            .filter(|c| !c.column_type.is_structural())
            .filter(|c| c.last_updated.is_none_or(|at| at < cutoff))
            .map(Column::key)
            .collect()
    }

    pub fn set_bootstrap_failure(&self, message: String) {
        let mut slot = self.bootstrap_failure.lock();
        if slot.is_none() {
            *slot = Some(message);
        }
    }

    pub fn bootstrap_failure(&self) -> Option<String> {
        self.bootstrap_failure.lock().clone()
    }

    pub fn ready_gate(&self) -> &Arc<ReadinessGate> {
        &self.ready
    }
}

pub(crate) fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}
