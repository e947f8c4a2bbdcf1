pub mod cached;
pub mod http;
pub mod mapping;

use crate::catalog::column::ScalarValue;
use crate::error::CatalogError;
use serde::{Deserialize, Serialize};

/// One concrete index as reported by mapping discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMapping {
    pub index: String,
    /// Backend-provided ordering key (creation order); higher is newer. Used
    /// to attribute an alias shared by several indices to the newest one.
    pub sort_key: i64,
    pub aliases: Vec<String>,
    /// The index's field-mapping `properties` tree, verbatim.
    pub properties: serde_json::Value,
}

/// The aggregation requests the catalog issues. Columns under a nested scope
/// use the nested-scoped variants so the backend counts within that scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationSpec {
    Cardinality {
        field: String,
        precision_threshold: u32,
    },
    NestedCardinality {
        path: String,
        field: String,
        precision_threshold: u32,
    },
    Terms {
        field: String,
        size: u64,
    },
    NestedTerms {
        path: String,
        field: String,
        size: u64,
    },
}

impl AggregationSpec {
    pub fn field(&self) -> &str {
        match self {
            AggregationSpec::Cardinality { field, .. }
            | AggregationSpec::NestedCardinality { field, .. }
            | AggregationSpec::Terms { field, .. }
            | AggregationSpec::NestedTerms { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregationValue {
    Cardinality(u64),
    Buckets(Vec<ScalarValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    /// Documents the aggregation ran over.
    pub doc_count: u64,
    pub value: AggregationValue,
}

/// The two capabilities the catalog needs from the index backend: describe
/// every table's field mappings, and run a single aggregation.
pub trait BackendGateway: Send + Sync {
    fn base_url(&self) -> &str;

    fn discover_mappings(&self) -> Result<Vec<IndexMapping>, CatalogError>;

    fn aggregate(
        &self,
        table: &str,
        spec: &AggregationSpec,
    ) -> Result<AggregationResult, CatalogError>;
}
