use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const META_TABLES: &str = "meta.tables";
pub const META_COLUMNS: &str = "meta.columns";

/// Field kinds reported by the backend's mapping, plus the structural
/// container kinds that never carry value statistics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Long,
    Integer,
    Double,
    Float,
    Boolean,
    Date,
    Object,
    Nested,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ColumnType::Long | ColumnType::Integer | ColumnType::Double | ColumnType::Float
        )
    }

    pub fn is_structural(self) -> bool {
        matches!(self, ColumnType::Object | ColumnType::Nested)
    }

    /// Maps a backend mapping `type` string. Returns `None` for field kinds
    /// the catalog does not track (geo shapes, completion suggesters, ...).
    pub fn from_mapping_type(kind: &str) -> Option<Self> {
        match kind {
            "string" | "keyword" | "text" => Some(ColumnType::Text),
            "long" => Some(ColumnType::Long),
            "integer" | "short" | "byte" => Some(ColumnType::Integer),
            "double" => Some(ColumnType::Double),
            "float" | "half_float" => Some(ColumnType::Float),
            "boolean" => Some(ColumnType::Boolean),
            "date" => Some(ColumnType::Date),
            "object" => Some(ColumnType::Object),
            "nested" => Some(ColumnType::Nested),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Text => "string",
            ColumnType::Long => "long",
            ColumnType::Integer => "integer",
            ColumnType::Double => "double",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Object => "object",
            ColumnType::Nested => "nested",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single observed partition value. Carries a total order so enumerated
/// partitions sort deterministically across kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScalarValue {
    Bool(bool),
    Long(i64),
    Double(f64),
    Text(String),
}

impl ScalarValue {
    fn kind_rank(&self) -> u8 {
        match self {
            ScalarValue::Bool(_) => 0,
            ScalarValue::Long(_) => 1,
            ScalarValue::Double(_) => 2,
            ScalarValue::Text(_) => 3,
        }
    }

    /// Converts a bucket key from an aggregation response.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(ScalarValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(ScalarValue::Long(i))
                } else {
                    n.as_f64().map(ScalarValue::Double)
                }
            }
            serde_json::Value::String(s) => Some(ScalarValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScalarValue {}

impl PartialOrd for ScalarValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScalarValue {
    fn cmp(&self, other: &Self) -> Ordering {
        let rank_cmp = self.kind_rank().cmp(&other.kind_rank());
        if rank_cmp != Ordering::Equal {
            return rank_cmp;
        }
        match (self, other) {
            (ScalarValue::Bool(a), ScalarValue::Bool(b)) => a.cmp(b),
            (ScalarValue::Long(a), ScalarValue::Long(b)) => a.cmp(b),
            (ScalarValue::Double(a), ScalarValue::Double(b)) => a.total_cmp(b),
            (ScalarValue::Text(a), ScalarValue::Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// A named dataset in the backend. `query_path` roots nested sub-object
/// tables; `None` for top-level indices and aliases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub url: String,
    pub query_path: Option<String>,
}

/// Identifies a Column within the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub table: String,
    pub abs_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    /// Name relative to the column's nesting level.
    pub name: String,
    /// Fully-qualified dotted path from the table root.
    pub abs_name: String,
    pub table: String,
    pub column_type: ColumnType,
    /// Ancestor nested scopes, deepest first. Empty for top-level fields.
    pub nested_path: Vec<String>,
    /// Name relative to the owning table's `query_path`.
    pub relative: Option<String>,
    pub domain: Option<crate::catalog::domain::Domain>,
    pub count: Option<u64>,
    pub cardinality: Option<u64>,
    pub partitions: Option<Vec<ScalarValue>>,
    /// Epoch micros of the last completed statistics pass.
    pub last_updated: Option<u64>,
}

impl Column {
    pub fn new(
        table: impl Into<String>,
        abs_name: impl Into<String>,
        name: impl Into<String>,
        column_type: ColumnType,
    ) -> Result<Self, CatalogError> {
        let table = table.into();
        let abs_name = abs_name.into();
        let name = name.into();
        if table.is_empty() {
            return Err(CatalogError::Validation("column requires a table".into()));
        }
        if abs_name.is_empty() || name.is_empty() {
            return Err(CatalogError::Validation("column requires a name".into()));
        }
        Ok(Self {
            relative: Some(abs_name.clone()),
            name,
            abs_name,
            table,
            column_type,
            nested_path: Vec::new(),
            domain: None,
            count: None,
            cardinality: None,
            partitions: None,
            last_updated: None,
        })
    }

    pub fn key(&self) -> ColumnKey {
        ColumnKey {
            table: self.table.clone(),
            abs_name: self.abs_name.clone(),
        }
    }

    /// The same mapping attributes attributed to another table (used when an
    /// alias inherits its backing index's columns).
    pub fn with_table(&self, table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..self.clone()
        }
    }
}

fn meta_column(table: &str, name: &str, column_type: ColumnType) -> Column {
    Column {
        name: name.to_string(),
        abs_name: name.to_string(),
        table: table.to_string(),
        column_type,
        nested_path: Vec::new(),
        relative: Some(name.to_string()),
        domain: None,
        count: None,
        cardinality: None,
        partitions: None,
        last_updated: None,
    }
}

/// Fixed schema of the `meta.tables` virtual table.
pub fn meta_tables_schema() -> Vec<Column> {
    ["name", "url", "query_path"]
        .iter()
        .map(|name| meta_column(META_TABLES, name, ColumnType::Text))
        .collect()
}

/// Fixed schema of the `meta.columns` virtual table.
pub fn meta_columns_schema() -> Vec<Column> {
    let strings = ["name", "type", "nested_path", "relative", "abs_name", "table"]
        .iter()
        .map(|name| meta_column(META_COLUMNS, name, ColumnType::Text));
    let objects = ["domain", "partitions"]
        .iter()
        .map(|name| meta_column(META_COLUMNS, name, ColumnType::Object));
    let longs = ["count", "cardinality", "last_updated"]
        .iter()
        .map(|name| meta_column(META_COLUMNS, name, ColumnType::Long));
    strings.chain(objects).chain(longs).collect()
}

/// The synthetic Table record for a virtual table name, if it is one.
pub fn meta_table_record(name: &str) -> Option<Table> {
    if name == META_TABLES || name == META_COLUMNS {
        Some(Table {
            name: name.to_string(),
            url: String::new(),
            query_path: None,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Column, ColumnType, META_COLUMNS, META_TABLES, ScalarValue, meta_columns_schema,
        meta_table_record, meta_tables_schema,
    };
    use proptest::prelude::*;

    fn arb_scalar() -> impl Strategy<Value = ScalarValue> {
        prop_oneof![
            any::<bool>().prop_map(ScalarValue::Bool),
            any::<i64>().prop_map(ScalarValue::Long),
            any::<f64>()
                .prop_filter("finite only", |v| v.is_finite())
                .prop_map(ScalarValue::Double),
            "\\PC{0,16}".prop_map(ScalarValue::Text),
        ]
    }

    proptest! {
        #[test]
        fn scalar_ordering_is_total_and_stable(mut values in prop::collection::vec(arb_scalar(), 0..24)) {
            values.sort();
            let once = values.clone();
            values.sort();
            prop_assert_eq!(once, values);
        }
    }

    #[test]
    fn numeric_and_structural_kinds() {
        assert!(ColumnType::Long.is_numeric());
        assert!(ColumnType::Float.is_numeric());
        assert!(!ColumnType::Text.is_numeric());
        assert!(ColumnType::Object.is_structural());
        assert!(ColumnType::Nested.is_structural());
        assert!(!ColumnType::Date.is_structural());
    }

    #[test]
    fn mapping_type_strings_round_trip_for_known_kinds() {
        assert_eq!(
            ColumnType::from_mapping_type("string"),
            Some(ColumnType::Text)
        );
        assert_eq!(
            ColumnType::from_mapping_type("nested"),
            Some(ColumnType::Nested)
        );
        assert_eq!(ColumnType::from_mapping_type("geo_point"), None);
    }

    #[test]
    fn constructor_rejects_empty_identifiers() {
        assert!(Column::new("", "f", "f", ColumnType::Text).is_err());
        assert!(Column::new("t", "", "", ColumnType::Text).is_err());
        let column = Column::new("t", "a.b", "b", ColumnType::Text).expect("valid column");
        assert_eq!(column.relative.as_deref(), Some("a.b"));
        assert!(column.last_updated.is_none());
    }

    #[test]
    fn meta_schemas_are_fixed() {
        let tables = meta_tables_schema();
        assert_eq!(tables.len(), 3);
        assert!(tables.iter().all(|c| c.table == META_TABLES));

        let columns = meta_columns_schema();
        assert_eq!(columns.len(), 11);
        assert!(columns.iter().all(|c| c.table == META_COLUMNS));
        assert!(
            columns
                .iter()
                .any(|c| c.name == "domain" && c.column_type == ColumnType::Object)
        );
        assert!(
            columns
                .iter()
                .any(|c| c.name == "cardinality" && c.column_type == ColumnType::Long)
        );

        assert!(meta_table_record(META_TABLES).is_some());
        assert!(meta_table_record("logs").is_none());
    }
}
