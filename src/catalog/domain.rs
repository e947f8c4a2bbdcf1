use crate::catalog::column::{ColumnType, ScalarValue};
use crate::config::CatalogConfig;
use serde::{Deserialize, Serialize};

/// Classification of a column's value space, consumed by grouping and
/// faceting logic downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Domain {
    /// Not yet classified.
    Default,
    /// Too many distinct values to enumerate; effectively every value is
    /// distinct.
    Unique,
    /// A continuous numeric range, not enumerated.
    Numeric,
    /// A finite, sorted list of observed values.
    SimpleSet { partitions: Vec<ScalarValue> },
}

impl Domain {
    pub fn kind(&self) -> &'static str {
        match self {
            Domain::Default => "default",
            Domain::Unique => "unique",
            Domain::Numeric => "numeric",
            Domain::SimpleSet { .. } => "set",
        }
    }
}

/// Outcome of the classification decision, before any enumeration query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainClass {
    Unique,
    Numeric,
    /// Few enough distinct values to enumerate into a SimpleSet.
    Enumerable,
}

/// Decides how a leaf column's value space should be described, given its
/// type and measured cardinality.
///
/// Boundary semantics are deliberate: a cardinality exactly at a threshold
/// takes the lower bucket, so 30 still enumerates and 1000 is not yet
/// Unique. Structural columns have no value space and may not be classified.
pub fn classify(column_type: ColumnType, cardinality: u64, config: &CatalogConfig) -> DomainClass {
    assert!(
        !column_type.is_structural(),
        "structural column type {column_type} has no value domain"
    );
    if cardinality > config.unique_threshold {
        DomainClass::Unique
    } else if column_type.is_numeric() && cardinality > config.numeric_enumeration_threshold {
        DomainClass::Numeric
    } else {
        DomainClass::Enumerable
    }
}

#[cfg(test)]
mod tests {
    use super::{Domain, DomainClass, classify};
    use crate::catalog::column::{ColumnType, ScalarValue};
    use crate::config::CatalogConfig;

    fn config() -> CatalogConfig {
        CatalogConfig::default()
    }

    #[test]
    fn high_cardinality_is_unique_regardless_of_type() {
        assert_eq!(
            classify(ColumnType::Text, 1001, &config()),
            DomainClass::Unique
        );
        assert_eq!(
            classify(ColumnType::Long, 2000, &config()),
            DomainClass::Unique
        );
    }

    #[test]
    fn numeric_band_between_thresholds() {
        assert_eq!(
            classify(ColumnType::Long, 31, &config()),
            DomainClass::Numeric
        );
        assert_eq!(
            classify(ColumnType::Double, 1000, &config()),
            DomainClass::Numeric
        );
    }

    #[test]
    fn threshold_boundaries_take_the_lower_bucket() {
        // 30 distinct numeric values still enumerate; 1000 is not yet unique.
        assert_eq!(
            classify(ColumnType::Long, 30, &config()),
            DomainClass::Enumerable
        );
        assert_eq!(
            classify(ColumnType::Text, 1000, &config()),
            DomainClass::Enumerable
        );
    }

    #[test]
    fn non_numeric_types_enumerate_up_to_the_unique_threshold() {
        assert_eq!(
            classify(ColumnType::Text, 500, &config()),
            DomainClass::Enumerable
        );
        assert_eq!(
            classify(ColumnType::Boolean, 2, &config()),
            DomainClass::Enumerable
        );
        assert_eq!(
            classify(ColumnType::Date, 400, &config()),
            DomainClass::Enumerable
        );
    }

    #[test]
    #[should_panic(expected = "no value domain")]
    fn structural_columns_cannot_be_classified() {
        classify(ColumnType::Nested, 1, &config());
    }

    #[test]
    fn domain_kind_labels() {
        assert_eq!(Domain::Default.kind(), "default");
        assert_eq!(
            Domain::SimpleSet {
                partitions: vec![ScalarValue::Text("a".into())]
            }
            .kind(),
            "set"
        );
    }
}
