use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Table,
    Column,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Table => write!(f, "table"),
            ResourceType::Column => write!(f, "column"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogErrorCode {
    Io,
    Discovery,
    StatAggregation,
    TableNotFound,
    ColumnNotFound,
    Backend,
    Decode,
    Validation,
    InvalidConfig,
}

impl CatalogErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogErrorCode::Io => "io",
            CatalogErrorCode::Discovery => "discovery",
            CatalogErrorCode::StatAggregation => "stat_aggregation",
            CatalogErrorCode::TableNotFound => "table_not_found",
            CatalogErrorCode::ColumnNotFound => "column_not_found",
            CatalogErrorCode::Backend => "backend",
            CatalogErrorCode::Decode => "decode",
            CatalogErrorCode::Validation => "validation",
            CatalogErrorCode::InvalidConfig => "invalid_config",
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Mapping discovery failed during the first catalog pull. Fatal to
    /// catalog readiness; surfaced to startup via `wait_until_ready`.
    #[error("mapping discovery failed: {0}")]
    Discovery(String),
    /// A single column's cardinality/terms aggregation failed. Non-fatal;
    /// the column keeps its prior statistics until the next staleness pass.
    #[error("statistics aggregation failed for {table}.{column}: {message}")]
    StatAggregation {
        table: String,
        column: String,
        message: String,
    },
    #[error("{resource_type} '{resource_id}' not found")]
    NotFound {
        resource_type: ResourceType,
        resource_id: String,
    },
    #[error("backend request failed: {0}")]
    Backend(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("invalid config: {message}")]
    InvalidConfig { message: String },
}

impl CatalogError {
    pub fn code(&self) -> CatalogErrorCode {
        match self {
            CatalogError::Io(_) => CatalogErrorCode::Io,
            CatalogError::Discovery(_) => CatalogErrorCode::Discovery,
            CatalogError::StatAggregation { .. } => CatalogErrorCode::StatAggregation,
            CatalogError::NotFound { resource_type, .. } => match resource_type {
                ResourceType::Table => CatalogErrorCode::TableNotFound,
                ResourceType::Column => CatalogErrorCode::ColumnNotFound,
            },
            CatalogError::Backend(_) => CatalogErrorCode::Backend,
            CatalogError::Decode(_) => CatalogErrorCode::Decode,
            CatalogError::Validation(_) => CatalogErrorCode::Validation,
            CatalogError::InvalidConfig { .. } => CatalogErrorCode::InvalidConfig,
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code().as_str()
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogError, CatalogErrorCode, ResourceType};

    #[test]
    fn error_code_strings_are_stable() {
        assert_eq!(CatalogErrorCode::Discovery.as_str(), "discovery");
        assert_eq!(
            CatalogErrorCode::StatAggregation.as_str(),
            "stat_aggregation"
        );
        assert_eq!(CatalogErrorCode::TableNotFound.as_str(), "table_not_found");
        assert_eq!(CatalogErrorCode::InvalidConfig.as_str(), "invalid_config");
    }

    #[test]
    fn error_code_str_matches_variant_mapping() {
        let err = CatalogError::NotFound {
            resource_type: ResourceType::Table,
            resource_id: "unittest".into(),
        };
        assert_eq!(err.code(), CatalogErrorCode::TableNotFound);
        assert_eq!(err.code_str(), "table_not_found");

        let err = CatalogError::NotFound {
            resource_type: ResourceType::Column,
            resource_id: "unittest.f".into(),
        };
        assert_eq!(err.code_str(), "column_not_found");
    }

    #[test]
    fn aggregation_failure_formats_column_path() {
        let err = CatalogError::StatAggregation {
            table: "logs".into(),
            column: "build.revision".into(),
            message: "timeout".into(),
        };
        assert_eq!(
            err.to_string(),
            "statistics aggregation failed for logs.build.revision: timeout"
        );
    }
}
