use crate::catalog::column::ScalarValue;
use crate::error::CatalogError;
use crate::gateway::{
    AggregationResult, AggregationSpec, AggregationValue, BackendGateway, IndexMapping,
};
use serde_json::{Value, json};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Blocking HTTP implementation of [`BackendGateway`] against the backend's
/// REST API: cluster metadata for discovery, `_search` with a single named
/// aggregation for statistics.
pub struct HttpGateway {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Result<Self, CatalogError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl BackendGateway for HttpGateway {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn discover_mappings(&self) -> Result<Vec<IndexMapping>, CatalogError> {
        let url = format!("{}/_cluster/state/metadata", self.base_url);
        let body: Value = self.client.get(&url).send()?.error_for_status()?.json()?;
        parse_cluster_metadata(&body)
    }

    fn aggregate(
        &self,
        table: &str,
        spec: &AggregationSpec,
    ) -> Result<AggregationResult, CatalogError> {
        let url = format!("{}/{}/_search", self.base_url, table);
        let response: Value = self
            .client
            .post(&url)
            .json(&search_body(spec))
            .send()?
            .error_for_status()?
            .json()?;
        parse_aggregation_response(spec, &response)
    }
}

/// The `_search` request for one statistics aggregation: no hits, one named
/// aggregation, nested-scoped when the column lives under a nested path.
pub fn search_body(spec: &AggregationSpec) -> Value {
    let agg = match spec {
        AggregationSpec::Cardinality {
            field,
            precision_threshold,
        } => json!({
            "cardinality": {"field": field, "precision_threshold": precision_threshold}
        }),
        AggregationSpec::NestedCardinality {
            path,
            field,
            precision_threshold,
        } => json!({
            "nested": {"path": path},
            "aggs": {"_nested": {
                "cardinality": {"field": field, "precision_threshold": precision_threshold}
            }}
        }),
        AggregationSpec::Terms { field, size } => json!({
            "terms": {"field": field, "size": size}
        }),
        AggregationSpec::NestedTerms { path, field, size } => json!({
            "nested": {"path": path},
            "aggs": {"_nested": {"terms": {"field": field, "size": size}}}
        }),
    };
    json!({"size": 0, "aggs": {"_stat": agg}})
}

/// Extracts every index's mapping, aliases, and creation order from a
/// cluster-metadata response.
pub fn parse_cluster_metadata(body: &Value) -> Result<Vec<IndexMapping>, CatalogError> {
    let indices = body
        .pointer("/metadata/indices")
        .and_then(Value::as_object)
        .ok_or_else(|| CatalogError::Decode("cluster metadata has no indices".into()))?;

    let mut mappings = Vec::with_capacity(indices.len());
    for (index, meta) in indices {
        mappings.push(IndexMapping {
            index: index.clone(),
            sort_key: creation_date(meta),
            aliases: alias_names(meta),
            properties: merged_properties(meta),
        });
    }
    Ok(mappings)
}

fn creation_date(meta: &Value) -> i64 {
    let raw = meta.pointer("/settings/index/creation_date");
    match raw {
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        _ => 0,
    }
}

fn alias_names(meta: &Value) -> Vec<String> {
    match meta.get("aliases") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

/// Folds all document types' `properties` trees into one. Later types
/// override same-named fields.
fn merged_properties(meta: &Value) -> Value {
    let mut merged = serde_json::Map::new();
    if let Some(types) = meta.get("mappings").and_then(Value::as_object) {
        for type_mapping in types.values() {
            if let Some(properties) = type_mapping.get("properties").and_then(Value::as_object) {
                for (field, definition) in properties {
                    merged.insert(field.clone(), definition.clone());
                }
            }
        }
    }
    Value::Object(merged)
}

/// Reads the named aggregation back out of a `_search` response, unwrapping
/// the inner nested aggregation when the request was nested-scoped.
pub fn parse_aggregation_response(
    spec: &AggregationSpec,
    response: &Value,
) -> Result<AggregationResult, CatalogError> {
    let doc_count = total_hits(response);
    let outer = response
        .pointer("/aggregations/_stat")
        .ok_or_else(|| {
            CatalogError::Decode("response has no '_stat' aggregation".into())
        })?;
    let agg = match spec {
        AggregationSpec::NestedCardinality { .. } | AggregationSpec::NestedTerms { .. } => outer
            .get("_nested")
            .ok_or_else(|| CatalogError::Decode("nested aggregation result missing".into()))?,
        _ => outer,
    };

    let value = match spec {
        AggregationSpec::Cardinality { .. } | AggregationSpec::NestedCardinality { .. } => {
            let value = agg
                .get("value")
                .and_then(Value::as_u64)
                .ok_or_else(|| CatalogError::Decode("cardinality value missing".into()))?;
            AggregationValue::Cardinality(value)
        }
        AggregationSpec::Terms { .. } | AggregationSpec::NestedTerms { .. } => {
            let buckets = agg
                .get("buckets")
                .and_then(Value::as_array)
                .ok_or_else(|| CatalogError::Decode("terms buckets missing".into()))?;
            let mut values = Vec::with_capacity(buckets.len());
            for bucket in buckets {
                let key = bucket
                    .get("key")
                    .and_then(ScalarValue::from_json)
                    .ok_or_else(|| CatalogError::Decode("terms bucket has no key".into()))?;
                values.push(key);
            }
            AggregationValue::Buckets(values)
        }
    };
    Ok(AggregationResult { doc_count, value })
}

fn total_hits(response: &Value) -> u64 {
    match response.pointer("/hits/total") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(total) => total.get("value").and_then(Value::as_u64).unwrap_or(0),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_aggregation_response, parse_cluster_metadata, search_body};
    use crate::catalog::column::ScalarValue;
    use crate::gateway::{AggregationSpec, AggregationValue};
    use serde_json::json;

    #[test]
    fn cardinality_body_carries_precision() {
        let body = search_body(&AggregationSpec::Cardinality {
            field: "status".into(),
            precision_threshold: 100,
        });
        assert_eq!(body["size"], 0);
        assert_eq!(
            body["aggs"]["_stat"]["cardinality"],
            json!({"field": "status", "precision_threshold": 100})
        );
    }

    #[test]
    fn nested_terms_body_scopes_to_the_path() {
        let body = search_body(&AggregationSpec::NestedTerms {
            path: "steps".into(),
            field: "steps.result".into(),
            size: 1000,
        });
        assert_eq!(body["aggs"]["_stat"]["nested"], json!({"path": "steps"}));
        assert_eq!(
            body["aggs"]["_stat"]["aggs"]["_nested"]["terms"],
            json!({"field": "steps.result", "size": 1000})
        );
    }

    #[test]
    fn parses_cluster_metadata_with_aliases_and_creation_dates() {
        let body = json!({"metadata": {"indices": {
            "logs_20160101": {
                "settings": {"index": {"creation_date": "1451606400000"}},
                "aliases": ["logs"],
                "mappings": {"doc": {"properties": {"message": {"type": "string"}}}}
            },
            "logs_20160201": {
                "settings": {"index": {"creation_date": "1454284800000"}},
                "aliases": {"logs": {}},
                "mappings": {"doc": {"properties": {"message": {"type": "keyword"}}}}
            }
        }}});
        let mut mappings = parse_cluster_metadata(&body).expect("parse");
        mappings.sort_by(|a, b| a.index.cmp(&b.index));
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].index, "logs_20160101");
        assert_eq!(mappings[0].sort_key, 1_451_606_400_000);
        assert_eq!(mappings[0].aliases, vec!["logs"]);
        assert_eq!(mappings[1].aliases, vec!["logs"]);
        assert!(mappings[1].sort_key > mappings[0].sort_key);
        assert_eq!(
            mappings[0].properties["message"],
            json!({"type": "string"})
        );
    }

    #[test]
    fn multiple_document_types_merge_into_one_tree() {
        let body = json!({"metadata": {"indices": {
            "logs": {"mappings": {
                "a": {"properties": {"x": {"type": "long"}}},
                "b": {"properties": {"y": {"type": "string"}}}
            }}
        }}});
        let mappings = parse_cluster_metadata(&body).expect("parse");
        assert_eq!(mappings[0].properties["x"], json!({"type": "long"}));
        assert_eq!(mappings[0].properties["y"], json!({"type": "string"}));
    }

    #[test]
    fn missing_indices_is_a_decode_error() {
        let err = parse_cluster_metadata(&json!({"metadata": {}})).expect_err("no indices");
        assert_eq!(err.code_str(), "decode");
    }

    #[test]
    fn parses_plain_cardinality_response() {
        let spec = AggregationSpec::Cardinality {
            field: "status".into(),
            precision_threshold: 100,
        };
        let response = json!({
            "hits": {"total": 1200},
            "aggregations": {"_stat": {"value": 7}}
        });
        let result = parse_aggregation_response(&spec, &response).expect("parse");
        assert_eq!(result.doc_count, 1200);
        assert_eq!(result.value, AggregationValue::Cardinality(7));
    }

    #[test]
    fn parses_nested_cardinality_response() {
        let spec = AggregationSpec::NestedCardinality {
            path: "steps".into(),
            field: "steps.result".into(),
            precision_threshold: 10,
        };
        let response = json!({
            "hits": {"total": {"value": 90}},
            "aggregations": {"_stat": {"doc_count": 450, "_nested": {"value": 4}}}
        });
        let result = parse_aggregation_response(&spec, &response).expect("parse");
        assert_eq!(result.doc_count, 90);
        assert_eq!(result.value, AggregationValue::Cardinality(4));
    }

    #[test]
    fn parses_terms_buckets_of_mixed_scalars() {
        let spec = AggregationSpec::Terms {
            field: "status".into(),
            size: 1000,
        };
        let response = json!({
            "hits": {"total": 10},
            "aggregations": {"_stat": {"buckets": [
                {"key": "ok", "doc_count": 6},
                {"key": 500, "doc_count": 4}
            ]}}
        });
        let result = parse_aggregation_response(&spec, &response).expect("parse");
        assert_eq!(
            result.value,
            AggregationValue::Buckets(vec![
                ScalarValue::Text("ok".into()),
                ScalarValue::Long(500)
            ])
        );
    }

    #[test]
    fn malformed_aggregation_shape_is_a_decode_error() {
        let spec = AggregationSpec::Terms {
            field: "status".into(),
            size: 1000,
        };
        let response = json!({"hits": {"total": 10}, "aggregations": {"_stat": {"value": 3}}});
        let err = parse_aggregation_response(&spec, &response).expect_err("wrong shape");
        assert_eq!(err.code_str(), "decode");
    }
}
