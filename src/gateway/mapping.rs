use crate::catalog::column::{Column, ColumnType};
use crate::error::CatalogError;
use serde_json::Value;

/// Walks an index's field-mapping `properties` tree into Column records for
/// `table`.
///
/// `abs_name` is the full dotted path from the table root. `name` is the
/// path relative to the innermost nested scope. `nested_path` lists the
/// nested ancestor scopes, deepest first. Object and nested containers
/// appear as columns themselves; field kinds the catalog does not track are
/// skipped.
pub fn parse_properties(table: &str, properties: &Value) -> Result<Vec<Column>, CatalogError> {
    let Some(fields) = properties.as_object() else {
        return Err(CatalogError::Decode(format!(
            "mapping properties for '{table}' is not an object"
        )));
    };
    let mut columns = Vec::new();
    walk(table, fields, "", &[], &mut columns)?;
    Ok(columns)
}

fn walk(
    table: &str,
    fields: &serde_json::Map<String, Value>,
    prefix: &str,
    nested_scopes: &[String],
    out: &mut Vec<Column>,
) -> Result<(), CatalogError> {
    for (field_name, definition) in fields {
        let abs_name = join_path(prefix, field_name);
        let kind = mapping_type(definition);
        let Some(column_type) = kind.as_deref().and_then(ColumnType::from_mapping_type) else {
            continue;
        };

        out.push(build_column(table, &abs_name, column_type, nested_scopes)?);

        // Multi-fields: sub-fields indexed alongside the parent, addressed
        // as `parent.sub` within the same nesting scope.
        if let Some(sub_fields) = definition.get("fields").and_then(Value::as_object) {
            for (sub_name, sub_definition) in sub_fields {
                let sub_abs = join_path(&abs_name, sub_name);
                let Some(sub_type) = mapping_type(sub_definition)
                    .as_deref()
                    .and_then(ColumnType::from_mapping_type)
                else {
                    continue;
                };
                out.push(build_column(table, &sub_abs, sub_type, nested_scopes)?);
            }
        }

        if let Some(children) = definition.get("properties").and_then(Value::as_object) {
            if column_type == ColumnType::Nested {
                let mut child_scopes = Vec::with_capacity(nested_scopes.len() + 1);
                child_scopes.push(abs_name.clone());
                child_scopes.extend_from_slice(nested_scopes);
                walk(table, children, &abs_name, &child_scopes, out)?;
            } else {
                walk(table, children, &abs_name, nested_scopes, out)?;
            }
        }
    }
    Ok(())
}

fn build_column(
    table: &str,
    abs_name: &str,
    column_type: ColumnType,
    nested_scopes: &[String],
) -> Result<Column, CatalogError> {
    let name = match nested_scopes.first() {
        Some(scope) => abs_name
            .strip_prefix(scope.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(abs_name)
            .to_string(),
        None => abs_name.to_string(),
    };
    let mut column = Column::new(table, abs_name, name, column_type)?;
    column.nested_path = nested_scopes.to_vec();
    Ok(column)
}

fn mapping_type(definition: &Value) -> Option<String> {
    match definition.get("type").and_then(Value::as_str) {
        Some(kind) => Some(kind.to_string()),
        // A bare container with properties and no type is an object.
        None if definition.get("properties").is_some() => Some("object".to_string()),
        None => None,
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
