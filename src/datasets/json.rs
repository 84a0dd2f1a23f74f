use serde_json::{Map, Value};
use tracing::warn;

/// Why a JSON document could not be read as a table
#[derive(Debug, thiserror::Error)]
pub enum JsonTableError {
    #[error(transparent)]
    Syntax(#[from] serde_json::Error),

    #[error("expected an array of records")]
    NotAnArray,

    #[error("record {0} is not an object")]
    NotAnObject(usize),
}

/// Read an array of flat objects into headers and string rows.
///
/// Columns appear in the order their keys are first seen. Missing keys and
/// nulls become empty cells.
pub fn parse_records(text: &str) -> Result<(Vec<String>, Vec<Vec<String>>), JsonTableError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(items) = value else {
        return Err(JsonTableError::NotAnArray);
    };

    let mut objects = Vec::with_capacity(items.len());
    let mut headers: Vec<String> = Vec::new();

    for (idx, item) in items.into_iter().enumerate() {
        let Value::Object(object) = item else {
            return Err(JsonTableError::NotAnObject(idx));
        };
        for key in object.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
        objects.push(object);
    }

    let rows = objects
        .iter()
        .map(|object| {
            headers
                .iter()
                .map(|h| object.get(h).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    Ok((headers, rows))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Serialize rows as an array of objects keyed by header, values kept as strings.
///
/// Every cell gets its own key: a repeated header becomes `Name.1`, `Name.2`,
/// and a cell past the last header becomes `Unnamed: <column>`.
pub fn to_json_string(headers: &[String], rows: &[Vec<String>]) -> serde_json::Result<String> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let keys = record_keys(headers, width);

    let records: Vec<Value> = rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = keys
                .iter()
                .zip(row.iter())
                .map(|(k, cell)| (k.clone(), Value::String(cell.clone())))
                .collect();
            Value::Object(object)
        })
        .collect();

    serde_json::to_string_pretty(&records)
}

/// One distinct key per column, for `width` columns or the header count if larger
fn record_keys(headers: &[String], width: usize) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(width.max(headers.len()));

    for header in headers {
        let key = if keys.contains(header) {
            let renamed = next_free(&keys, headers, header);
            warn!("Duplicate column '{}' written as '{}'", header, renamed);
            renamed
        } else {
            header.clone()
        };
        keys.push(key);
    }

    if width > headers.len() {
        warn!(
            "{} columns beyond the {} headers written under 'Unnamed' keys",
            width - headers.len(),
            headers.len()
        );
        for idx in headers.len()..width {
            let key = format!("Unnamed: {}", idx);
            let key = if keys.contains(&key) || headers.contains(&key) {
                next_free(&keys, headers, &key)
            } else {
                key
            };
            keys.push(key);
        }
    }

    keys
}

fn next_free(taken: &[String], headers: &[String], base: &str) -> String {
    (1..)
        .map(|n| format!("{}.{}", base, n))
        .find(|candidate| !taken.contains(candidate) && !headers.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}
