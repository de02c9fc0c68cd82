use crate::schema::Schema;
use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

mod entities;

pub use entities::{FieldKind, FieldValue, ID_FIELD, Record};

/// Errors raised while turning a record file into records
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read record file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse JSON at {location}: {source}")]
    Json {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to parse JSON5 in '{path}': {message}")]
    Json5 { path: String, message: String },
    #[error("{location}: expected a JSON array of records")]
    NotAnArray { location: String },
    #[error("{location}: expected a JSON object")]
    NotAnObject { location: String },
    #[error("{location}: record has no usable 'id' field")]
    MissingId { location: String },
    #[error("Duplicate record id '{0}'")]
    DuplicateId(String),
    #[error("Record '{id}': field '{field}' should be {expected}, found {found}")]
    FieldType {
        id: String,
        field: String,
        expected: FieldKind,
        found: String,
    },
    #[error("Record '{id}': field '{field}' holds a nested value")]
    NestedValue { id: String, field: String },
}

/// Parse a calendar date from `YYYY-MM-DD` or an RFC 3339 timestamp
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// Loads a record file, picking the format from the file extension
///
/// `.json5` files go through `json5`, `.jsonl` / `.ndjson` files hold one
/// object per line, everything else is a JSON array of objects.
pub fn load_records(path: impl AsRef<Path>, schema: &Schema) -> Result<Vec<Record>, LoadError> {
    let path = path.as_ref();
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path_display.clone(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "jsonl" | "ndjson" => parse_json_lines(&raw, &path_display, schema),
        "json5" => {
            let value =
                json5::from_str::<Value>(&raw).map_err(|e| LoadError::Json5 {
                    path: path_display.clone(),
                    message: e.to_string(),
                })?;
            parse_record_array(&value, &path_display, schema)
        }
        _ => {
            let value = serde_json::from_str::<Value>(&raw).map_err(|source| LoadError::Json {
                location: path_display.clone(),
                source,
            })?;
            parse_record_array(&value, &path_display, schema)
        }
    }
}

/// Identity used for the duplicate check: `1` and `"1"` are different ids
fn id_key(record: &Record) -> (Option<FieldKind>, String) {
    (
        record.get(ID_FIELD).map(FieldValue::kind),
        record.id().to_string(),
    )
}

/// Parses a JSON array of record objects
pub fn parse_record_array(
    value: &Value,
    source_name: &str,
    schema: &Schema,
) -> Result<Vec<Record>, LoadError> {
    let items = value.as_array().ok_or_else(|| LoadError::NotAnArray {
        location: source_name.to_string(),
    })?;

    let mut records = Vec::with_capacity(items.len());
    let mut seen = HashSet::new();
    for (idx, item) in items.iter().enumerate() {
        let location = format!("{source_name}[{idx}]");
        let record = parse_record(item, &location, schema)?;
        if !seen.insert(id_key(&record)) {
            return Err(LoadError::DuplicateId(record.id().to_string()));
        }
        records.push(record);
    }

    Ok(records)
}

fn parse_json_lines(raw: &str, source_name: &str, schema: &Schema) -> Result<Vec<Record>, LoadError> {
    let mut records = Vec::new();
    let mut seen = HashSet::new();

    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let location = format!("{source_name}:{}", idx + 1);
        let value = serde_json::from_str::<Value>(line).map_err(|source| LoadError::Json {
            location: location.clone(),
            source,
        })?;
        let record = parse_record(&value, &location, schema)?;
        if !seen.insert(id_key(&record)) {
            return Err(LoadError::DuplicateId(record.id().to_string()));
        }
        records.push(record);
    }

    Ok(records)
}

/// Parses one JSON object into a record, coercing fields to their declared kinds
pub fn parse_record(value: &Value, location: &str, schema: &Schema) -> Result<Record, LoadError> {
    let object = value.as_object().ok_or_else(|| LoadError::NotAnObject {
        location: location.to_string(),
    })?;

    let mut record = Record::with_id_value(extract_id(object, location)?);
    let id = record.id().to_string();

    for (field, raw) in object {
        if field == ID_FIELD {
            continue;
        }
        if let Some(value) = convert_value(&id, field, raw, schema.kind_of(field))? {
            record.set(field.as_str(), value);
        }
    }

    Ok(record)
}

fn extract_id(object: &Map<String, Value>, location: &str) -> Result<FieldValue, LoadError> {
    match object.get(ID_FIELD) {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(FieldValue::Text(id.clone())),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(FieldValue::Number)
            .ok_or_else(|| LoadError::MissingId {
                location: location.to_string(),
            }),
        _ => Err(LoadError::MissingId {
            location: location.to_string(),
        }),
    }
}

fn describe_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("\"{s}\""),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Convert a raw JSON value; `None` means the field is absent (JSON null)
fn convert_value(
    id: &str,
    field: &str,
    raw: &Value,
    kind: Option<FieldKind>,
) -> Result<Option<FieldValue>, LoadError> {
    let type_error = |expected: FieldKind| LoadError::FieldType {
        id: id.to_string(),
        field: field.to_string(),
        expected,
        found: describe_json(raw),
    };
    let nested_error = || LoadError::NestedValue {
        id: id.to_string(),
        field: field.to_string(),
    };

    match raw {
        Value::Null => return Ok(None),
        Value::Object(_) => return Err(nested_error()),
        _ => {}
    }

    let value = match kind {
        Some(FieldKind::Text) => scalar_to_string(raw)
            .map(FieldValue::Text)
            .ok_or_else(|| type_error(FieldKind::Text))?,
        Some(FieldKind::Number) => match raw {
            Value::Number(n) => n
                .as_f64()
                .map(FieldValue::Number)
                .ok_or_else(|| type_error(FieldKind::Number))?,
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(FieldValue::Number)
                .map_err(|_| type_error(FieldKind::Number))?,
            _ => return Err(type_error(FieldKind::Number)),
        },
        Some(FieldKind::Date) => match raw {
            Value::String(s) => parse_date(s.trim())
                .map(FieldValue::Date)
                .ok_or_else(|| type_error(FieldKind::Date))?,
            _ => return Err(type_error(FieldKind::Date)),
        },
        Some(FieldKind::List) => match raw {
            Value::Array(items) => FieldValue::List(
                items
                    .iter()
                    .map(|item| scalar_to_string(item).ok_or_else(nested_error))
                    .collect::<Result<_, _>>()?,
            ),
            _ => return Err(type_error(FieldKind::List)),
        },
        None => match raw {
            Value::String(s) => match parse_date(s) {
                Some(date) => FieldValue::Date(date),
                None => FieldValue::Text(s.clone()),
            },
            Value::Number(n) => n
                .as_f64()
                .map(FieldValue::Number)
                .ok_or_else(|| type_error(FieldKind::Number))?,
            Value::Bool(b) => FieldValue::Text(b.to_string()),
            Value::Array(items) => FieldValue::List(
                items
                    .iter()
                    .map(|item| scalar_to_string(item).ok_or_else(nested_error))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Null | Value::Object(_) => return Err(nested_error()),
        },
    };

    Ok(Some(value))
}
