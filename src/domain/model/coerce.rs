//! Server-side coercion of JSON payload values to declared column types.
//!
//! Clients send loosely typed JSON (e.g. `"1440"` for an int); values are
//! normalised here so both stores see the same canonical shapes.

use crate::domain::model::{ColumnType, FieldError, JsonMap, MarketplaceModel};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

pub fn json_kind(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::String(_) => "string",
        JsonValue::Number(_) => "number",
        JsonValue::Bool(_) => "bool",
        JsonValue::Null => "null",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Canonical RFC 3339 form used for every stored timestamp.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn coerce_scalar_for_type(expected: ColumnType, v: &JsonValue) -> Result<JsonValue, String> {
    if v.is_null() {
        return Ok(JsonValue::Null);
    }
    match expected {
        ColumnType::Int => {
            let n = if let Some(n) = v.as_i64() {
                n
            } else if let Some(s) = v.as_str() {
                s.trim().parse::<i64>().map_err(|_| "expected int".to_string())?
            } else {
                return Err("expected int".to_string());
            };
            if n < i32::MIN as i64 || n > i32::MAX as i64 {
                return Err(format!("out of range for int: {}", n));
            }
            Ok(JsonValue::from(n))
        }
        ColumnType::BigInt => {
            if let Some(n) = v.as_i64() {
                return Ok(JsonValue::from(n));
            }
            if let Some(s) = v.as_str() {
                let parsed = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| "expected bigint".to_string())?;
                return Ok(JsonValue::from(parsed));
            }
            Err("expected bigint".to_string())
        }
        ColumnType::Float => {
            let f = if let Some(f) = v.as_f64() {
                f
            } else if let Some(s) = v.as_str() {
                s.trim()
                    .parse::<f64>()
                    .map_err(|_| "expected number".to_string())?
            } else {
                return Err("expected number".to_string());
            };
            serde_json::Number::from_f64(f)
                .map(JsonValue::Number)
                .ok_or_else(|| "expected finite number".to_string())
        }
        ColumnType::Bool => {
            if let Some(b) = v.as_bool() {
                return Ok(JsonValue::from(b));
            }
            if let Some(s) = v.as_str() {
                let lc = s.trim().to_lowercase();
                return match lc.as_str() {
                    "true" | "t" | "1" => Ok(JsonValue::from(true)),
                    "false" | "f" | "0" => Ok(JsonValue::from(false)),
                    _ => Err("expected bool".to_string()),
                };
            }
            Err("expected bool".to_string())
        }
        ColumnType::Uuid => {
            let s = v.as_str().ok_or_else(|| "expected uuid string".to_string())?;
            let id = Uuid::parse_str(s.trim()).map_err(|_| "expected uuid string".to_string())?;
            Ok(JsonValue::from(id.to_string()))
        }
        ColumnType::Timestamptz => {
            let s = v
                .as_str()
                .ok_or_else(|| "expected timestamp string".to_string())?;
            let ts = DateTime::parse_from_rfc3339(s.trim())
                .map_err(|_| "expected RFC3339 timestamp".to_string())?;
            Ok(JsonValue::from(format_timestamp(ts.with_timezone(&Utc))))
        }
        ColumnType::Jsonb => Ok(v.clone()),
        ColumnType::Text => {
            match v {
                JsonValue::String(s) => Ok(JsonValue::from(s.as_str())),
                JsonValue::Number(_) | JsonValue::Bool(_) => Ok(JsonValue::from(v.to_string())),
                _ => Err("expected text".to_string()),
            }
        }
    }
}

/// Coerces every field of `record`; unknown columns and failed coercions
/// are all collected before returning.
pub fn coerce_record(model: &dyn MarketplaceModel, record: &JsonMap) -> Result<JsonMap, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut out = JsonMap::new();
    for (k, v) in record {
        let Some(expected) = model.column_type(k) else {
            errors.push(FieldError::new(k, "known column", "unknown column", v.clone()));
            continue;
        };
        match coerce_scalar_for_type(expected, v) {
            Ok(cv) => {
                out.insert(k.clone(), cv);
            }
            Err(msg) => errors.push(FieldError::new(k, msg, json_kind(v), v.clone())),
        }
    }
    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}
