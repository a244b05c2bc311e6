use crate::domain::model::coerce::json_kind;
use crate::domain::model::{ColumnType, FieldError, JsonMap, MarketplaceModel};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
}

impl Column {
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self { name, col_type }
    }
}

/// A text column restricted to a fixed set of values (status, service type).
#[derive(Debug, Clone, Copy)]
pub struct EnumField {
    pub name: &'static str,
    pub values: &'static [&'static str],
    pub default: Option<&'static str>,
}

/// Statically declared table model.
#[derive(Debug)]
pub struct TableModel {
    pub table_name: &'static str,
    pub columns: &'static [Column],
    /// Fields that must be present and non-null on create.
    pub required: &'static [&'static str],
    pub enumerated: &'static [EnumField],
    pub non_negative: &'static [&'static str],
}

impl TableModel {
    fn check_enumerated(&self, payload: &JsonMap, errors: &mut Vec<FieldError>) {
        for field in self.enumerated {
            let Some(value) = payload.get(field.name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let ok = value
                .as_str()
                .map(|s| field.values.contains(&s))
                .unwrap_or(false);
            if !ok {
                errors.push(FieldError::new(
                    field.name,
                    format!("one of {}", field.values.join("|")),
                    json_kind(value),
                    value.clone(),
                ));
            }
        }
    }

    fn check_non_negative(&self, payload: &JsonMap, errors: &mut Vec<FieldError>) {
        for name in self.non_negative {
            if let Some(n) = payload.get(*name).and_then(JsonValue::as_f64) {
                if n < 0.0 {
                    errors.push(FieldError::new(
                        name,
                        "non-negative number",
                        "negative number",
                        JsonValue::from(n),
                    ));
                }
            }
        }
    }
}

impl MarketplaceModel for TableModel {
    fn table_name(&self) -> &str {
        self.table_name
    }

    fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.col_type)
    }

    fn apply_defaults(&self, payload: &mut JsonMap) {
        for field in self.enumerated {
            if let Some(default) = field.default {
                let absent = payload.get(field.name).map(JsonValue::is_null).unwrap_or(true);
                if absent {
                    payload.insert(field.name.to_string(), JsonValue::from(default));
                }
            }
        }
    }

    fn validate_create_payload(&self, payload: &JsonMap) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        for name in self.required {
            match payload.get(*name) {
                None => errors.push(FieldError::new(name, "present", "missing", JsonValue::Null)),
                Some(JsonValue::Null) => {
                    errors.push(FieldError::new(name, "non-null", "null", JsonValue::Null))
                }
                Some(_) => {}
            }
        }
        self.check_enumerated(payload, &mut errors);
        self.check_non_negative(payload, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_update_payload(&self, payload: &JsonMap) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        for name in self.required {
            if matches!(payload.get(*name), Some(JsonValue::Null)) {
                errors.push(FieldError::new(name, "non-null", "null", JsonValue::Null));
            }
        }
        // Defaulted enumerations are NOT NULL columns; clearing one is never valid.
        for field in self.enumerated {
            if field.default.is_some() && matches!(payload.get(field.name), Some(JsonValue::Null)) {
                errors.push(FieldError::new(
                    field.name,
                    format!("one of {}", field.values.join("|")),
                    "null",
                    JsonValue::Null,
                ));
            }
        }
        self.check_enumerated(payload, &mut errors);
        self.check_non_negative(payload, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
