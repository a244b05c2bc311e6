//! Domain model definitions for the marketplace tables.

use serde::Serialize;
use serde_json::Value as JsonValue;

pub mod catalog;
pub mod coerce;
pub mod registry;
pub mod table;

pub use coerce::{coerce_record, coerce_scalar_for_type};
pub use registry::{Permissions, ResourceRegistry, ResourceSpec, Scope};
pub use table::{Column, EnumField, TableModel};

pub type JsonMap = serde_json::Map<String, JsonValue>;

/// Column types the stores know how to bind and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Uuid,
    Text,
    Int,
    BigInt,
    Float,
    Bool,
    Timestamptz,
    Jsonb,
}

impl ColumnType {
    /// Postgres type name used in explicit `$n::type` casts.
    pub fn sql_cast(&self) -> &'static str {
        match self {
            ColumnType::Uuid => "uuid",
            ColumnType::Text => "text",
            ColumnType::Int => "int4",
            ColumnType::BigInt => "int8",
            ColumnType::Float => "float8",
            ColumnType::Bool => "bool",
            ColumnType::Timestamptz => "timestamptz",
            ColumnType::Jsonb => "jsonb",
        }
    }
}

/// One rejected field of a payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub expected: String,
    pub got: String,
    pub value: JsonValue,
}

impl FieldError {
    pub fn new(field: &str, expected: impl Into<String>, got: impl Into<String>, value: JsonValue) -> Self {
        Self {
            field: field.to_string(),
            expected: expected.into(),
            got: got.into(),
            value,
        }
    }
}

/// Contract every marketplace table model fulfils.
///
/// Stores and repositories work against this trait so they never need to
/// know a table's concrete shape.
pub trait MarketplaceModel: Send + Sync {
    /// Returns the name of the database table for this model.
    fn table_name(&self) -> &str;

    /// Returns the name of the primary key field for this model.
    fn primary_key_field(&self) -> &str {
        "id"
    }

    /// Declared type of `column`, or `None` when the column is unknown.
    fn column_type(&self, column: &str) -> Option<ColumnType>;

    fn has_column(&self, column: &str) -> bool {
        self.column_type(column).is_some()
    }

    /// Fills defaults for absent fields of a create payload.
    fn apply_defaults(&self, _payload: &mut JsonMap) {}

    /// Validates a coerced payload before records are created.
    fn validate_create_payload(&self, _payload: &JsonMap) -> Result<(), Vec<FieldError>> {
        Ok(())
    }

    /// Validates a coerced partial payload before records are updated.
    fn validate_update_payload(&self, _payload: &JsonMap) -> Result<(), Vec<FieldError>> {
        Ok(())
    }
}
