//! Table storage port and its adapters.
//!
//! Every call is a single request against the backend. Stores receive
//! payloads that were already coerced by `domain::model::coerce_record`.

pub mod memory;
pub mod postgres;

use crate::domain::model::{JsonMap, MarketplaceModel};
use async_trait::async_trait;
use serde_json::Value as JsonValue;

pub use memory::MemoryTableStore;
pub use postgres::PgTableStore;

/// Equality predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: JsonValue,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, row: &JsonValue) -> bool {
        row.get(&self.field)
            .map(|v| v == &self.value)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

#[async_trait]
pub trait TableStore: Send + Sync {
    /// Rows matching every filter, optionally ordered.
    async fn select(
        &self,
        model: &dyn MarketplaceModel,
        filters: &[Filter],
        order_by: Option<&OrderBy>,
    ) -> anyhow::Result<Vec<JsonValue>>;

    /// Inserts one row and returns it as stored (server-assigned fields included).
    async fn insert(&self, model: &dyn MarketplaceModel, record: &JsonMap) -> anyhow::Result<JsonValue>;

    /// Applies `patch` to every row matching the filters; returns the updated rows.
    async fn update(
        &self,
        model: &dyn MarketplaceModel,
        filters: &[Filter],
        patch: &JsonMap,
    ) -> anyhow::Result<Vec<JsonValue>>;

    /// Deletes matching rows and returns how many were removed.
    async fn delete(&self, model: &dyn MarketplaceModel, filters: &[Filter]) -> anyhow::Result<u64>;

    async fn ping(&self) -> anyhow::Result<()>;
}

/// Executes raw SQL text (the backend's "execute arbitrary SQL" function).
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute_sql(&self, sql: &str) -> anyhow::Result<()>;
}
