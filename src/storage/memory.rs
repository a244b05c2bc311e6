//! In-process table store.
//!
//! Behaves like the Postgres store for everything the repositories rely on:
//! server-assigned `id`/`created_at`/`updated_at`, equality filters, ordering
//! and affected-row counts. Writes are published to an optional change feed,
//! which stands in for the database triggers.

use super::{Filter, OrderBy, TableStore};
use crate::domain::model::coerce::format_timestamp;
use crate::domain::model::{JsonMap, MarketplaceModel};
use crate::realtime::{ChangeEvent, ChangeFeed, ChangeKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryTableStore {
    tables: RwLock<HashMap<String, Vec<JsonValue>>>,
    feed: Option<ChangeFeed>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(feed: ChangeFeed) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            feed: Some(feed),
        }
    }

    /// Number of rows currently held for `table`, regardless of owner.
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map(Vec::len).unwrap_or(0)
    }

    fn publish(&self, table: &str, kind: ChangeKind, record: JsonValue, old_record: Option<JsonValue>) {
        if let Some(feed) = &self.feed {
            feed.publish(ChangeEvent {
                table: table.to_string(),
                kind,
                record,
                old_record,
            });
        }
    }
}

fn matches_all(filters: &[Filter], row: &JsonValue) -> bool {
    filters.iter().all(|f| {
        if f.value.is_null() {
            row.get(&f.field).map(JsonValue::is_null).unwrap_or(true)
        } else {
            f.matches(row)
        }
    })
}

fn compare_json(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(JsonValue::Bool(x)), Some(JsonValue::Bool(y))) => x.cmp(y),
        (None | Some(JsonValue::Null), None | Some(JsonValue::Null)) => Ordering::Equal,
        (None | Some(JsonValue::Null), _) => Ordering::Less,
        (_, None | Some(JsonValue::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn select(
        &self,
        model: &dyn MarketplaceModel,
        filters: &[Filter],
        order_by: Option<&OrderBy>,
    ) -> anyhow::Result<Vec<JsonValue>> {
        let tables = self.tables.read().await;
        let Some(rows) = tables.get(model.table_name()) else {
            return Ok(Vec::new());
        };

        let mut out: Vec<JsonValue> = rows
            .iter()
            .filter(|row| matches_all(filters, row))
            .cloned()
            .collect();

        if let Some(order) = order_by {
            if order.descending {
                // Later inserts win ties, as they would with distinct timestamps.
                out.reverse();
                out.sort_by(|a, b| compare_json(b.get(&order.field), a.get(&order.field)));
            } else {
                out.sort_by(|a, b| compare_json(a.get(&order.field), b.get(&order.field)));
            }
        }
        Ok(out)
    }

    async fn insert(&self, model: &dyn MarketplaceModel, record: &JsonMap) -> anyhow::Result<JsonValue> {
        if record.is_empty() {
            return Err(anyhow::anyhow!("record cannot be empty"));
        }
        let mut row = record.clone();
        let pk_field = model.primary_key_field();
        if !row.contains_key(pk_field) {
            row.insert(pk_field.to_string(), JsonValue::from(Uuid::new_v4().to_string()));
        }
        let now = JsonValue::from(format_timestamp(Utc::now()));
        for column in ["created_at", "updated_at"] {
            if model.has_column(column) && !row.contains_key(column) {
                row.insert(column.to_string(), now.clone());
            }
        }
        let row = JsonValue::Object(row);

        {
            let mut tables = self.tables.write().await;
            let rows = tables.entry(model.table_name().to_string()).or_default();
            let pk = row.get(pk_field).cloned().unwrap_or(JsonValue::Null);
            if rows.iter().any(|r| r.get(pk_field) == Some(&pk)) {
                return Err(anyhow::anyhow!(
                    "duplicate key value for {}.{}",
                    model.table_name(),
                    pk_field
                ));
            }
            rows.push(row.clone());
        }

        self.publish(model.table_name(), ChangeKind::Insert, row.clone(), None);
        Ok(row)
    }

    async fn update(
        &self,
        model: &dyn MarketplaceModel,
        filters: &[Filter],
        patch: &JsonMap,
    ) -> anyhow::Result<Vec<JsonValue>> {
        if patch.is_empty() {
            return Err(anyhow::anyhow!("patch cannot be empty"));
        }
        let mut changes: Vec<(JsonValue, JsonValue)> = Vec::new();
        {
            let mut tables = self.tables.write().await;
            if let Some(rows) = tables.get_mut(model.table_name()) {
                for row in rows.iter_mut().filter(|row| matches_all(filters, row)) {
                    let old = row.clone();
                    if let Some(obj) = row.as_object_mut() {
                        for (k, v) in patch {
                            obj.insert(k.clone(), v.clone());
                        }
                    }
                    changes.push((old, row.clone()));
                }
            }
        }

        let mut updated = Vec::with_capacity(changes.len());
        for (old, new) in changes {
            self.publish(model.table_name(), ChangeKind::Update, new.clone(), Some(old));
            updated.push(new);
        }
        Ok(updated)
    }

    async fn delete(&self, model: &dyn MarketplaceModel, filters: &[Filter]) -> anyhow::Result<u64> {
        let mut removed: Vec<JsonValue> = Vec::new();
        {
            let mut tables = self.tables.write().await;
            if let Some(rows) = tables.get_mut(model.table_name()) {
                rows.retain(|row| {
                    if matches_all(filters, row) {
                        removed.push(row.clone());
                        false
                    } else {
                        true
                    }
                });
            }
        }

        let count = removed.len() as u64;
        for old in removed {
            self.publish(model.table_name(), ChangeKind::Delete, JsonValue::Null, Some(old));
        }
        Ok(count)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
