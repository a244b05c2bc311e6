//! Postgres-backed table store.
//!
//! SQL is built dynamically from the model: identifiers come from the static
//! table declarations, values are always bound with an explicit `$n::type`
//! cast so loosely typed JSON lands in the right column type.

use super::{Filter, OrderBy, SqlExecutor, TableStore};
use crate::domain::model::{ColumnType, JsonMap, MarketplaceModel};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Executor, PgPool, Postgres, QueryBuilder, Row};

#[derive(Clone)]
pub struct PgTableStore {
    pool: PgPool,
}

impl PgTableStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Text form of a scalar for binding; Postgres casts it to the column type.
fn sql_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, col_type: ColumnType, value: &JsonValue) {
    match col_type {
        ColumnType::Jsonb if !value.is_null() => {
            qb.push_bind(value.clone()).push("::jsonb");
        }
        other => {
            qb.push_bind(sql_text(value)).push("::").push(other.sql_cast());
        }
    }
}

fn column_type(model: &dyn MarketplaceModel, field: &str) -> anyhow::Result<ColumnType> {
    model.column_type(field).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown column '{}' for table '{}'",
            field,
            model.table_name()
        )
    })
}

fn push_where(
    qb: &mut QueryBuilder<'_, Postgres>,
    model: &dyn MarketplaceModel,
    filters: &[Filter],
) -> anyhow::Result<()> {
    for (idx, filter) in filters.iter().enumerate() {
        let col_type = column_type(model, &filter.field)?;
        qb.push(if idx == 0 { " WHERE " } else { " AND " });
        if filter.value.is_null() {
            qb.push(&filter.field).push(" IS NULL");
        } else {
            qb.push(&filter.field).push(" = ");
            push_value(qb, col_type, &filter.value);
        }
    }
    Ok(())
}

fn push_returning(qb: &mut QueryBuilder<'_, Postgres>, table: &str) {
    qb.push(" RETURNING row_to_json(")
        .push(table)
        .push(".*) AS record");
}

fn records(rows: Vec<PgRow>) -> anyhow::Result<Vec<JsonValue>> {
    rows.iter()
        .map(|row| row.try_get::<JsonValue, _>("record").map_err(anyhow::Error::from))
        .collect()
}

#[async_trait]
impl TableStore for PgTableStore {
    async fn select(
        &self,
        model: &dyn MarketplaceModel,
        filters: &[Filter],
        order_by: Option<&OrderBy>,
    ) -> anyhow::Result<Vec<JsonValue>> {
        let table = model.table_name();
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT row_to_json(");
        qb.push(table).push(".*) AS record FROM ").push(table);
        push_where(&mut qb, model, filters)?;
        if let Some(order) = order_by {
            column_type(model, &order.field)?;
            qb.push(" ORDER BY ")
                .push(&order.field)
                .push(if order.descending { " DESC" } else { " ASC" });
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        records(rows)
    }

    async fn insert(&self, model: &dyn MarketplaceModel, record: &JsonMap) -> anyhow::Result<JsonValue> {
        if record.is_empty() {
            return Err(anyhow::anyhow!("record cannot be empty"));
        }
        let table = model.table_name();

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("INSERT INTO ");
        qb.push(table).push(" (");
        for (idx, column) in record.keys().enumerate() {
            if idx > 0 {
                qb.push(", ");
            }
            column_type(model, column)?;
            qb.push(column);
        }
        qb.push(") VALUES (");
        for (idx, (column, value)) in record.iter().enumerate() {
            if idx > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, column_type(model, column)?, value);
        }
        qb.push(")");
        push_returning(&mut qb, table);

        let row = qb.build().fetch_one(&self.pool).await?;
        let inserted: JsonValue = row.try_get("record")?;
        Ok(inserted)
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
        let table = model.table_name();

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE ");
        qb.push(table).push(" SET ");
        for (idx, (column, value)) in patch.iter().enumerate() {
            if idx > 0 {
                qb.push(", ");
            }
            let col_type = column_type(model, column)?;
            qb.push(column).push(" = ");
            push_value(&mut qb, col_type, value);
        }
        push_where(&mut qb, model, filters)?;
        push_returning(&mut qb, table);

        let rows = qb.build().fetch_all(&self.pool).await?;
        records(rows)
    }

    async fn delete(&self, model: &dyn MarketplaceModel, filters: &[Filter]) -> anyhow::Result<u64> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("DELETE FROM ");
        qb.push(model.table_name());
        push_where(&mut qb, model, filters)?;

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SqlExecutor for PgTableStore {
    async fn execute_sql(&self, sql: &str) -> anyhow::Result<()> {
        self.pool.execute(sql).await?;
        Ok(())
    }
}
