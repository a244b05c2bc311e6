//! Forwards Postgres `NOTIFY` payloads into a [`ChangeFeed`].
//!
//! The marketplace migration installs `notify_row_change()` triggers that
//! publish `{"table", "type", "record", "old_record"}` on [`CHANNEL`].
//! Rows too large for a notification arrive with `"truncated": true` and
//! only their key columns; the listener reloads the full row by id.

use super::{ChangeEvent, ChangeFeed, ChangeKind};
use crate::domain::model::catalog::RESOURCES;
use crate::domain::model::MarketplaceModel;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgListener;
use sqlx::{PgPool, Row};
use tokio::task::JoinHandle;

pub const CHANNEL: &str = "row_changes";

/// A decoded notification; `truncated` marks a key-only payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub event: ChangeEvent,
    pub truncated: bool,
}

pub fn parse_notification(payload: &str) -> anyhow::Result<ChangeEvent> {
    Ok(decode_notification(payload)?.event)
}

pub fn decode_notification(payload: &str) -> anyhow::Result<Notification> {
    let value: JsonValue = serde_json::from_str(payload)?;
    let truncated = value
        .get("truncated")
        .and_then(JsonValue::as_bool)
        .unwrap_or(false);
    let event: ChangeEvent = serde_json::from_value(value)?;
    Ok(Notification { event, truncated })
}

fn is_known_table(table: &str) -> bool {
    RESOURCES
        .iter()
        .any(|spec| spec.model.table_name() == table)
}

/// Replaces a key-only `record` with the stored row. Deletes keep their
/// key-only `old_record`; the row no longer exists.
async fn reload_row(pool: &PgPool, mut event: ChangeEvent) -> ChangeEvent {
    if event.kind == ChangeKind::Delete || !is_known_table(&event.table) {
        return event;
    }
    let Some(id) = event
        .record
        .get("id")
        .and_then(JsonValue::as_str)
        .map(str::to_owned)
    else {
        return event;
    };
    let sql = format!(
        "SELECT row_to_json(t.*) AS record FROM {} t WHERE t.id = $1::uuid",
        event.table
    );
    match sqlx::query(&sql).bind(&id).fetch_optional(pool).await {
        Ok(Some(row)) => match row.try_get::<JsonValue, _>("record") {
            Ok(record) => event.record = record,
            Err(e) => tracing::warn!(error = %e, table = %event.table, "Failed to decode reloaded row"),
        },
        Ok(None) => {
            tracing::debug!(table = %event.table, id = %id, "Row gone before reload, keeping key columns");
        }
        Err(e) => {
            tracing::warn!(error = %e, table = %event.table, id = %id, "Failed to reload truncated row");
        }
    }
    event
}

/// Listens on [`CHANNEL`] and republishes every notification until the
/// connection fails for good. `PgListener` reconnects on its own after
/// transient connection loss.
pub async fn run_listener(pool: PgPool, feed: ChangeFeed) -> anyhow::Result<()> {
    let mut listener = PgListener::connect_with(&pool).await?;
    listener.listen(CHANNEL).await?;
    tracing::info!(channel = CHANNEL, "Listening for row change notifications");

    loop {
        let notification = listener.recv().await?;
        match decode_notification(notification.payload()) {
            Ok(Notification { event, truncated: false }) => feed.publish(event),
            Ok(Notification { event, truncated: true }) => {
                feed.publish(reload_row(&pool, event).await);
            }
            Err(e) => {
                tracing::warn!(error = %e, channel = CHANNEL, "Ignoring malformed change notification");
            }
        }
    }
}

pub fn spawn_listener(pool: PgPool, feed: ChangeFeed) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = run_listener(pool, feed).await {
            tracing::error!(error = %e, "Row change listener stopped");
        }
    })
}
