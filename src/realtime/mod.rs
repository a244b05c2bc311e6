//! Realtime change relay.
//!
//! A `ChangeFeed` fans row change events out to subscribers. Events come from
//! the in-memory store directly, or from Postgres through [`pg_bridge`].
//! There is no replay: a subscriber only sees events published after it
//! subscribed, and a subscriber that falls more than the channel capacity
//! behind skips the events it missed.

pub mod pg_bridge;

use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::panic::AssertUnwindSafe;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "INSERT",
            ChangeKind::Update => "UPDATE",
            ChangeKind::Delete => "DELETE",
        }
    }
}

/// One row change. For deletes `record` is null and `old_record` holds the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub record: JsonValue,
    #[serde(default)]
    pub old_record: Option<JsonValue>,
}

impl ChangeEvent {
    /// The row the event is about: the new row, or the removed one for deletes.
    pub fn row(&self) -> Option<&JsonValue> {
        if self.record.is_null() {
            self.old_record.as_ref()
        } else {
            Some(&self.record)
        }
    }
}

/// Selects which events a subscriber receives.
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    pub table: String,
    pub field_eq: Option<(String, JsonValue)>,
    pub kinds: Vec<ChangeKind>,
}

impl ChangeFilter {
    /// Inserts and updates on `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            field_eq: None,
            kinds: vec![ChangeKind::Insert, ChangeKind::Update],
        }
    }

    pub fn field_eq(mut self, field: impl Into<String>, value: JsonValue) -> Self {
        self.field_eq = Some((field.into(), value));
        self
    }

    pub fn kinds(mut self, kinds: &[ChangeKind]) -> Self {
        self.kinds = kinds.to_vec();
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.table != self.table || !self.kinds.contains(&event.kind) {
            return false;
        }
        match &self.field_eq {
            None => true,
            Some((field, value)) => event
                .row()
                .and_then(|row| row.get(field))
                .map(|v| v == value)
                .unwrap_or(false),
        }
    }
}

#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: ChangeEvent) {
        // No receivers is not an error: nobody is listening yet.
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(receivers = delivered, "Published change event");
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Invokes `callback` for every matching event until the returned
    /// subscription is unsubscribed or dropped.
    ///
    /// A panicking callback is logged and delivery continues with the next event.
    pub fn subscribe<F>(&self, filter: ChangeFilter, callback: F) -> Subscription
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        let mut rx = self.sender.subscribe();
        let table = filter.table.clone();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if !filter.matches(&event) {
                            continue;
                        }
                        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| callback(event)));
                        if outcome.is_err() {
                            tracing::error!(table = %filter.table, "Change callback panicked");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(table = %filter.table, skipped, "Subscriber lagged, events skipped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        tracing::debug!(table = %table, "Subscription started");
        Subscription {
            table,
            handle: Some(handle),
        }
    }

    /// The same events as [`ChangeFeed::subscribe`], as an async stream.
    pub fn stream(&self, filter: ChangeFilter) -> impl Stream<Item = ChangeEvent> + Send + 'static {
        let rx = self.sender.subscribe();
        stream::unfold((rx, filter), |(mut rx, filter)| async move {
            loop {
                match rx.recv().await {
                    Ok(event) if filter.matches(&event) => return Some((event, (rx, filter))),
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(table = %filter.table, skipped, "Stream lagged, events skipped");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Handle to a callback subscription. Dropping it stops delivery.
pub struct Subscription {
    table: String,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!(table = %self.table, "Subscription stopped");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}
