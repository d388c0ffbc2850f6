//! In-process fan-out of done event changes.
//!
//! Delivery is fire-and-forget. A subscriber that falls more than the
//! channel capacity behind loses the oldest changes; publishing with nobody
//! listening is fine.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::model::DoneEvent;

/// Default number of changes buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 64;

/// What happened to a done event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Save,
    Remove,
}

impl ChangeKind {
    /// Event name on the wire.
    #[must_use]
    pub fn event_name(self) -> &'static str {
        match self {
            Self::Save => "doneevent:save",
            Self::Remove => "doneevent:remove",
        }
    }

    /// Inverse of [`event_name`](Self::event_name).
    #[must_use]
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "doneevent:save" => Some(Self::Save),
            "doneevent:remove" => Some(Self::Remove),
            _ => None,
        }
    }
}

/// A saved or removed done event, carrying the full document.
#[derive(Debug, Clone, PartialEq)]
pub struct DoneEventChange {
    pub kind: ChangeKind,
    pub doc: DoneEvent,
}

/// Broadcasts [`DoneEventChange`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<DoneEventChange>,
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Receive every change published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DoneEventChange> {
        self.tx.subscribe()
    }

    /// Publish a change. Returns the number of subscribers reached.
    pub fn publish(&self, kind: ChangeKind, doc: DoneEvent) -> usize {
        let id = doc.id.clone();
        let reached = self.tx.send(DoneEventChange { kind, doc }).unwrap_or(0);
        debug!(event = kind.event_name(), %id, subscribers = reached, "published change");
        reached
    }

    /// Current subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
