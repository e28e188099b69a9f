//! Value-change notifications for form trees.
//!
//! Every top-level mutating operation on a [`crate::FormTree`] emits exactly
//! one [`FormEvent`] through a [`tokio::sync::broadcast`] channel, after the
//! mutation and its revalidation have completed. Observers never drive
//! revalidation; they only react to it.

use serde::{Deserialize, Serialize};

/// Events emitted by form mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormEvent {
    ValueChanged {
        path: String,
    },
    Patched,
    Touched {
        path: String,
    },
    ValidatorsChanged {
        path: String,
    },
    Revalidated {
        path: String,
    },
    GroupAdded {
        path: String,
        index: usize,
    },
    GroupRemoved {
        path: String,
        index: usize,
    },
    ContactPreferenceApplied {
        preference: String,
    },
    RecordLoaded {
        id: Option<u64>,
    },
}

/// Event emitter wrapping a broadcast sender.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    sender: tokio::sync::broadcast::Sender<FormEvent>,
}

impl EventEmitter {
    /// Create a new emitter with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all current subscribers.
    ///
    /// If there are no active receivers the event is silently dropped.
    pub fn emit(&self, event: FormEvent) {
        tracing::trace!(?event, "form event");
        let _ = self.sender.send(event);
    }

    /// Subscribe to events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<FormEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}
