//! # Callback Registry
//!
//! The engine cannot call into client memory, so callbacks are registered
//! locally under a numeric id and only the id crosses the wire. When the
//! server fires a callback it streams back an event tagged with that id.
//!
//! ```text
//! register(NewImage, f) ──► CallbackId(3) ──► SetOnNewImageCallback(3)
//!                                                      │
//!                         CallbackEvent { id: 3 } ◄────┘ (stream)
//!                                  │
//!                         dispatch() ──► f(&event)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::types::RenderStatistics;

/// Identifier of a registered callback. `0` means "no callback".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallbackId(pub u64);

impl CallbackId {
    pub const NONE: CallbackId = CallbackId(0);

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for CallbackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a callback is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackKind {
    NewImage,
    RenderFailure,
}

/// A callback invocation sent by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackEvent {
    /// A new render result is available.
    NewImage(RenderStatistics),
    /// Rendering could not start or was aborted.
    RenderFailure { reason: String },
}

impl CallbackEvent {
    pub const fn kind(&self) -> CallbackKind {
        match self {
            CallbackEvent::NewImage(_) => CallbackKind::NewImage,
            CallbackEvent::RenderFailure { .. } => CallbackKind::RenderFailure,
        }
    }
}

/// A registered callback function.
pub type Callback = Arc<dyn Fn(&CallbackEvent) + Send + Sync>;

/// Callback id → function table.
pub struct CallbackRegistry {
    next_id: AtomicU64,
    entries: DashMap<CallbackId, (CallbackKind, Callback)>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        CallbackRegistry {
            next_id: AtomicU64::new(1),
            entries: DashMap::new(),
        }
    }

    /// Registers `callback` for events of `kind`. Ids start at 1 and are
    /// never reused.
    pub fn register<F>(&self, kind: CallbackKind, callback: F) -> CallbackId
    where
        F: Fn(&CallbackEvent) + Send + Sync + 'static,
    {
        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.insert(id, (kind, Arc::new(callback)));
        id
    }

    /// Removes a callback. Returns false if it was not registered.
    pub fn unregister(&self, id: CallbackId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn contains(&self, id: CallbackId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Invokes the callback registered under `id`.
    ///
    /// Returns false if no callback has that id or it was registered for a
    /// different event kind. The map entry is released before the callback
    /// runs, so callbacks may register or unregister freely.
    pub fn dispatch(&self, id: CallbackId, event: &CallbackEvent) -> bool {
        let callback = match self.entries.get(&id) {
            Some(entry) if entry.value().0 == event.kind() => Arc::clone(&entry.value().1),
            _ => return false,
        };
        callback(event);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("registered", &self.entries.len())
            .finish()
    }
}
