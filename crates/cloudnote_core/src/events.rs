//! Client event broadcast for UI observers.
//!
//! # Invariants
//! - Every live subscriber receives every event published after it
//!   subscribed, in publish order.
//! - Disconnected subscribers are pruned on the next publish.

use log::debug;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Event observable by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Account authenticated and default datastore opened.
    Authenticated,
    /// Notes table is available for queries.
    NotesReady,
    /// An image upload finished and is shareable.
    NewImage { name: String, url: String },
    /// A non-image upload finished and is shareable.
    NewFile { name: String, url: String },
}

impl ClientEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authenticated => "authenticated",
            Self::NotesReady => "notes",
            Self::NewImage { .. } => "New Image",
            Self::NewFile { .. } => "New File",
        }
    }
}

/// Cloneable fan-out channel for `ClientEvent`s.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<ClientEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new observer.
    pub fn subscribe(&self) -> Receiver<ClientEvent> {
        let (sender, receiver) = channel();
        self.lock().push(sender);
        receiver
    }

    /// Sends `event` to every live subscriber and returns how many got it.
    pub fn publish(&self, event: ClientEvent) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|subscriber| subscriber.send(event.clone()).is_ok());
        debug!(
            "event=client_event module=events status=ok name={:?} receivers={}",
            event.name(),
            subscribers.len()
        );
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Sender<ClientEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
