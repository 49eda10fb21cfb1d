//! Single-assignment handle to the opened datastore.
//!
//! # Invariants
//! - The handle leaves `Pending` at most once, to either ready or failed.
//! - Continuations registered before resolution run exactly once, on the
//!   resolving thread, after the state lock is released.
//! - Failed initialization wakes every waiter with `InitFailed`.

use super::{Datastore, StoreError};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

type Continuation = Box<dyn FnOnce(&Arc<dyn Datastore>) + Send>;

/// Errors observed while waiting on or resolving the handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// The datastore is not open yet.
    Unresolved,
    /// Waiting exceeded the configured bound.
    TimedOut(Duration),
    /// Authentication or open failed; the handle will never become ready.
    InitFailed(StoreError),
    /// A second resolution was attempted.
    AlreadyResolved,
}

impl Display for HandleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unresolved => write!(f, "datastore is not open yet"),
            Self::TimedOut(timeout) => {
                write!(f, "datastore did not open within {} ms", timeout.as_millis())
            }
            Self::InitFailed(err) => write!(f, "datastore initialization failed: {err}"),
            Self::AlreadyResolved => write!(f, "datastore handle is already resolved"),
        }
    }
}

impl Error for HandleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InitFailed(err) => Some(err),
            _ => None,
        }
    }
}

enum HandleState {
    Pending,
    Ready(Arc<dyn Datastore>),
    Failed(StoreError),
}

struct Shared {
    state: HandleState,
    continuations: Vec<Continuation>,
}

struct Inner {
    shared: Mutex<Shared>,
    changed: Condvar,
}

/// Cloneable, single-assignment future of the default datastore.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<Inner>,
}

impl Default for StoreHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared {
                    state: HandleState::Pending,
                    continuations: Vec::new(),
                }),
                changed: Condvar::new(),
            }),
        }
    }

    /// Creates an already-resolved handle.
    pub fn ready(datastore: Arc<dyn Datastore>) -> Self {
        let handle = Self::new();
        {
            let mut shared = handle.lock();
            shared.state = HandleState::Ready(datastore);
        }
        handle
    }

    /// Publishes the datastore and runs pending continuations.
    pub fn resolve(&self, datastore: Arc<dyn Datastore>) -> Result<(), HandleError> {
        let continuations = {
            let mut shared = self.lock();
            if !matches!(shared.state, HandleState::Pending) {
                warn!("event=store_handle_resolve module=store status=rejected reason=already_resolved");
                return Err(HandleError::AlreadyResolved);
            }
            shared.state = HandleState::Ready(Arc::clone(&datastore));
            std::mem::take(&mut shared.continuations)
        };
        self.inner.changed.notify_all();
        debug!(
            "event=store_handle_resolve module=store status=ok datastore_id={} continuations={}",
            datastore.id(),
            continuations.len()
        );

        for continuation in continuations {
            continuation(&datastore);
        }
        Ok(())
    }

    /// Marks initialization as failed and wakes all waiters.
    ///
    /// Pending continuations are dropped without running.
    pub fn reject(&self, error: StoreError) -> Result<(), HandleError> {
        let dropped = {
            let mut shared = self.lock();
            if !matches!(shared.state, HandleState::Pending) {
                return Err(HandleError::AlreadyResolved);
            }
            shared.state = HandleState::Failed(error);
            std::mem::take(&mut shared.continuations).len()
        };
        self.inner.changed.notify_all();
        warn!(
            "event=store_handle_reject module=store status=failed dropped_continuations={}",
            dropped
        );
        Ok(())
    }

    /// Returns the datastore without blocking.
    pub fn try_get(&self) -> Result<Arc<dyn Datastore>, HandleError> {
        match &self.lock().state {
            HandleState::Pending => Err(HandleError::Unresolved),
            HandleState::Ready(datastore) => Ok(Arc::clone(datastore)),
            HandleState::Failed(err) => Err(HandleError::InitFailed(err.clone())),
        }
    }

    /// Blocks until the handle leaves `Pending` or `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> Result<Arc<dyn Datastore>, HandleError> {
        let guard = self.lock();
        let (guard, _) = self
            .inner
            .changed
            .wait_timeout_while(guard, timeout, |shared| {
                matches!(shared.state, HandleState::Pending)
            })
            .unwrap_or_else(PoisonError::into_inner);

        match &guard.state {
            HandleState::Pending => Err(HandleError::TimedOut(timeout)),
            HandleState::Ready(datastore) => Ok(Arc::clone(datastore)),
            HandleState::Failed(err) => Err(HandleError::InitFailed(err.clone())),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.lock().state, HandleState::Ready(_))
    }

    /// Runs `continuation` once the datastore is ready.
    ///
    /// Runs immediately on the calling thread when already ready; never runs
    /// when initialization failed.
    pub fn on_ready<F>(&self, continuation: F)
    where
        F: FnOnce(&Arc<dyn Datastore>) + Send + 'static,
    {
        let ready = {
            let mut guard = self.lock();
            let shared = &mut *guard;
            match &shared.state {
                HandleState::Pending => {
                    shared.continuations.push(Box::new(continuation));
                    return;
                }
                HandleState::Ready(datastore) => Arc::clone(datastore),
                HandleState::Failed(_) => return,
            }
        };
        continuation(&ready);
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
