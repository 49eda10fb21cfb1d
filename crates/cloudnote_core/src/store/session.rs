//! Authentication and datastore open flow.
//!
//! # Responsibility
//! - Authenticate the account, open the default datastore and publish it
//!   through a `StoreHandle`.
//! - Broadcast `ClientEvent::Authenticated` once the datastore is usable.
//!
//! # Invariants
//! - Any failure rejects the handle, so dependents never wait forever.
//! - No retry: a failed session requires a new handle.

use super::{AccountClient, Datastore, HandleError, StoreHandle};
use crate::events::{ClientEvent, EventBus};
use log::{error, info, warn};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

/// Runs the session flow on the calling thread.
pub fn connect(
    account: &dyn AccountClient,
    interactive: bool,
    handle: &StoreHandle,
    events: &EventBus,
) -> Result<Arc<dyn Datastore>, HandleError> {
    let started_at = Instant::now();
    info!(
        "event=store_connect module=store status=start interactive={}",
        interactive
    );

    let opened = account
        .authenticate(interactive)
        .and_then(|manager| manager.open_default_datastore());

    let datastore = match opened {
        Ok(datastore) => datastore,
        Err(err) => {
            error!(
                "event=store_connect module=store status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            if handle.reject(err.clone()).is_err() {
                warn!(
                    "event=store_connect module=store status=ignored reason=already_resolved"
                );
            }
            return Err(HandleError::InitFailed(err));
        }
    };

    handle.resolve(Arc::clone(&datastore))?;
    events.publish(ClientEvent::Authenticated);
    info!(
        "event=store_connect module=store status=ok duration_ms={} datastore_id={}",
        started_at.elapsed().as_millis(),
        datastore.id()
    );
    Ok(datastore)
}

/// Runs the session flow on a dedicated thread.
///
/// Callers keep working and use `deferred_*` operations, which block until
/// the handle resolves.
pub fn connect_in_background(
    account: Arc<dyn AccountClient>,
    interactive: bool,
    handle: StoreHandle,
    events: EventBus,
) -> std::io::Result<JoinHandle<Result<(), HandleError>>> {
    std::thread::Builder::new()
        .name("cloudnote-connect".to_string())
        .spawn(move || connect(account.as_ref(), interactive, &handle, &events).map(|_| ()))
}
