use cloudnote_core::{
    ClientConfig, ClientEvent, Datastore, ErrorKind, HandleError, MemoryAccount, MemoryDatastore,
    MemoryObjectStore, NotesClient, RepoError, StoreError, StoreHandle,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn client_with_timeout(open_timeout_ms: u64) -> NotesClient {
    let config = ClientConfig {
        open_timeout_ms,
        ..ClientConfig::default()
    };
    NotesClient::new(config, Arc::new(MemoryObjectStore::new("https://files.test")))
}

fn datastore() -> Arc<dyn Datastore> {
    Arc::new(MemoryDatastore::default())
}

#[test]
fn handle_resolves_only_once() {
    let handle = StoreHandle::new();
    handle.resolve(datastore()).unwrap();

    assert_eq!(
        handle.resolve(datastore()).unwrap_err(),
        HandleError::AlreadyResolved
    );
    assert_eq!(
        handle
            .reject(StoreError::Backend("late".to_string()))
            .unwrap_err(),
        HandleError::AlreadyResolved
    );
    assert!(handle.is_resolved());
}

#[test]
fn ready_handle_is_resolved_from_the_start() {
    let handle = StoreHandle::ready(datastore());
    assert!(handle.is_resolved());
    assert_eq!(handle.try_get().ok().unwrap().id(), "default");
    assert_eq!(
        handle.resolve(datastore()).unwrap_err(),
        HandleError::AlreadyResolved
    );
}

#[test]
fn pending_handle_is_unresolved_and_wait_times_out() {
    let handle = StoreHandle::new();
    assert!(matches!(handle.try_get(), Err(HandleError::Unresolved)));
    assert!(matches!(
        handle.wait(Duration::from_millis(20)),
        Err(HandleError::TimedOut(_))
    ));
}

#[test]
fn reject_wakes_blocked_waiters() {
    let handle = StoreHandle::new();
    let waiter = {
        let handle = handle.clone();
        std::thread::spawn(move || handle.wait(Duration::from_secs(10)).map(|_| ()))
    };

    std::thread::sleep(Duration::from_millis(20));
    handle
        .reject(StoreError::AuthenticationFailed("denied".to_string()))
        .unwrap();

    let result = waiter.join().unwrap();
    assert_eq!(
        result,
        Err(HandleError::InitFailed(StoreError::AuthenticationFailed(
            "denied".to_string()
        )))
    );
}

#[test]
fn continuations_run_once_on_resolution() {
    let handle = StoreHandle::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    handle.on_ready(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    handle.resolve(datastore()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let counter = Arc::clone(&calls);
    handle.on_ready(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn continuations_are_dropped_on_rejection() {
    let handle = StoreHandle::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    handle.on_ready(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    handle.reject(StoreError::Backend("offline".to_string())).unwrap();
    let counter = Arc::clone(&calls);
    handle.on_ready(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn operations_before_connect_fail_with_unresolved() {
    let client = client_with_timeout(30_000);

    let err = client.folders.query(&Default::default()).unwrap_err();
    assert!(matches!(err, RepoError::Unresolved(HandleError::Unresolved)));
    assert_eq!(err.kind(), ErrorKind::UnresolvedDependency);

    assert_eq!(
        client.notes.get("any").unwrap_err().kind(),
        ErrorKind::UnresolvedDependency
    );
    assert_eq!(
        client.settings.create("theme", "dark").unwrap_err().kind(),
        ErrorKind::UnresolvedDependency
    );
}

#[test]
fn deferred_query_waits_for_background_connect() {
    let client = client_with_timeout(10_000);
    let events = client.events().subscribe();
    let account = MemoryAccount::new(Arc::new(MemoryDatastore::default()))
        .with_latency(Duration::from_millis(50));

    let connecting = client.connect_in_background(Arc::new(account)).unwrap();

    let folders = client.folders.deferred_query(&Default::default()).unwrap();
    assert!(folders.is_empty());
    assert!(client.notes.deferred_query(&Default::default()).unwrap().is_empty());
    assert!(client.settings.deferred_query(&Default::default()).unwrap().is_empty());

    connecting.join().unwrap().unwrap();
    assert!(client.handle().is_resolved());
    let received: Vec<ClientEvent> = events.try_iter().collect();
    assert!(received.contains(&ClientEvent::Authenticated));
}

#[test]
fn deferred_query_times_out_without_connect() {
    let client = client_with_timeout(30);

    let err = client.folders.deferred_query(&Default::default()).unwrap_err();
    assert!(matches!(err, RepoError::Unresolved(HandleError::TimedOut(_))));
}

#[test]
fn failed_authentication_rejects_instead_of_hanging() {
    let client = client_with_timeout(60_000);
    let events = client.events().subscribe();
    let account = MemoryAccount::new(Arc::new(MemoryDatastore::default())).refusing("denied");

    let err = client.connect(&account).err().unwrap();
    assert!(matches!(
        err,
        HandleError::InitFailed(StoreError::AuthenticationFailed(_))
    ));

    let err = client.notes.deferred_query(&Default::default()).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Unresolved(HandleError::InitFailed(_))
    ));
    assert!(events.try_recv().is_err());
}

#[test]
fn second_connect_is_rejected() {
    let client = client_with_timeout(1_000);
    let datastore = Arc::new(MemoryDatastore::default());

    client.connect(&MemoryAccount::new(datastore.clone())).unwrap();
    let err = client
        .connect(&MemoryAccount::new(datastore))
        .err()
        .unwrap();
    assert_eq!(err, HandleError::AlreadyResolved);
}

#[test]
fn failed_connect_on_resolved_handle_reports_the_auth_error() {
    let client = client_with_timeout(1_000);
    let datastore = Arc::new(MemoryDatastore::default());
    client.connect(&MemoryAccount::new(datastore.clone())).unwrap();

    let refusing = MemoryAccount::new(datastore).refusing("expired");
    let err = client.connect(&refusing).err().unwrap();
    assert_eq!(
        err,
        HandleError::InitFailed(StoreError::AuthenticationFailed("expired".to_string()))
    );
    assert!(client.handle().is_resolved());
}
