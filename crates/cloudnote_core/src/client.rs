//! Client facade wiring the store handle, repositories and uploader.
//!
//! # Responsibility
//! - Build every repository from one explicitly injected `StoreHandle`.
//! - Start the account session that resolves that handle.

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::events::EventBus;
use crate::repo::folder_repo::FolderRepository;
use crate::repo::note_repo::NoteRepository;
use crate::repo::setting_repo::SettingRepository;
use crate::store::session::{connect, connect_in_background};
use crate::store::{AccountClient, Datastore, HandleError, ObjectStore, StoreHandle};
use crate::upload::FileUploader;
use log::info;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Entry point for UI callers.
pub struct NotesClient {
    config: ClientConfig,
    handle: StoreHandle,
    events: EventBus,
    pub folders: FolderRepository,
    pub notes: NoteRepository,
    pub settings: SettingRepository,
    pub uploads: FileUploader,
}

impl NotesClient {
    pub fn new(config: ClientConfig, files: Arc<dyn ObjectStore>) -> Self {
        Self::with_clock(config, files, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: ClientConfig,
        files: Arc<dyn ObjectStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let handle = StoreHandle::new();
        let events = EventBus::new();
        let folders = FolderRepository::new(handle.clone(), &config, clock);
        let notes = NoteRepository::new(folders.clone(), &events);
        let settings = SettingRepository::new(handle.clone(), &config);
        let uploads = FileUploader::new(files, events.clone());
        Self {
            config,
            handle,
            events,
            folders,
            notes,
            settings,
            uploads,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn handle(&self) -> &StoreHandle {
        &self.handle
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Authenticates and opens the datastore on the calling thread.
    pub fn connect(&self, account: &dyn AccountClient) -> Result<Arc<dyn Datastore>, HandleError> {
        self.log_connect("foreground");
        connect(
            account,
            self.config.interactive_auth,
            &self.handle,
            &self.events,
        )
    }

    /// Authenticates and opens the datastore on a background thread.
    pub fn connect_in_background(
        &self,
        account: Arc<dyn AccountClient>,
    ) -> std::io::Result<JoinHandle<Result<(), HandleError>>> {
        self.log_connect("background");
        connect_in_background(
            account,
            self.config.interactive_auth,
            self.handle.clone(),
            self.events.clone(),
        )
    }

    fn log_connect(&self, mode: &str) {
        info!(
            "event=client_connect module=client status=start mode={} app_key={}",
            mode, self.config.app_key
        );
    }
}
