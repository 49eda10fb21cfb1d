//! File upload helper.
//!
//! # Responsibility
//! - Classify an upload as image or generic file by MIME type.
//! - Write it to object storage, request a download URL and announce it.
//!
//! # Invariants
//! - Images land under `/image/<name>`; other files under
//!   `/<top-level-mime-type>/<name>`.
//! - The event is published only after both the write and the URL request
//!   succeeded.

use crate::events::{ClientEvent, EventBus};
use crate::store::{ObjectStore, StoreError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

const IMAGE_MIME_PREFIX: &str = "image";
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Upload failure.
#[derive(Debug)]
pub enum UploadError {
    /// No file was supplied.
    MissingFile,
    /// File metadata cannot form a storage path.
    InvalidFile(String),
    /// Object storage rejected the write.
    Write(StoreError),
    /// The file was written but no share URL could be created.
    ShareUrl(StoreError),
}

impl Display for UploadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFile => write!(f, "no file supplied for upload"),
            Self::InvalidFile(message) => write!(f, "invalid file: {message}"),
            Self::Write(err) => write!(f, "file upload failed: {err}"),
            Self::ShareUrl(err) => write!(f, "could not create share url: {err}"),
        }
    }
}

impl Error for UploadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Write(err) | Self::ShareUrl(err) => Some(err),
            Self::MissingFile | Self::InvalidFile(_) => None,
        }
    }
}

/// File selected by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    /// MIME type such as `image/png`; empty when unknown.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// Upload classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    File,
}

/// Result of a finished upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub kind: UploadKind,
    pub name: String,
    pub path: String,
    pub url: String,
}

/// Classifies a MIME type by its `image` prefix.
pub fn classify_upload(mime_type: &str) -> UploadKind {
    if mime_type.starts_with(IMAGE_MIME_PREFIX) {
        UploadKind::Image
    } else {
        UploadKind::File
    }
}

/// Computes the storage path for a file.
///
/// An empty MIME type is treated as `application/octet-stream`.
pub fn upload_path(file_name: &str, mime_type: &str) -> String {
    match classify_upload(mime_type) {
        UploadKind::Image => format!("/image/{file_name}"),
        UploadKind::File => {
            let mime_type = if mime_type.trim().is_empty() {
                FALLBACK_MIME_TYPE
            } else {
                mime_type
            };
            let top_level = mime_type.split('/').next().unwrap_or(mime_type);
            format!("/{top_level}/{file_name}")
        }
    }
}

/// Uploads files and announces them on the event bus.
#[derive(Clone)]
pub struct FileUploader {
    store: Arc<dyn ObjectStore>,
    events: EventBus,
}

impl FileUploader {
    pub fn new(store: Arc<dyn ObjectStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Writes `file`, requests a download URL and publishes
    /// `NewImage`/`NewFile`.
    pub fn upload(&self, file: Option<&UploadFile>) -> Result<UploadReceipt, UploadError> {
        let file = file.ok_or(UploadError::MissingFile)?;
        if file.name.trim().is_empty() {
            return Err(UploadError::InvalidFile("file name is empty".to_string()));
        }
        if file.name.contains('/') {
            return Err(UploadError::InvalidFile(format!(
                "file name `{}` must not contain `/`",
                file.name
            )));
        }

        let kind = classify_upload(&file.mime_type);
        let path = upload_path(&file.name, &file.mime_type);

        let stat = self.store.write_file(&path, &file.bytes).map_err(|err| {
            error!(
                "event=file_upload module=upload status=error stage=write path={} error={}",
                path, err
            );
            UploadError::Write(err)
        })?;
        let share = self.store.make_url(&path, true).map_err(|err| {
            error!(
                "event=file_upload module=upload status=error stage=share_url path={} error={}",
                path, err
            );
            UploadError::ShareUrl(err)
        })?;

        let event = match kind {
            UploadKind::Image => ClientEvent::NewImage {
                name: file.name.clone(),
                url: share.url.clone(),
            },
            UploadKind::File => ClientEvent::NewFile {
                name: file.name.clone(),
                url: share.url.clone(),
            },
        };
        self.events.publish(event);
        info!(
            "event=file_upload module=upload status=ok kind={:?} path={} size={}",
            kind, stat.path, stat.size
        );

        Ok(UploadReceipt {
            kind,
            name: file.name.clone(),
            path,
            url: share.url,
        })
    }
}
