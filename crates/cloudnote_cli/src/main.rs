//! CLI smoke entry point.
//!
//! # Responsibility
//! - Run the repositories end to end against the in-memory adapters.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Set `CLOUDNOTE_LOG_DIR` to also write the core's structured logs.

use cloudnote_core::{
    core_version, default_log_level, init_logging, ClientConfig, MemoryAccount, MemoryDatastore,
    MemoryObjectStore, NotesClient, UploadFile,
};
use std::error::Error;
use std::sync::Arc;

fn main() {
    if let Err(err) = run() {
        eprintln!("cloudnote smoke failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    if let Ok(log_dir) = std::env::var("CLOUDNOTE_LOG_DIR") {
        init_logging(default_log_level(), &log_dir)?;
    }
    println!("cloudnote_core version={}", core_version());

    let client = NotesClient::new(
        ClientConfig::default(),
        Arc::new(MemoryObjectStore::new("https://files.local")),
    );
    client.connect(&MemoryAccount::new(Arc::new(MemoryDatastore::default())))?;
    log::info!("event=cli_smoke module=cli status=connected");

    let folder = client.folders.create(None, None)?;
    let note = client.notes.create(
        "Groceries",
        &folder.id,
        Some("eggs, milk\nbread and butter"),
    )?;
    let folder = client.folders.rename(&folder, "Errands")?;
    println!(
        "folder name={} notes={}",
        folder.name,
        client.folders.get(&folder.id)?.map_or(0, |f| f.notes.len())
    );
    println!(
        "note name={} short={:?}",
        note.name,
        client.notes.get_short_content(&note, None, true)?
    );

    let theme = client.settings.create("dark_mode", false)?;
    let theme = client.settings.toggle(&theme.id)?;
    println!("setting name={} value={}", theme.name, theme.value);

    let receipt = client
        .uploads
        .upload(Some(&UploadFile::new("logo.png", "image/png", vec![0x89, 0x50])))?;
    println!("upload kind={:?} url={}", receipt.kind, receipt.url);

    client.folders.delete(&folder, true)?;
    println!(
        "after delete folders={} notes={}",
        client.folders.query(&Default::default())?.len(),
        client.notes.query(&Default::default())?.len()
    );
    Ok(())
}
