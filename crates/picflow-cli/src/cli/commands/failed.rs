//! `picflow failed` – list the failure journal.

use anyhow::Result;
use picflow_core::config::PicflowConfig;
use picflow_core::journal::FailureJournal;

use super::journal_path;

pub fn run_failed(cfg: &PicflowConfig) -> Result<()> {
    let journal = FailureJournal::open(journal_path(cfg)?)?;
    let entries = journal.get();
    if entries.is_empty() {
        println!("No failed albums.");
        return Ok(());
    }
    println!("{:<16} {:<12} {:<5} {}", "ID", "TAG", "PICS", "TITLE");
    for album in entries.values() {
        println!(
            "{:<16} {:<12} {:<5} {}",
            album.id,
            album.tag,
            album.urls.len(),
            album.title
        );
    }
    println!("{} failed album(s) in {}", entries.len(), journal.path().display());
    Ok(())
}
