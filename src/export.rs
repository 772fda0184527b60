//! Tabular export of purchase events
//!
//! Writes one CSV row per [`PurchaseEvent`] with the columns `amount_crypto`,
//! `amount_fiat` and `date` for analysis outside this tool.

use crate::models::PurchaseEvent;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Serialize `events` as CSV into any writer
pub fn write_purchases<W: Write>(writer: W, events: &[PurchaseEvent]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for event in events {
        csv_writer
            .serialize(event)
            .context("Failed to serialize purchase event")?;
    }
    csv_writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Write `events` to `<directory>/<file_name>`, creating the directory if needed
pub fn export_purchases(
    directory: &Path,
    file_name: &str,
    events: &[PurchaseEvent],
) -> Result<PathBuf> {
    fs::create_dir_all(directory).with_context(|| {
        format!("Failed to create stats directory: {}", directory.display())
    })?;

    let path = directory.join(file_name);
    let file = fs::File::create(&path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    write_purchases(file, events)?;

    info!(path = %path.display(), rows = events.len(), "Exported purchase events");
    Ok(path)
}
