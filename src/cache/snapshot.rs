//! Snapshot Persistence Module
//!
//! Whole-cache serialization to a JSON file: written after every insert,
//! read once at startup, deleted on clear.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Context;

use crate::cache::SnapshotEntry;

/// Serializes the full entry set (oldest-first) to `path`, replacing any
/// previous snapshot wholesale.
pub fn save(path: &Path, entries: &[SnapshotEntry]) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create snapshot file {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), entries)
        .with_context(|| format!("failed to encode snapshot {}", path.display()))?;
    Ok(())
}

/// Reads the snapshot at `path`.
///
/// Returns `Ok(None)` when the file does not exist; open and decode
/// problems come back as errors for the caller to log.
pub fn load(path: &Path) -> anyhow::Result<Option<Vec<SnapshotEntry>>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to open snapshot file {}", path.display()))
        }
    };
    let entries = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to decode snapshot {}", path.display()))?;
    Ok(Some(entries))
}

/// Deletes the snapshot at `path`. A missing file is not an error.
pub fn delete(path: &Path) -> anyhow::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => {
            Err(err).with_context(|| format!("failed to remove snapshot file {}", path.display()))
        }
    }
}
