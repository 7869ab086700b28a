//! Best-effort durable snapshots.
//!
//! Both stores are written whole after every mutation and read whole at
//! startup. Nothing here returns an error: a failed load yields the default
//! value and a failed save leaves only a log line.

use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use tracing::{debug, error, info, warn};

pub fn load_or_default<T>(path: &Path, label: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No {} found at {}, starting empty", label, path.display());
            return T::default();
        }
        Err(e) => {
            warn!("Failed to read {} from {}: {}. Starting empty.", label, path.display(), e);
            return T::default();
        }
    };

    match bincode::deserialize::<T>(&bytes) {
        Ok(value) => {
            info!("Loaded {} from {} ({} bytes)", label, path.display(), bytes.len());
            value
        }
        Err(e) => {
            warn!("Corrupt {} at {}: {}. Starting empty.", label, path.display(), e);
            T::default()
        }
    }
}

/// Overwrites `path` with the encoded value. Concurrent callers are not
/// serialized against each other: the last completed write wins.
///
/// The write is blocking and happens on the caller's thread. From a request
/// handler that is a tokio worker thread.
pub fn save<T: Serialize>(path: &Path, value: &T, label: &str) -> bool {
    let bytes = match bincode::serialize(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Error encoding {}: {}", label, e);
            return false;
        }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            error!("Error saving {}: cannot create {}: {}", label, parent.display(), e);
            return false;
        }
    }

    match std::fs::write(path, &bytes) {
        Ok(()) => {
            debug!("Saved {} to {} ({} bytes)", label, path.display(), bytes.len());
            true
        }
        Err(e) => {
            error!("Error saving {}: {}", label, e);
            false
        }
    }
}
