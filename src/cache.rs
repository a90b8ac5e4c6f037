//! On-disk copy of the last successfully fetched body of each feed.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::fetch::{HttpClient, fetch_json};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to serialize cache value: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cache I/O on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Overwrites the cache file at `path` with `value`.
///
/// The JSON is written to a sibling temp file and renamed into place, so a
/// reader sees either the previous contents or the new ones. Missing parent
/// directories are created.
pub async fn write_cache(path: &Path, value: &Value) -> Result<(), CacheError> {
    let json = serde_json::to_vec(value)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io_error(parent))?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &json).await.map_err(io_error(&tmp))?;
    tokio::fs::rename(&tmp, path).await.map_err(io_error(path))?;

    debug!(path = %path.display(), bytes = json.len(), "Cache written");
    Ok(())
}

/// Reads and parses the cache file at `path`.
///
/// Returns `None` when the file is missing, unreadable, not JSON or holds no
/// data; the reason is logged.
pub async fn read_cache(path: &Path) -> Option<Value> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "No cached data");
            return None;
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Error reading cached data");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) if is_no_data(&value) => {
            warn!(path = %path.display(), "Cached data is empty");
            None
        }
        Ok(value) => Some(value),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Cached data is not valid JSON");
            None
        }
    }
}

/// `null`, `false`, `0` and `""` carry no feed and never replace a cache.
fn is_no_data(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Fetches `url` and, on success, replaces the cache at `path`.
///
/// Returns whether the cache was refreshed. A failed fetch or write is logged
/// and leaves the previous cache file in place.
#[tracing::instrument(skip(client, path), fields(path = %path.display()))]
pub async fn fetch_and_cache<C: HttpClient>(client: &C, url: &str, path: &Path) -> bool {
    let value = match fetch_json(client, url).await {
        Ok(value) => value,
        Err(e) => {
            error!(error = %e, "Error fetching real-time data");
            return false;
        }
    };
    if is_no_data(&value) {
        warn!(body = %value, "Feed returned no data, keeping previous cache");
        return false;
    }

    match write_cache(path, &value).await {
        Ok(()) => {
            info!("Cache refreshed");
            true
        }
        Err(e) => {
            error!(error = %e, "Failed to write cache");
            false
        }
    }
}
