//! Runtime settings for the tracker.
//!
//! Values come from the environment (optionally via a `.env` file) and fall
//! back to the local feed server and on-disk layout the tracker expects.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::fetch::DEFAULT_TIMEOUT;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5343";
pub const DEFAULT_CACHE_DIR: &str = "./cached-data";
pub const DEFAULT_ROUTES_PATH: &str = "static-data/routes.txt";

/// The two realtime feeds the tracker consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    TripUpdates,
    VehiclePositions,
}

impl Feed {
    pub fn name(self) -> &'static str {
        match self {
            Feed::TripUpdates => "trip_updates",
            Feed::VehiclePositions => "vehicle_positions",
        }
    }

    /// Endpoint path relative to the feed server.
    pub fn endpoint(self) -> String {
        format!("/gtfs/seq/{}.json", self.name())
    }

    pub fn cache_file(self) -> String {
        format!("{}.json", self.name())
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub cache_dir: PathBuf,
    pub routes_path: PathBuf,
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            routes_path: PathBuf::from(DEFAULT_ROUTES_PATH),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Settings {
    /// Reads `TRACKER_BASE_URL`, `TRACKER_CACHE_DIR`, `TRACKER_ROUTES_PATH`
    /// and `TRACKER_TIMEOUT_SECS`, keeping defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Settings::default();

        if let Some(url) = lookup("TRACKER_BASE_URL") {
            settings.base_url = url;
        }
        if let Some(dir) = lookup("TRACKER_CACHE_DIR") {
            settings.cache_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("TRACKER_ROUTES_PATH") {
            settings.routes_path = PathBuf::from(path);
        }
        if let Some(secs) = lookup("TRACKER_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("TRACKER_TIMEOUT_SECS must be whole seconds, got '{secs}'"))?;
            if secs == 0 {
                bail!("TRACKER_TIMEOUT_SECS must be at least 1 second");
            }
            settings.timeout = Duration::from_secs(secs);
        }

        Ok(settings)
    }

    pub fn feed_url(&self, feed: Feed) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), feed.endpoint())
    }

    pub fn cache_path(&self, feed: Feed) -> PathBuf {
        self.cache_dir.join(feed.cache_file())
    }

    pub fn routes_path(&self) -> &Path {
        &self.routes_path
    }
}
