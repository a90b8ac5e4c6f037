//! Static GTFS route table (`routes.txt`).

use std::convert::Infallible;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

/// One row of `routes.txt`. Columns not listed here are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteRecord {
    #[serde(default)]
    pub route_id: String,
    pub route_short_name: String,
    #[serde(default)]
    pub route_long_name: Option<String>,
}

/// Loads every route from a GTFS `routes.txt`, in file order.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a row lacks a
/// `route_short_name`.
pub fn load_routes(path: &Path) -> Result<Vec<RouteRecord>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut routes = Vec::new();
    for result in rdr.deserialize() {
        let record: RouteRecord =
            result.with_context(|| format!("parsing route in {}", path.display()))?;
        routes.push(record);
    }

    debug!(path = %path.display(), routes = routes.len(), "Routes loaded");
    Ok(routes)
}

pub fn find_by_short_name<'a>(routes: &'a [RouteRecord], short_name: &str) -> Option<&'a RouteRecord> {
    routes.iter().find(|r| r.route_short_name == short_name)
}

/// Which routes the rider asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteFilter {
    All,
    ShortName(String),
}

impl FromStr for RouteFilter {
    type Err = Infallible;

    /// Blank input, `all` and `show all routes` (any case) select every route.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if trimmed.is_empty() || lowered == "all" || lowered == "show all routes" {
            Ok(RouteFilter::All)
        } else {
            Ok(RouteFilter::ShortName(trimmed.to_string()))
        }
    }
}
