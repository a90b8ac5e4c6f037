//! Fetch, cache, merge and filter pipeline for one departure query.

use std::io::{self, Write};

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use tracing::{error, info, warn};

use crate::cache::{fetch_and_cache, read_cache};
use crate::config::{Feed, Settings};
use crate::feed::merge;
use crate::fetch::HttpClient;
use crate::filter::{FilteredBus, filter_buses};
use crate::output::render_table;
use crate::routes::{RouteFilter, RouteRecord, find_by_short_name, load_routes};

/// What the rider asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripQuery {
    /// Departure instant in epoch seconds.
    pub departure: i64,
    pub route: RouteFilter,
}

impl TripQuery {
    /// Builds a query from `YYYY-MM-DD` and `HH:mm` read as wall-clock time
    /// in `tz`.
    pub fn parse<Tz: TimeZone>(date: &str, time: &str, route: &str, tz: &Tz) -> Result<Self> {
        Ok(TripQuery {
            departure: departure_epoch(date, time, tz)?,
            route: route.parse()?,
        })
    }
}

/// Converts a departure date and time to epoch seconds.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant.
///
/// # Errors
///
/// Returns an error for malformed input or a local time that does not exist
/// in `tz`.
pub fn departure_epoch<Tz: TimeZone>(date: &str, time: &str, tz: &Tz) -> Result<i64> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .with_context(|| format!("departure date '{date}' is not YYYY-MM-DD"))?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .with_context(|| format!("departure time '{time}' is not HH:mm"))?;
    let naive = NaiveDateTime::new(date, time);

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| anyhow!("{naive} does not exist in the local time zone"))
}

/// Result of a tracker run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// One of the feeds could neither be fetched nor read from cache.
    Unavailable,
    Buses(Vec<FilteredBus>),
}

pub struct Tracker<C> {
    client: C,
    settings: Settings,
}

impl<C: HttpClient> Tracker<C> {
    pub fn new(client: C, settings: Settings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Refreshes both feed caches, reads them back and filters the merged
    /// entities against the query's departure time, then reports the
    /// requested route.
    ///
    /// Both fetches finish (or fail) before either cache is read. If either
    /// cache is unavailable afterwards the run yields [`Outcome::Unavailable`].
    #[tracing::instrument(skip(self), fields(departure = query.departure))]
    pub async fn run(&self, query: &TripQuery) -> Outcome {
        let trip_updates_url = self.settings.feed_url(Feed::TripUpdates);
        let vehicle_positions_url = self.settings.feed_url(Feed::VehiclePositions);
        let trip_updates_path = self.settings.cache_path(Feed::TripUpdates);
        let vehicle_positions_path = self.settings.cache_path(Feed::VehiclePositions);

        tokio::join!(
            fetch_and_cache(&self.client, &trip_updates_url, &trip_updates_path),
            fetch_and_cache(&self.client, &vehicle_positions_url, &vehicle_positions_path),
        );

        let trip_updates = read_cache(&trip_updates_path).await;
        let vehicle_positions = read_cache(&vehicle_positions_path).await;

        let (Some(trip_updates), Some(vehicle_positions)) = (trip_updates, vehicle_positions)
        else {
            warn!("Unable to fetch or read real-time data");
            return Outcome::Unavailable;
        };

        let entities = merge(trip_updates, vehicle_positions);
        let buses = filter_buses(&entities, query.departure);
        self.resolve_route(&query.route).await;
        info!(entities = entities.len(), buses = buses.len(), "Run complete");
        Outcome::Buses(buses)
    }

    /// Looks the requested route up in the static route table.
    ///
    /// The match is reported but does not narrow the filter. The table is
    /// read on the blocking pool.
    pub async fn resolve_route(&self, route: &RouteFilter) -> Option<RouteRecord> {
        let RouteFilter::ShortName(short_name) = route else {
            return None;
        };

        let path = self.settings.routes_path().to_path_buf();
        let routes = match tokio::task::spawn_blocking(move || load_routes(&path)).await {
            Ok(Ok(routes)) => routes,
            Ok(Err(e)) => {
                error!(error = %e, "Failed to load route table");
                return None;
            }
            Err(e) => {
                error!(error = %e, "Route table task failed");
                return None;
            }
        };

        match find_by_short_name(&routes, short_name) {
            Some(record) => {
                info!(route_short_name = %short_name, route_id = %record.route_id, "Selected route");
                Some(record.clone())
            }
            None => {
                error!(route_short_name = %short_name, "Selected route not found");
                None
            }
        }
    }
}

/// Writes the run result for the rider.
pub fn present<W: Write>(outcome: &Outcome, out: &mut W) -> io::Result<()> {
    match outcome {
        Outcome::Unavailable => {
            writeln!(out, "Unable to fetch or read real-time data. Exiting.")
        }
        Outcome::Buses(buses) => {
            writeln!(out, "Data fetched from API:")?;
            render_table(buses, out)?;
            writeln!(out, "\nThanks for using the UQ Lakes station bus tracker!")
        }
    }
}
