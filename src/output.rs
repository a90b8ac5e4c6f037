//! Presentation and export of filtered buses.
//!
//! Supports a console table and CSV append.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Local};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::filter::FilteredBus;

const HEADERS: [&str; 8] = [
    "(index)",
    "route",
    "route name",
    "trip",
    "headsign",
    "scheduled",
    "live",
    "position",
];

const MISSING: &str = "-";

/// Epoch seconds alongside the local wall-clock time.
fn format_epoch(secs: i64) -> String {
    match DateTime::from_timestamp(secs, 0) {
        Some(dt) => format!("{} ({})", secs, dt.with_timezone(&Local).format("%H:%M:%S")),
        None => secs.to_string(),
    }
}

fn cells(index: usize, bus: &FilteredBus) -> [String; 8] {
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| MISSING.to_string());
    [
        index.to_string(),
        text(&bus.route_short_name),
        text(&bus.route_long_name),
        text(&bus.trip_id),
        text(&bus.headsign),
        format_epoch(bus.scheduled_arrival_time),
        bus.live_arrival_time
            .map(format_epoch)
            .unwrap_or_else(|| MISSING.to_string()),
        bus.live_position
            .map(|p| format!("{:.5}, {:.5}", p.latitude, p.longitude))
            .unwrap_or_else(|| MISSING.to_string()),
    ]
}

/// Writes a fixed-width table with one row per bus.
pub fn render_table<W: Write>(buses: &[FilteredBus], out: &mut W) -> io::Result<()> {
    let rows: Vec<[String; 8]> = buses
        .iter()
        .enumerate()
        .map(|(i, bus)| cells(i, bus))
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    write_row(out, &HEADERS, &widths)?;
    writeln!(out, "|-{}-|", separator.join("-|-"))?;
    for row in &rows {
        let row: Vec<&str> = row.iter().map(String::as_str).collect();
        write_row(out, &row, &widths)?;
    }
    Ok(())
}

fn write_row<W: Write>(out: &mut W, row: &[&str], widths: &[usize]) -> io::Result<()> {
    let padded: Vec<String> = row
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    writeln!(out, "| {} |", padded.join(" | "))
}

/// Flat CSV shape of a [`FilteredBus`].
#[derive(Debug, Serialize)]
struct BusRow<'a> {
    route_short_name: Option<&'a str>,
    route_long_name: Option<&'a str>,
    trip_id: Option<&'a str>,
    headsign: Option<&'a str>,
    scheduled_arrival_time: i64,
    live_arrival_time: Option<i64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl<'a> From<&'a FilteredBus> for BusRow<'a> {
    fn from(bus: &'a FilteredBus) -> Self {
        BusRow {
            route_short_name: bus.route_short_name.as_deref(),
            route_long_name: bus.route_long_name.as_deref(),
            trip_id: bus.trip_id.as_deref(),
            headsign: bus.headsign.as_deref(),
            scheduled_arrival_time: bus.scheduled_arrival_time,
            live_arrival_time: bus.live_arrival_time,
            latitude: bus.live_position.map(|p| p.latitude),
            longitude: bus.live_position.map(|p| p.longitude),
        }
    }
}

/// Appends a [`FilteredBus`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &Path, bus: &FilteredBus) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(BusRow::from(bus))?;
    writer.flush()?;

    Ok(())
}
