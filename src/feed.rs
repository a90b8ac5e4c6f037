//! Realtime feed payloads and the entity records extracted from them.
//!
//! Feeds arrive as loosely shaped JSON: either a bare list of entities or an
//! object carrying an `entity` list. Individual entities are read field by
//! field with explicit presence checks, so a missing or mistyped field only
//! ever becomes `None`.

use serde::Serialize;
use serde_json::{Map, Value};

/// The shape of a feed body as fetched or read back from the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedPayload {
    /// A bare JSON array of entities.
    List(Vec<Value>),
    /// An object exposing an `entity` array.
    Wrapped { entity: Vec<Value> },
    /// Anything else; contributes no entities.
    Other,
}

impl FeedPayload {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => FeedPayload::List(items),
            Value::Object(mut map) => match map.remove("entity") {
                Some(Value::Array(entity)) => FeedPayload::Wrapped { entity },
                _ => FeedPayload::Other,
            },
            _ => FeedPayload::Other,
        }
    }
}

/// Flattens a payload into its entities, preserving feed order.
pub fn normalize(payload: FeedPayload) -> Vec<FeedEntity> {
    let items = match payload {
        FeedPayload::List(items) => items,
        FeedPayload::Wrapped { entity } => entity,
        FeedPayload::Other => Vec::new(),
    };
    items.iter().map(FeedEntity::from_json).collect()
}

/// Trip-update entities followed by vehicle-position entities.
pub fn merge(trip_updates: Value, vehicle_positions: Value) -> Vec<FeedEntity> {
    let mut entities = normalize(FeedPayload::from_value(trip_updates));
    entities.extend(normalize(FeedPayload::from_value(vehicle_positions)));
    entities
}

/// One record in a realtime feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedEntity {
    pub id: Option<String>,
    pub vehicle: Option<VehiclePosition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VehiclePosition {
    pub trip: Option<TripDescriptor>,
    pub position: Option<Position>,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TripDescriptor {
    pub route_id: Option<String>,
    pub route_long_name: Option<String>,
    pub trip_id: Option<String>,
    pub trip_headsign: Option<String>,
    /// Epoch seconds.
    pub scheduled_arrival_time: Option<i64>,
    /// Epoch seconds.
    pub live_arrival_time: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl FeedEntity {
    /// Reads an entity from arbitrary JSON. Non-objects yield an empty entity.
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return FeedEntity::default();
        };

        FeedEntity {
            id: string_field(obj, &["id"]),
            vehicle: obj
                .get("vehicle")
                .and_then(Value::as_object)
                .map(VehiclePosition::from_map),
        }
    }

    /// The trip descriptor under `vehicle.trip`, if any.
    pub fn trip(&self) -> Option<&TripDescriptor> {
        self.vehicle.as_ref()?.trip.as_ref()
    }
}

impl VehiclePosition {
    fn from_map(obj: &Map<String, Value>) -> Self {
        VehiclePosition {
            trip: obj
                .get("trip")
                .and_then(Value::as_object)
                .map(TripDescriptor::from_map),
            position: obj
                .get("position")
                .and_then(Value::as_object)
                .and_then(Position::from_map),
            timestamp: epoch_field(obj, &["timestamp"]),
        }
    }
}

impl TripDescriptor {
    fn from_map(obj: &Map<String, Value>) -> Self {
        TripDescriptor {
            route_id: string_field(obj, &["route_id", "routeId"]),
            route_long_name: string_field(obj, &["route_long_name", "routeLongName"]),
            trip_id: string_field(obj, &["trip_id", "tripId"]),
            trip_headsign: string_field(obj, &["trip_headsign", "tripHeadsign"]),
            scheduled_arrival_time: epoch_field(
                obj,
                &["scheduledArrivalTime", "scheduled_arrival_time", "arrival_time"],
            ),
            live_arrival_time: epoch_field(obj, &["liveArrivalTime", "live_arrival_time"]),
        }
    }
}

impl Position {
    /// Both coordinates must be present and numeric.
    fn from_map(obj: &Map<String, Value>) -> Option<Self> {
        let latitude = obj.get("latitude").and_then(number)?;
        let longitude = obj.get("longitude").and_then(number)?;
        Some(Position {
            latitude,
            longitude,
        })
    }
}

/// First key present with a string (or number rendered as text) value.
fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First key holding an epoch: a JSON integer, float or numeric string.
fn epoch_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
