//! Selection of buses arriving within the departure window.

use serde::Serialize;
use tracing::{debug, trace};

use crate::feed::{FeedEntity, Position};

/// A bus is kept when its scheduled arrival is at most this many seconds
/// after the requested departure time.
pub const ARRIVAL_WINDOW_SECS: i64 = 600;

/// Projection of a feed entity onto what the rider sees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredBus {
    /// The trip's `route_id`.
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
    pub trip_id: Option<String>,
    pub headsign: Option<String>,
    pub scheduled_arrival_time: i64,
    pub live_arrival_time: Option<i64>,
    pub live_position: Option<Position>,
}

/// Keeps every entity with a `vehicle.trip` whose scheduled arrival falls at
/// or before `current_time + ARRIVAL_WINDOW_SECS`, in input order.
///
/// Entities without a trip or without a scheduled arrival time are dropped.
pub fn filter_buses(entities: &[FeedEntity], current_time: i64) -> Vec<FilteredBus> {
    let deadline = current_time.saturating_add(ARRIVAL_WINDOW_SECS);

    let buses: Vec<FilteredBus> = entities
        .iter()
        .filter_map(|entity| {
            let vehicle = entity.vehicle.as_ref()?;
            let trip = vehicle.trip.as_ref()?;
            let Some(scheduled) = trip.scheduled_arrival_time else {
                trace!(entity_id = ?entity.id, "Trip has no scheduled arrival time");
                return None;
            };
            if scheduled > deadline {
                return None;
            }

            Some(FilteredBus {
                route_short_name: trip.route_id.clone(),
                route_long_name: trip.route_long_name.clone(),
                trip_id: trip.trip_id.clone(),
                headsign: trip.trip_headsign.clone(),
                scheduled_arrival_time: scheduled,
                live_arrival_time: trip.live_arrival_time,
                live_position: vehicle.position,
            })
        })
        .collect();

    debug!(
        entities = entities.len(),
        matched = buses.len(),
        deadline,
        "Filtered buses"
    );
    buses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{TripDescriptor, VehiclePosition, merge};
    use serde_json::json;

    fn bus_entity(trip_id: &str, scheduled: Option<i64>) -> FeedEntity {
        FeedEntity {
            id: Some(trip_id.to_string()),
            vehicle: Some(VehiclePosition {
                trip: Some(TripDescriptor {
                    route_id: Some("66".to_string()),
                    trip_id: Some(trip_id.to_string()),
                    scheduled_arrival_time: scheduled,
                    ..Default::default()
                }),
                ..Default::default()
            }),
        }
    }

    fn trip_ids(buses: &[FilteredBus]) -> Vec<&str> {
        buses.iter().filter_map(|b| b.trip_id.as_deref()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_buses(&[], 1_000).is_empty());
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let entities = vec![
            bus_entity("early", Some(100)),
            bus_entity("edge", Some(1_600)),
            bus_entity("late", Some(1_601)),
        ];

        let buses = filter_buses(&entities, 1_000);
        assert_eq!(trip_ids(&buses), vec!["early", "edge"]);
    }

    #[test]
    fn test_missing_scheduled_time_is_excluded() {
        let entities = vec![bus_entity("unknown", None), bus_entity("known", Some(10))];

        let buses = filter_buses(&entities, 0);
        assert_eq!(trip_ids(&buses), vec!["known"]);
    }

    #[test]
    fn test_entities_without_trip_are_skipped() {
        let entities = vec![
            FeedEntity::default(),
            FeedEntity {
                id: Some("no-trip".to_string()),
                vehicle: Some(VehiclePosition::default()),
            },
            bus_entity("T1", Some(0)),
        ];

        let with_trip = entities.iter().filter(|e| e.trip().is_some()).count();
        let buses = filter_buses(&entities, 0);
        assert!(buses.len() <= with_trip);
        assert_eq!(trip_ids(&buses), vec!["T1"]);
    }

    #[test]
    fn test_projection_carries_optional_fields() {
        let entities = merge(
            json!({"entity": [{
                "vehicle": {
                    "trip": {
                        "route_id": "169",
                        "route_long_name": "UQ Lakes - Eight Mile Plains",
                        "trip_id": "T9",
                        "trip_headsign": "Eight Mile Plains",
                        "scheduledArrivalTime": 500,
                        "liveArrivalTime": 530
                    },
                    "position": {"latitude": -27.5, "longitude": 153.0}
                }
            }]}),
            json!([]),
        );

        let buses = filter_buses(&entities, 0);
        assert_eq!(
            buses,
            vec![FilteredBus {
                route_short_name: Some("169".to_string()),
                route_long_name: Some("UQ Lakes - Eight Mile Plains".to_string()),
                trip_id: Some("T9".to_string()),
                headsign: Some("Eight Mile Plains".to_string()),
                scheduled_arrival_time: 500,
                live_arrival_time: Some(530),
                live_position: Some(Position {
                    latitude: -27.5,
                    longitude: 153.0
                }),
            }]
        );
    }

    #[test]
    fn test_route_66_scenario() {
        let entities = merge(
            json!({"entity": [{"vehicle": {"trip": {
                "route_id": "66", "trip_id": "T1", "scheduledArrivalTime": 1000
            }}}]}),
            json!([]),
        );

        assert_eq!(trip_ids(&filter_buses(&entities, 500)), vec!["T1"]);
        assert!(filter_buses(&entities, 300).is_empty());
    }

    #[test]
    fn test_filter_is_repeatable() {
        let entities = vec![bus_entity("a", Some(5)), bus_entity("b", Some(50_000))];

        assert_eq!(filter_buses(&entities, 100), filter_buses(&entities, 100));
    }

    #[test]
    fn test_window_does_not_overflow() {
        let entities = vec![bus_entity("max", Some(i64::MAX))];

        assert_eq!(trip_ids(&filter_buses(&entities, i64::MAX)), vec!["max"]);
    }
}
