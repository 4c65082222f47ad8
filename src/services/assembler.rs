// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map and rides-list view-model assembly.
//!
//! Reconciles the current selection, the rider's commute and the candidate
//! rides into one render-ready [`AssembledView`]. Pure: no I/O, never fails.
//! Missing data degrades to placeholders and empty collections.

use crate::models::{
    AssembledView, Commute, LatLng, Location, MapView, Marker, MarkerKind, PolylineKind, Ride,
    RideList, RideListItem, RideRequest, RoutePolyline, Selection,
};
use crate::services::filter::{
    filter_candidates, format_distance, Candidate, ListKind, UnmatchedRidePolicy,
    DEFAULT_MAX_WALKING_DISTANCE_M,
};
use crate::services::route::{bounds_of, decode_or_skip, derive_route_points};
use crate::time_utils::{display_time, TIME_NOT_SPECIFIED};
use serde::Deserialize;

/// Map centre used when nothing is rendered.
pub const DEFAULT_MAP_CENTER: LatLng = LatLng {
    latitude: 51.505,
    longitude: -0.09,
};

/// Snapshot of everything the view depends on.
#[derive(Debug, Clone, Deserialize)]
pub struct AssemblyInput {
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub commute: Option<Commute>,
    #[serde(default)]
    pub candidate_rides: Vec<Ride>,
    #[serde(default = "default_max_walking_distance")]
    pub max_walking_distance_m: f64,
    /// The ride a selected request refers to, when it could be loaded.
    #[serde(default)]
    pub request_ride: Option<Ride>,
    /// Whether the rider of a selected request has a commute.
    #[serde(default)]
    pub request_rider_has_commute: bool,
    #[serde(default)]
    pub list_kind: ListKind,
}

fn default_max_walking_distance() -> f64 {
    DEFAULT_MAX_WALKING_DISTANCE_M
}

impl Default for AssemblyInput {
    fn default() -> Self {
        Self {
            selection: Selection::None,
            commute: None,
            candidate_rides: Vec::new(),
            max_walking_distance_m: DEFAULT_MAX_WALKING_DISTANCE_M,
            request_ride: None,
            request_rider_has_commute: false,
            list_kind: ListKind::Available,
        }
    }
}

/// Deployment-level assembly settings.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyOptions {
    pub unmatched: UnmatchedRidePolicy,
    pub default_center: LatLng,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            unmatched: UnmatchedRidePolicy::Include,
            default_center: DEFAULT_MAP_CENTER,
        }
    }
}

/// Assemble the map and the rides list.
pub fn assemble(input: &AssemblyInput, options: &AssemblyOptions) -> AssembledView {
    let map = assemble_map(input, options);
    let rides = build_ride_list(
        input.list_kind,
        &input.candidate_rides,
        input.commute.as_ref(),
        input.max_walking_distance_m,
        options.unmatched,
        input.selection.ride().map(|r| r.ride_id.as_str()),
    );

    tracing::debug!(
        markers = map.markers.len(),
        polylines = map.polylines.len(),
        candidates = input.candidate_rides.len(),
        listed = rides.items.len(),
        "Assembled view"
    );

    AssembledView { map, rides }
}

/// Assemble markers, polylines and bounds for the map.
pub fn assemble_map(input: &AssemblyInput, options: &AssemblyOptions) -> MapView {
    let mut markers = selection_markers(&input.selection, input.request_ride.as_ref());
    if let Some(commute) = &input.commute {
        markers.extend(commute_markers(commute));
    }

    let mut polylines = Vec::new();

    let route = derive_route_points(
        &input.selection,
        input.request_ride.as_ref(),
        input.request_rider_has_commute,
    );
    // A single point is not a line.
    if route.len() >= 2 {
        polylines.push(RoutePolyline {
            kind: PolylineKind::Route,
            points: route,
        });
    }

    let distance = input
        .commute
        .as_ref()
        .zip(input.selection.ride_id())
        .and_then(|(commute, ride_id)| commute.distance_for(ride_id));
    if let Some(distance) = distance {
        let overlays = [
            (PolylineKind::Entry, distance.entry_polyline.as_str(), "entry"),
            (PolylineKind::Exit, distance.exit_polyline.as_str(), "exit"),
        ];
        for (kind, encoded, what) in overlays {
            if let Some(points) = decode_or_skip(Some(encoded), what).filter(|p| !p.is_empty()) {
                polylines.push(RoutePolyline { kind, points });
            }
        }
    }

    let bounds = bounds_of(
        markers
            .iter()
            .map(|m| &m.position)
            .chain(polylines.iter().flat_map(|p| p.points.iter())),
    );
    let center = bounds.map(|b| b.center()).unwrap_or(options.default_center);

    MapView {
        markers,
        polylines,
        bounds,
        center,
    }
}

/// Build the rides list, filtering available rides by walking distance.
pub fn build_ride_list(
    kind: ListKind,
    rides: &[Ride],
    commute: Option<&Commute>,
    max_walking_distance_m: f64,
    unmatched: UnmatchedRidePolicy,
    selected_ride_id: Option<&str>,
) -> RideList {
    let candidates = if kind.filters_by_distance() {
        filter_candidates(rides, commute, max_walking_distance_m, unmatched)
    } else {
        rides
            .iter()
            .map(|ride| Candidate {
                ride,
                distance: commute.and_then(|c| c.distance_for(&ride.ride_id)),
            })
            .collect()
    };

    let items: Vec<RideListItem> = candidates
        .into_iter()
        .map(|c| RideListItem {
            ride_id: c.ride.ride_id.clone(),
            from: c.ride.start_location.label().to_string(),
            to: c.ride.end_location.label().to_string(),
            start_time: display_time(&c.ride.start_time),
            seats: c.ride.seats_label(),
            walking_distance_m: c.distance.map(|d| d.distance),
            walking_distance_label: c.distance.map(|d| format_distance(d.distance)),
            selected: selected_ride_id == Some(c.ride.ride_id.as_str()),
        })
        .collect();

    let empty_message = items
        .is_empty()
        .then(|| kind.empty_message().to_string());

    RideList {
        items,
        max_walking_distance_m,
        empty_message,
    }
}

fn selection_markers(selection: &Selection, request_ride: Option<&Ride>) -> Vec<Marker> {
    match selection {
        Selection::None => Vec::new(),
        Selection::Ride(ride) => ride_markers(ride),
        Selection::Request(request) => request_markers(request, request_ride),
    }
}

fn ride_markers(ride: &Ride) -> Vec<Marker> {
    let mut markers = vec![
        timed_marker(
            MarkerKind::Start,
            &ride.start_location,
            display_time(&ride.start_time),
        ),
        timed_marker(
            MarkerKind::End,
            &ride.end_location,
            display_time(&ride.end_time),
        ),
    ];

    let stops = ride
        .pickups()
        .map(|stop| (MarkerKind::Pickup, stop))
        .chain(ride.dropoffs().map(|stop| (MarkerKind::Dropoff, stop)));
    for (kind, (rider_id, location)) in stops {
        markers.push(Marker {
            kind,
            position: location.position(),
            label: location.label().to_string(),
            time: None,
            rider_id: Some(rider_id.to_string()),
        });
    }

    markers
}

/// A request is drawn from its pickup to its dropoff, falling back to the
/// ride's endpoints when the request does not carry them.
fn request_markers(request: &RideRequest, ride: Option<&Ride>) -> Vec<Marker> {
    let time = |raw: Option<&String>| {
        raw.map(|t| display_time(t))
            .unwrap_or_else(|| TIME_NOT_SPECIFIED.to_string())
    };

    let start = request
        .pickup_location
        .as_ref()
        .or(ride.map(|r| &r.start_location));
    let end = request
        .dropoff_location
        .as_ref()
        .or(ride.map(|r| &r.end_location));

    let mut markers = Vec::new();
    if let Some(location) = start {
        markers.push(timed_marker(
            MarkerKind::Start,
            location,
            time(ride.map(|r| &r.start_time)),
        ));
    }
    if let Some(location) = end {
        markers.push(timed_marker(
            MarkerKind::End,
            location,
            time(ride.map(|r| &r.end_time)),
        ));
    }
    markers
}

fn commute_markers(commute: &Commute) -> [Marker; 2] {
    [
        timed_marker(
            MarkerKind::Home,
            &commute.start_location,
            display_time(&commute.preferred_start_time),
        ),
        timed_marker(
            MarkerKind::Work,
            &commute.end_location,
            display_time(&commute.preferred_end_time),
        ),
    ]
}

fn timed_marker(kind: MarkerKind, location: &Location, time: String) -> Marker {
    Marker {
        kind,
        position: location.position(),
        label: location.label().to_string(),
        time: Some(time),
        rider_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::location::UNKNOWN_LOCATION;
    use crate::models::RideDistance;

    fn ride(id: &str) -> Ride {
        Ride {
            ride_id: id.to_string(),
            driver_id: "d1".to_string(),
            start_location: Location::new(40.40, -3.70, Some("Sol")),
            end_location: Location::new(40.45, -3.69, None),
            start_time: "2026-03-02T08:00:00Z".to_string(),
            end_time: String::new(),
            total_seats: 4,
            available_seats: 2,
            status: Default::default(),
            days_of_week: vec![],
            ride_polyline: None,
            riders: Default::default(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_ride_markers_use_placeholders() {
        let input = AssemblyInput {
            selection: Selection::Ride(ride("r1")),
            ..Default::default()
        };
        let map = assemble_map(&input, &AssemblyOptions::default());

        let start = map.marker(MarkerKind::Start).unwrap();
        assert_eq!(start.label, "Sol");
        assert_eq!(start.time.as_deref(), Some("2026-03-02 08:00 UTC"));

        let end = map.marker(MarkerKind::End).unwrap();
        assert_eq!(end.label, UNKNOWN_LOCATION);
        assert_eq!(end.time.as_deref(), Some(TIME_NOT_SPECIFIED));
    }

    #[test]
    fn test_request_markers_fall_back_to_ride_endpoints() {
        let request = RideRequest {
            request_id: "q1".to_string(),
            ride_id: "r1".to_string(),
            rider_id: "u1".to_string(),
            driver_id: "d1".to_string(),
            pickup_location: Some(Location::new(40.41, -3.70, Some("Gran Via"))),
            dropoff_location: None,
            status: Default::default(),
            created_at: String::new(),
            updated_at: None,
        };

        let input = AssemblyInput {
            selection: Selection::Request(request.clone()),
            ..Default::default()
        };
        let map = assemble_map(&input, &AssemblyOptions::default());
        assert_eq!(map.markers.len(), 1);
        assert_eq!(
            map.marker(MarkerKind::Start).unwrap().time.as_deref(),
            Some(TIME_NOT_SPECIFIED)
        );

        let input = AssemblyInput {
            selection: Selection::Request(request),
            request_ride: Some(ride("r1")),
            ..Default::default()
        };
        let map = assemble_map(&input, &AssemblyOptions::default());
        assert_eq!(map.markers.len(), 2);
        assert_eq!(map.marker(MarkerKind::Start).unwrap().label, "Gran Via");
        assert_eq!(
            map.marker(MarkerKind::End).unwrap().position,
            LatLng::new(40.45, -3.69)
        );
    }

    #[test]
    fn test_walking_overlays_for_selected_ride() {
        let entry = polyline::encode_coordinates(
            vec![
                geo::Coord { x: -3.71, y: 40.39 },
                geo::Coord { x: -3.70, y: 40.40 },
            ],
            5,
        )
        .unwrap();

        let commute = Commute {
            commute_id: "c1".to_string(),
            user_id: "u1".to_string(),
            start_location: Location::new(40.39, -3.71, Some("Home")),
            end_location: Location::new(40.46, -3.68, Some("Work")),
            preferred_start_time: "08:00".to_string(),
            preferred_end_time: String::new(),
            days_of_week: vec![],
            created_at: String::new(),
            updated_at: String::new(),
            ride_distances: vec![RideDistance {
                ride_id: "r1".to_string(),
                distance: 300.0,
                entry_point: None,
                entry_polyline: entry,
                exit_point: None,
                exit_polyline: "invalid!!!".to_string(),
            }],
        };

        let input = AssemblyInput {
            selection: Selection::Ride(ride("r1")),
            commute: Some(commute),
            ..Default::default()
        };
        let map = assemble_map(&input, &AssemblyOptions::default());

        assert!(map.polyline(PolylineKind::Route).is_some());
        assert_eq!(map.polyline(PolylineKind::Entry).unwrap().points.len(), 2);
        assert!(map.polyline(PolylineKind::Exit).is_none());
        assert_eq!(
            map.marker(MarkerKind::Home).unwrap().time.as_deref(),
            Some("08:00")
        );
        assert!(map.marker(MarkerKind::Work).is_some());

        let bounds = map.bounds.unwrap();
        assert_eq!(bounds.south, 40.39);
        assert_eq!(bounds.north, 40.46);
    }

    #[test]
    fn test_driver_list_is_not_distance_filtered() {
        let rides = vec![ride("r1"), ride("r2")];
        let list = build_ride_list(
            ListKind::Driver,
            &rides,
            None,
            100.0,
            UnmatchedRidePolicy::Exclude,
            Some("r2"),
        );
        assert_eq!(list.items.len(), 2);
        assert!(!list.items[0].selected);
        assert!(list.items[1].selected);
        assert_eq!(list.items[0].seats, "2/4");
        assert_eq!(list.empty_message, None);
    }

    #[test]
    fn test_empty_available_list_message() {
        let list = build_ride_list(
            ListKind::Available,
            &[],
            None,
            1000.0,
            UnmatchedRidePolicy::Include,
            None,
        );
        assert!(list.items.is_empty());
        assert_eq!(
            list.empty_message.as_deref(),
            Some("No rides found. Try increasing the maximum walking distance.")
        );
    }

    #[test]
    fn test_input_defaults_from_json() {
        let input: AssemblyInput = serde_json::from_str("{}").unwrap();
        assert!(input.selection.is_none());
        assert_eq!(input.max_walking_distance_m, DEFAULT_MAX_WALKING_DISTANCE_M);
        assert_eq!(input.list_kind, ListKind::Available);
    }
}
