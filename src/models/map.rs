// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Render-ready map and list view models.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// GeoJSON position (`[lng, lat]`).
    fn position(&self) -> Vec<f64> {
        vec![self.longitude, self.latitude]
    }
}

// geo uses x = longitude, y = latitude.
impl From<geo::Coord<f64>> for LatLng {
    fn from(coord: geo::Coord<f64>) -> Self {
        Self::new(coord.y, coord.x)
    }
}

impl From<LatLng> for geo::Point<f64> {
    fn from(p: LatLng) -> Self {
        geo::Point::new(p.longitude, p.latitude)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn contains(&self, p: &LatLng) -> bool {
        (self.south..=self.north).contains(&p.latitude)
            && (self.west..=self.east).contains(&p.longitude)
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// GeoJSON bbox order: west, south, east, north.
    fn bbox(&self) -> Vec<f64> {
        vec![self.west, self.south, self.east, self.north]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Start,
    End,
    Pickup,
    Dropoff,
    Home,
    Work,
}

/// A labelled point on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Marker {
    pub kind: MarkerKind,
    pub position: LatLng,
    pub label: String,
    /// Display time; only start/end and home/work markers carry one.
    pub time: Option<String>,
    /// Set on pickup/dropoff markers.
    pub rider_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum PolylineKind {
    /// Primary driving route.
    Route,
    /// Walking segment home → pickup.
    Entry,
    /// Walking segment dropoff → work.
    Exit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RoutePolyline {
    pub kind: PolylineKind,
    pub points: Vec<LatLng>,
}

/// Everything the map component renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MapView {
    pub markers: Vec<Marker>,
    pub polylines: Vec<RoutePolyline>,
    /// `None` when nothing is rendered; the client then uses `center`.
    pub bounds: Option<Bounds>,
    pub center: LatLng,
}

impl MapView {
    pub fn marker(&self, kind: MarkerKind) -> Option<&Marker> {
        self.markers.iter().find(|m| m.kind == kind)
    }

    pub fn polyline(&self, kind: PolylineKind) -> Option<&RoutePolyline> {
        self.polylines.iter().find(|p| p.kind == kind)
    }

    /// Markers as Point features and polylines as LineString features.
    pub fn to_geojson(&self) -> FeatureCollection {
        let markers = self.markers.iter().map(|m| {
            let mut properties = JsonObject::new();
            properties.insert("kind".to_string(), serde_json::json!(m.kind));
            properties.insert("label".to_string(), serde_json::json!(m.label));
            if let Some(time) = &m.time {
                properties.insert("time".to_string(), serde_json::json!(time));
            }
            if let Some(rider_id) = &m.rider_id {
                properties.insert("rider_id".to_string(), serde_json::json!(rider_id));
            }
            feature(Value::Point(m.position.position()), properties)
        });

        let lines = self.polylines.iter().map(|p| {
            let mut properties = JsonObject::new();
            properties.insert("kind".to_string(), serde_json::json!(p.kind));
            feature(
                Value::LineString(p.points.iter().map(LatLng::position).collect()),
                properties,
            )
        });

        FeatureCollection {
            bbox: self.bounds.as_ref().map(Bounds::bbox),
            features: markers.chain(lines).collect(),
            foreign_members: None,
        }
    }
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// One row of the rides list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RideListItem {
    pub ride_id: String,
    pub from: String,
    pub to: String,
    pub start_time: String,
    pub seats: String,
    /// Walking distance in meters, when the backend computed one.
    pub walking_distance_m: Option<f64>,
    pub walking_distance_label: Option<String>,
    pub selected: bool,
}

/// Filtered rides list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RideList {
    pub items: Vec<RideListItem>,
    pub max_walking_distance_m: f64,
    /// Shown instead of the list when it is empty.
    pub empty_message: Option<String>,
}

/// Map plus list, computed together from one input snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AssembledView {
    pub map: MapView,
    pub rides: RideList,
}
