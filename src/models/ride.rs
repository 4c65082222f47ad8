// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Ride and ride-request models.

use crate::models::location::Location;
use crate::models::null_as_default;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Lifecycle of a driver-offered ride.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    #[default]
    Active,
    Cancelled,
    Completed,
}

/// Status of a passenger on a ride.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiderStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Status of a rider's request to join a ride.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    // Older clients filter on "accepted"
    #[serde(alias = "accepted")]
    Approved,
    Rejected,
    Cancelled,
}

/// Per-passenger details stored on a ride, keyed by rider id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderDetail {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub ride_status: RiderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropoff_location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_polyline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_polyline: Option<String>,
}

/// A trip offered by a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub ride_id: String,
    #[serde(default)]
    pub driver_id: String,
    pub start_location: Location,
    pub end_location: Location,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub total_seats: u32,
    #[serde(default)]
    pub available_seats: u32,
    #[serde(default)]
    pub status: RideStatus,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub days_of_week: Vec<String>,
    /// Encoded polyline (precision 5) of the full route, when the backend has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ride_polyline: Option<String>,
    /// Ordered by rider id so iteration is stable.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub riders: BTreeMap<String, RiderDetail>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Ride {
    /// The encoded route polyline, if present and non-empty.
    pub fn polyline(&self) -> Option<&str> {
        self.ride_polyline
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Pickup points of all riders, in rider-id order.
    pub fn pickups(&self) -> impl Iterator<Item = (&str, &Location)> {
        self.riders
            .iter()
            .filter_map(|(id, r)| r.pickup_location.as_ref().map(|l| (id.as_str(), l)))
    }

    /// Dropoff points of all riders, in rider-id order.
    pub fn dropoffs(&self) -> impl Iterator<Item = (&str, &Location)> {
        self.riders
            .iter()
            .filter_map(|(id, r)| r.dropoff_location.as_ref().map(|l| (id.as_str(), l)))
    }

    /// "available/total" seat label.
    pub fn seats_label(&self) -> String {
        format!("{}/{}", self.available_seats, self.total_seats)
    }
}

/// A rider's ask to join a specific ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRequest {
    pub request_id: String,
    pub ride_id: String,
    #[serde(default)]
    pub rider_id: String,
    #[serde(default)]
    pub driver_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropoff_location: Option<Location>,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ride_deserializes_backend_shape() {
        let json = r#"{
            "rideId": "r1",
            "driverId": "d1",
            "startLocation": {"latitude": 40.41, "longitude": -3.70, "address": "Sol"},
            "endLocation": {"latitude": 40.45, "longitude": -3.69},
            "startTime": "2026-03-02T08:00:00Z",
            "endTime": "2026-03-02T08:40:00Z",
            "totalSeats": 4,
            "availableSeats": 2,
            "status": "active",
            "riders": {
                "u2": {"requestId": "q2", "rideStatus": "approved",
                       "pickupLocation": {"latitude": 40.42, "longitude": -3.70}},
                "u1": {"requestId": "q1", "rideStatus": "pending"}
            },
            "createdAt": "2026-03-01T10:00:00Z",
            "updatedAt": "2026-03-01T10:00:00Z"
        }"#;

        let ride: Ride = serde_json::from_str(json).unwrap();
        assert_eq!(ride.ride_id, "r1");
        assert_eq!(ride.polyline(), None);
        assert_eq!(ride.seats_label(), "2/4");
        let ids: Vec<&str> = ride.riders.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
        assert_eq!(ride.pickups().count(), 1);
        assert_eq!(ride.dropoffs().count(), 0);
    }

    #[test]
    fn test_null_collections_and_blank_polyline() {
        let json = r#"{
            "rideId": "r1",
            "startLocation": {"latitude": 0.0, "longitude": 0.0},
            "endLocation": {"latitude": 1.0, "longitude": 1.0},
            "riders": null,
            "daysOfWeek": null,
            "ridePolyline": "  "
        }"#;

        let ride: Ride = serde_json::from_str(json).unwrap();
        assert!(ride.riders.is_empty());
        assert!(ride.days_of_week.is_empty());
        assert_eq!(ride.polyline(), None);
        assert_eq!(ride.status, RideStatus::Active);
    }

    #[test]
    fn test_request_status_accepts_legacy_alias() {
        let status: RequestStatus = serde_json::from_str(r#""accepted""#).unwrap();
        assert_eq!(status, RequestStatus::Approved);
        assert_eq!(
            serde_json::to_string(&RequestStatus::Approved).unwrap(),
            r#""approved""#
        );
    }
}
