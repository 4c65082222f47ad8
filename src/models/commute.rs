// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Rider commute model with precomputed ride distances.

use crate::models::location::Location;
use crate::models::null_as_default;
use serde::{Deserialize, Serialize};

/// Walking distance and walking segments linking a commute to one ride.
///
/// Computed by the backend; field names are snake_case on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideDistance {
    pub ride_id: String,
    /// Walking distance in meters.
    pub distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<Location>,
    /// Home → pickup walking segment.
    #[serde(default)]
    pub entry_polyline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_point: Option<Location>,
    /// Dropoff → work walking segment.
    #[serde(default)]
    pub exit_polyline: String,
}

/// A rider's recurring home → work intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commute {
    #[serde(default)]
    pub commute_id: String,
    #[serde(default)]
    pub user_id: String,
    pub start_location: Location,
    pub end_location: Location,
    #[serde(default)]
    pub preferred_start_time: String,
    #[serde(default)]
    pub preferred_end_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub days_of_week: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(
        rename = "ride_distances",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub ride_distances: Vec<RideDistance>,
}

impl Commute {
    /// Precomputed distance entry for a ride, if the backend produced one.
    pub fn distance_for(&self, ride_id: &str) -> Option<&RideDistance> {
        self.ride_distances.iter().find(|d| d.ride_id == ride_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commute_with_snake_case_distances() {
        let json = r#"{
            "commuteId": "c1",
            "userId": "u1",
            "startLocation": {"latitude": 40.40, "longitude": -3.70, "address": "Home"},
            "endLocation": {"latitude": 40.45, "longitude": -3.68, "address": "Work"},
            "preferredStartTime": "08:00",
            "preferredEndTime": "17:30",
            "daysOfWeek": ["monday", "friday"],
            "ride_distances": [
                {"ride_id": "r1", "distance": 420.5,
                 "entry_point": {"latitude": 40.401, "longitude": -3.701},
                 "entry_polyline": "", "exit_polyline": ""}
            ]
        }"#;

        let commute: Commute = serde_json::from_str(json).unwrap();
        assert_eq!(commute.days_of_week.len(), 2);
        assert_eq!(commute.distance_for("r1").map(|d| d.distance), Some(420.5));
        assert!(commute.distance_for("r2").is_none());
    }
}
