// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Walking-distance filtering of candidate rides.

use crate::models::{Commute, Ride, RideDistance};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default walking-distance threshold (meters).
pub const DEFAULT_MAX_WALKING_DISTANCE_M: f64 = 1000.0;

/// What to do with rides that have no precomputed distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedRidePolicy {
    #[default]
    Include,
    Exclude,
}

impl FromStr for UnmatchedRidePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "include" => Ok(Self::Include),
            "exclude" => Ok(Self::Exclude),
            other => Err(format!("expected 'include' or 'exclude', got '{}'", other)),
        }
    }
}

/// Which rides list is being shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// Rides the user could join; filtered by walking distance.
    #[default]
    Available,
    /// Rides the user drives.
    Driver,
    /// Rides the user is a passenger on.
    Rider,
}

impl ListKind {
    pub fn filters_by_distance(self) -> bool {
        matches!(self, ListKind::Available)
    }

    pub fn empty_message(self) -> &'static str {
        match self {
            ListKind::Available => "No rides found. Try increasing the maximum walking distance.",
            ListKind::Driver | ListKind::Rider => "No rides found.",
        }
    }
}

/// A ride that passed the filter, with its distance entry if known.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub ride: &'a Ride,
    pub distance: Option<&'a RideDistance>,
}

/// Keep rides whose walking distance is within `max_walking_distance_m`.
///
/// Rides without a distance entry (including every ride when there is no
/// commute) are kept or dropped according to `unmatched`.
pub fn filter_candidates<'a>(
    rides: &'a [Ride],
    commute: Option<&'a Commute>,
    max_walking_distance_m: f64,
    unmatched: UnmatchedRidePolicy,
) -> Vec<Candidate<'a>> {
    rides
        .iter()
        .filter_map(|ride| {
            let distance = commute.and_then(|c| c.distance_for(&ride.ride_id));
            let keep = match distance {
                Some(d) => d.distance <= max_walking_distance_m,
                None => unmatched == UnmatchedRidePolicy::Include,
            };
            keep.then_some(Candidate { ride, distance })
        })
        .collect()
}

/// Human-readable distance: "950m" below a kilometer, "1.2km" above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m", meters.round())
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}
