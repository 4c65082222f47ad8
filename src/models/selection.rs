// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! The user's current map/list selection.

use crate::models::ride::{Ride, RideRequest};
use serde::{Deserialize, Serialize};

/// Either a ride, a ride request, or nothing is selected, never both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    None,
    Ride(Ride),
    Request(RideRequest),
}

impl Selection {
    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }

    pub fn ride(&self) -> Option<&Ride> {
        match self {
            Selection::Ride(ride) => Some(ride),
            _ => None,
        }
    }

    pub fn request(&self) -> Option<&RideRequest> {
        match self {
            Selection::Request(request) => Some(request),
            _ => None,
        }
    }

    /// Id of the ride the selection refers to (directly or via a request).
    pub fn ride_id(&self) -> Option<&str> {
        match self {
            Selection::None => None,
            Selection::Ride(ride) => Some(&ride.ride_id),
            Selection::Request(request) => Some(&request.ride_id),
        }
    }
}
