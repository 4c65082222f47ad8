// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Geographic location as sent by the backend.

use crate::models::map::LatLng;
use serde::{Deserialize, Serialize};

/// Placeholder shown wherever an address is missing.
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// A point with an optional human-readable address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, address: Option<&str>) -> Self {
        Self {
            latitude,
            longitude,
            address: address.map(str::to_string),
        }
    }

    /// Address for display, falling back to [`UNKNOWN_LOCATION`].
    pub fn label(&self) -> &str {
        self.address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(UNKNOWN_LOCATION)
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// Label for an optional location.
pub fn location_label(location: Option<&Location>) -> &str {
    location.map(Location::label).unwrap_or(UNKNOWN_LOCATION)
}
