// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.
//!
//! Backend entities (`Ride`, `Commute`, ...) mirror the ride-sharing
//! backend's JSON shapes. View models (`map`) are what this service renders.

pub mod commute;
pub mod location;
pub mod map;
pub mod notification;
pub mod ride;
pub mod selection;
pub mod user;

pub use commute::{Commute, RideDistance};
pub use location::{location_label, Location};
pub use map::{
    AssembledView, Bounds, LatLng, MapView, Marker, MarkerKind, PolylineKind, RideList,
    RideListItem, RoutePolyline,
};
pub use notification::{Notification, PushKind, PushPayload, RefreshEvent};
pub use ride::{RequestStatus, Ride, RideRequest, RideStatus, RiderDetail, RiderStatus};
pub use selection::Selection;
pub use user::{DriverDetails, UserProfile, UserType, Vehicle};

use serde::{Deserialize, Deserializer};

/// Deserialize `null` as the type's default (the backend sends `null` for
/// empty collections on some endpoints).
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
