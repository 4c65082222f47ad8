// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route-point derivation and bounds calculation.

use crate::models::{Bounds, LatLng, Location, Ride, Selection};
use geo::{BoundingRect, MultiPoint, Point};

/// Precision used by the backend's encoded polylines.
pub const POLYLINE_PRECISION: u32 = 5;

/// Decode an encoded polyline into coordinates.
pub fn decode_route(encoded: &str) -> Result<Vec<LatLng>, RouteError> {
    let line = polyline::decode_polyline(encoded, POLYLINE_PRECISION)
        .map_err(|e| RouteError::PolylineError(e.to_string()))?;
    Ok(line.0.into_iter().map(LatLng::from).collect())
}

/// Decode a polyline, logging and discarding it when malformed.
pub(crate) fn decode_or_skip(encoded: Option<&str>, what: &str) -> Option<Vec<LatLng>> {
    let encoded = encoded.map(str::trim).filter(|e| !e.is_empty())?;
    match decode_route(encoded) {
        Ok(points) => Some(points),
        Err(e) => {
            tracing::warn!(error = %e, polyline = what, "Ignoring undecodable polyline");
            None
        }
    }
}

/// Derive the primary route for a selection.
///
/// Priority: a request whose rider has a commute gets no route; otherwise
/// the selection's own polyline, then the polyline of the ride a request
/// refers to, then a synthesized `start → pickups → dropoffs → end` path.
pub fn derive_route_points(
    selection: &Selection,
    request_ride: Option<&Ride>,
    request_rider_has_commute: bool,
) -> Vec<LatLng> {
    match selection {
        Selection::None => Vec::new(),
        Selection::Ride(ride) => decode_or_skip(ride.polyline(), "ride")
            .unwrap_or_else(|| synthesize_ride_path(ride)),
        Selection::Request(request) => {
            if request_rider_has_commute {
                return Vec::new();
            }
            if let Some(points) = decode_or_skip(request_ride.and_then(Ride::polyline), "ride") {
                return points;
            }
            [
                request.pickup_location.as_ref(),
                request.dropoff_location.as_ref(),
            ]
            .into_iter()
            .flatten()
            .map(Location::position)
            .collect()
        }
    }
}

/// Straight-line path through every stop of a ride.
fn synthesize_ride_path(ride: &Ride) -> Vec<LatLng> {
    std::iter::once(&ride.start_location)
        .chain(ride.pickups().map(|(_, l)| l))
        .chain(ride.dropoffs().map(|(_, l)| l))
        .chain(std::iter::once(&ride.end_location))
        .map(Location::position)
        .collect()
}

/// Smallest box enclosing all points, or `None` for no points.
pub fn bounds_of<'a, I>(points: I) -> Option<Bounds>
where
    I: IntoIterator<Item = &'a LatLng>,
{
    let multi: MultiPoint<f64> = points.into_iter().map(|p| Point::from(*p)).collect();
    multi.bounding_rect().map(|rect| Bounds {
        south: rect.min().y,
        west: rect.min().x,
        north: rect.max().y,
        east: rect.max().x,
    })
}

/// Errors from route operations.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Failed to decode polyline: {0}")]
    PolylineError(String),
}
