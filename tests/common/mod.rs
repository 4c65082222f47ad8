// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use rideshare_map::config::Config;
use rideshare_map::middleware::auth::create_jwt;
use rideshare_map::routes::create_router;
use rideshare_map::services::{BackendClient, SessionStore};
use rideshare_map::AppState;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Encoded polyline for (38.5,-120.2) → (40.7,-120.95) → (43.252,-126.453).
pub const SAMPLE_POLYLINE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

/// Create a test app pointed at `backend_url`.
/// Returns the router and the shared state.
pub fn create_test_app(backend_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.backend_url = backend_url.to_string();

    let backend = BackendClient::new(&config.backend_url, config.backend_timeout)
        .expect("Failed to build backend client");

    let state = Arc::new(AppState {
        config,
        backend,
        sessions: SessionStore::new(),
    });

    (create_router(state.clone()), state)
}

/// Create a session token for `user_id` signed with the test key.
pub fn create_test_jwt(user_id: &str) -> String {
    create_jwt(user_id, &Config::test_default().jwt_signing_key).expect("Failed to sign JWT")
}

/// Read a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

// ─── Fixtures ────────────────────────────────────────────────

pub fn location_json(lat: f64, lng: f64, address: Option<&str>) -> Value {
    match address {
        Some(a) => json!({"latitude": lat, "longitude": lng, "address": a}),
        None => json!({"latitude": lat, "longitude": lng}),
    }
}

/// A ride from (51.50,-0.12) to (51.53,-0.08) with no riders.
pub fn ride_json(ride_id: &str, polyline: Option<&str>) -> Value {
    let mut ride = json!({
        "rideId": ride_id,
        "driverId": "driver-1",
        "startLocation": location_json(51.50, -0.12, Some("Waterloo")),
        "endLocation": location_json(51.53, -0.08, Some("Old Street")),
        "startTime": "2026-03-02T08:00:00Z",
        "endTime": "2026-03-02T08:30:00Z",
        "totalSeats": 4,
        "availableSeats": 3,
        "status": "active",
        "createdAt": "2026-03-01T12:00:00Z",
        "updatedAt": "2026-03-01T12:00:00Z"
    });
    if let Some(p) = polyline {
        ride["ridePolyline"] = json!(p);
    }
    ride
}

/// A commute with one distance entry per `(ride_id, meters)`.
pub fn commute_json(user_id: &str, distances: &[(&str, f64)]) -> Value {
    let ride_distances: Vec<Value> = distances
        .iter()
        .map(|(ride_id, meters)| {
            json!({
                "ride_id": ride_id,
                "distance": meters,
                "entry_point": location_json(51.501, -0.121, None),
                "entry_polyline": "",
                "exit_point": location_json(51.529, -0.081, None),
                "exit_polyline": ""
            })
        })
        .collect();

    json!({
        "commuteId": "commute-1",
        "userId": user_id,
        "startLocation": location_json(51.49, -0.13, Some("Home")),
        "endLocation": location_json(51.54, -0.07, Some("Office")),
        "preferredStartTime": "08:00",
        "preferredEndTime": "17:30",
        "daysOfWeek": ["monday", "tuesday"],
        "createdAt": "2026-03-01T12:00:00Z",
        "updatedAt": "2026-03-01T12:00:00Z",
        "ride_distances": ride_distances
    })
}

pub fn request_json(request_id: &str, ride_id: &str, rider_id: &str, status: &str) -> Value {
    json!({
        "requestId": request_id,
        "rideId": ride_id,
        "riderId": rider_id,
        "driverId": "driver-1",
        "pickupLocation": location_json(51.505, -0.11, Some("Southbank")),
        "dropoffLocation": location_json(51.525, -0.09, None),
        "status": status,
        "createdAt": "2026-03-01T09:15:00Z"
    })
}

// ─── Fake backend ────────────────────────────────────────────

/// In-memory stand-in for the ride-sharing backend.
#[derive(Default)]
pub struct FakeBackend {
    pub commutes: Mutex<Vec<Value>>,
    pub rides: Mutex<Vec<Value>>,
    pub requests: Mutex<Vec<Value>>,
    pub user_type: Mutex<String>,
    pub notifications: Mutex<Vec<Value>>,
    pub push_tokens: Mutex<Vec<Value>>,
    pub decisions: Mutex<Vec<(String, String)>>,
    pub last_authorization: Mutex<Option<String>>,
    pub last_max_distance: Mutex<Option<String>>,
    pub fail_notifications: Mutex<bool>,
    /// Number of upcoming ride lookups that fail with 503.
    pub ride_failures: Mutex<u32>,
    pub created_requests: Mutex<Vec<Value>>,
}

type Shared = Arc<FakeBackend>;

impl FakeBackend {
    fn record_auth(&self, headers: &HeaderMap) {
        *self.last_authorization.lock().unwrap() = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);
    }
}

/// Serve `backend` on an ephemeral port; returns its base URL.
pub async fn spawn_fake_backend(backend: Shared) -> String {
    let app = Router::new()
        .route("/rides/available/", get(available_rides))
        .route("/rides/commutes/", get(commutes))
        .route("/rides/driver/{id}", get(all_rides))
        .route("/rides/rider/{id}", get(all_rides))
        .route("/rides/requests", post(create_request))
        .route("/rides/requests/rider/{id}", get(requests))
        .route("/rides/requests/driver/{id}", get(requests))
        .route("/rides/requests/{id}/approve", put(approve))
        .route("/rides/requests/{id}/reject", put(reject))
        .route("/rides/{id}", get(ride_by_id))
        .route("/users/profile", get(profile))
        .route("/notifications/send", post(send_notification))
        .route("/notifications/tokens", post(register_token))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake backend");
    let addr = listener.local_addr().expect("No local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}", addr)
}

async fn commutes(State(b): State<Shared>, headers: HeaderMap) -> Json<Value> {
    b.record_auth(&headers);
    Json(Value::Array(b.commutes.lock().unwrap().clone()))
}

async fn all_rides(State(b): State<Shared>, headers: HeaderMap) -> Json<Value> {
    b.record_auth(&headers);
    Json(Value::Array(b.rides.lock().unwrap().clone()))
}

async fn available_rides(
    State(b): State<Shared>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    b.record_auth(&headers);
    *b.last_max_distance.lock().unwrap() = q.get("max_distance").cloned();
    Json(Value::Array(b.rides.lock().unwrap().clone()))
}

async fn ride_by_id(
    State(b): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    b.record_auth(&headers);
    {
        let mut failures = b.ride_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"message": "Try again later"})),
            );
        }
    }
    let rides = b.rides.lock().unwrap();
    match rides.iter().find(|r| r["rideId"] == id.as_str()) {
        Some(ride) => (StatusCode::OK, Json(ride.clone())),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Ride not found"})),
        ),
    }
}

async fn create_request(State(b): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    b.created_requests.lock().unwrap().push(body.clone());
    (StatusCode::CREATED, Json(body))
}

async fn requests(State(b): State<Shared>, headers: HeaderMap) -> Json<Value> {
    b.record_auth(&headers);
    Json(Value::Array(b.requests.lock().unwrap().clone()))
}

fn decide(b: &FakeBackend, id: &str, status: &str) -> (StatusCode, Json<Value>) {
    let mut requests = b.requests.lock().unwrap();
    match requests.iter_mut().find(|r| r["requestId"] == id) {
        Some(request) => {
            request["status"] = json!(status);
            b.decisions
                .lock()
                .unwrap()
                .push((id.to_string(), status.to_string()));
            (StatusCode::OK, Json(json!({"success": true})))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Request not found"})),
        ),
    }
}

async fn approve(State(b): State<Shared>, Path(id): Path<String>) -> impl IntoResponse {
    decide(&b, &id, "approved")
}

async fn reject(State(b): State<Shared>, Path(id): Path<String>) -> impl IntoResponse {
    decide(&b, &id, "rejected")
}

async fn profile(State(b): State<Shared>, headers: HeaderMap) -> Json<Value> {
    b.record_auth(&headers);
    let user_type = b.user_type.lock().unwrap().clone();
    let user_type = if user_type.is_empty() {
        "rider".to_string()
    } else {
        user_type
    };
    Json(json!({
        "id": "user-1",
        "firstName": "Test",
        "lastName": "User",
        "email": "test@example.com",
        "userType": user_type
    }))
}

async fn send_notification(State(b): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    if *b.fail_notifications.lock().unwrap() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "push service down"})),
        );
    }
    b.notifications.lock().unwrap().push(body);
    (
        StatusCode::OK,
        Json(json!({"success": true, "notificationId": "n-1"})),
    )
}

async fn register_token(State(b): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    b.push_tokens.lock().unwrap().push(body);
    Json(json!({"success": true}))
}
