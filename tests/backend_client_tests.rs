// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend client tests against the fake backend.

use rideshare_map::error::AppError;
use rideshare_map::models::{Commute, Notification, RequestStatus, Ride, RideRequest, UserType};
use rideshare_map::services::BackendClient;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

mod common;

use common::{commute_json, request_json, ride_json, FakeBackend};

async fn client() -> (BackendClient, Arc<FakeBackend>) {
    let backend = Arc::new(FakeBackend::default());
    let base_url = common::spawn_fake_backend(backend.clone()).await;
    // Trailing slash is trimmed
    let client = BackendClient::new(&format!("{}/", base_url), Duration::from_secs(5)).unwrap();
    (client, backend)
}

#[tokio::test]
async fn test_bearer_prefix_added_once() {
    let (client, backend) = client().await;

    client.get_driver_rides("tok", "driver-1").await.unwrap();
    assert_eq!(
        backend.last_authorization.lock().unwrap().as_deref(),
        Some("Bearer tok")
    );

    client.get_driver_rides("Bearer tok", "driver-1").await.unwrap();
    assert_eq!(
        backend.last_authorization.lock().unwrap().as_deref(),
        Some("Bearer tok")
    );
}

#[tokio::test]
async fn test_first_commute_is_used() {
    let (client, backend) = client().await;

    assert!(client.get_commute("tok").await.unwrap().is_none());

    *backend.commutes.lock().unwrap() = vec![
        commute_json("user-1", &[("ride-1", 420.0)]),
        commute_json("user-1", &[]),
    ];
    let commute = client.get_commute("tok").await.unwrap().unwrap();
    assert_eq!(commute.ride_distances.len(), 1);
    assert_eq!(commute.ride_distances[0].distance, 420.0);
}

#[tokio::test]
async fn test_ride_lookups() {
    let (client, backend) = client().await;
    *backend.rides.lock().unwrap() = vec![ride_json("ride-1", None)];

    let ride = client.get_ride("tok", "ride-1").await.unwrap();
    assert_eq!(ride.ride_id, "ride-1");

    let err = client.get_ride("tok", "missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref m) if m == "Ride not found"));

    let driver_rides: Vec<Ride> = client.get_driver_rides("tok", "driver-1").await.unwrap();
    assert_eq!(driver_rides, vec![ride]);
    assert_eq!(client.get_rider_rides("tok", "user-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_available_rides_sends_kilometers() {
    let (client, backend) = client().await;

    client.get_available_rides("tok", 0.25).await.unwrap();

    assert_eq!(
        backend.last_max_distance.lock().unwrap().as_deref(),
        Some("0.25")
    );
}

#[tokio::test]
async fn test_requests_and_decisions() {
    let (client, backend) = client().await;
    *backend.requests.lock().unwrap() = vec![request_json("q1", "ride-1", "user-1", "pending")];

    let requests: Vec<RideRequest> = client.get_rider_requests("tok", "user-1").await.unwrap();
    assert_eq!(requests[0].status, RequestStatus::Pending);

    let created = client.request_ride("tok", &requests[0]).await.unwrap();
    assert_eq!(created.request_id, "q1");
    assert_eq!(backend.created_requests.lock().unwrap().len(), 1);

    client.approve_request("tok", "q1").await.unwrap();
    let requests = client.get_driver_requests("tok", "driver-1").await.unwrap();
    assert_eq!(requests[0].status, RequestStatus::Approved);

    client.reject_request("tok", "q1").await.unwrap();
    let requests = client.get_driver_requests("tok", "driver-1").await.unwrap();
    assert_eq!(requests[0].status, RequestStatus::Rejected);
}

#[tokio::test]
async fn test_profile_and_notifications() {
    let (client, backend) = client().await;
    *backend.user_type.lock().unwrap() = "driver".to_string();

    let profile = client.get_user_profile("tok").await.unwrap();
    assert_eq!(profile.user_type, UserType::Driver);

    let sent = client
        .send_notification(
            "tok",
            &Notification {
                notification_id: None,
                user_id: "rider-1".to_string(),
                title: "Hello".to_string(),
                body: "World".to_string(),
                data: Some(json!({"type": "ride_update", "rideId": "ride-1"})),
            },
        )
        .await
        .unwrap();
    assert!(sent.success);
    assert_eq!(sent.notification_id.as_deref(), Some("n-1"));

    let registered = client
        .register_push_token("tok", "user-1", "push-1")
        .await
        .unwrap();
    assert!(registered.success);
}

#[tokio::test]
async fn test_server_error_detail_is_surfaced() {
    let (client, backend) = client().await;
    *backend.fail_notifications.lock().unwrap() = true;

    let err = client
        .send_notification(
            "tok",
            &Notification {
                notification_id: None,
                user_id: "rider-1".to_string(),
                title: "t".to_string(),
                body: "b".to_string(),
                data: None,
            },
        )
        .await
        .unwrap_err();

    match err {
        AppError::BackendApi { status, message } => {
            assert_eq!(status, Some(500));
            assert_eq!(message, "push service down");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_backend() {
    let client = BackendClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

    let err = client.get_commute("tok").await.unwrap_err();

    assert!(matches!(err, AppError::BackendApi { status: None, .. }));
}

#[test]
fn test_commute_type_is_usable_directly() {
    let commute: Commute =
        serde_json::from_value(commute_json("user-1", &[("ride-1", 0.0)])).unwrap();
    // Zero is a real distance
    assert_eq!(commute.distance_for("ride-1").unwrap().distance, 0.0);
}
