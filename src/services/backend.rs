// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ride-sharing backend API client.
//!
//! Every call is made on behalf of a signed-in user and carries that user's
//! bearer credential. Handles:
//! - Commute, ride and ride-request lookups
//! - The distance-filtered "available rides" query
//! - Requesting a ride, request approval/rejection and rider notifications

use crate::error::AppError;
use crate::models::{Commute, Notification, Ride, RideRequest, UserProfile};
use reqwest::{header, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

/// Backend API client.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

/// Response of `POST /notifications/send`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub notification_id: Option<String>,
}

/// Generic `{ "success": bool }` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRegistration<'a> {
    user_id: &'a str,
    token: &'a str,
}

impl BackendClient {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ─── Commutes ────────────────────────────────────────────

    async fn get_commutes(&self, token: &str) -> Result<Vec<Commute>, AppError> {
        self.get_json(token, "/rides/commutes/", &[]).await
    }

    /// The user's commute; only the first one is used.
    pub async fn get_commute(&self, token: &str) -> Result<Option<Commute>, AppError> {
        Ok(self.get_commutes(token).await?.into_iter().next())
    }

    // ─── Rides ───────────────────────────────────────────────

    /// Rides within `max_distance_km` walking distance of the user's commute.
    pub async fn get_available_rides(
        &self,
        token: &str,
        max_distance_km: f64,
    ) -> Result<Vec<Ride>, AppError> {
        self.get_json(
            token,
            "/rides/available/",
            &[("max_distance", max_distance_km.to_string())],
        )
        .await
    }

    pub async fn get_ride(&self, token: &str, ride_id: &str) -> Result<Ride, AppError> {
        let path = format!("/rides/{}", segment(ride_id));
        self.get_json(token, &path, &[]).await
    }

    pub async fn get_driver_rides(&self, token: &str, driver_id: &str) -> Result<Vec<Ride>, AppError> {
        let path = format!("/rides/driver/{}", segment(driver_id));
        self.get_json(token, &path, &[]).await
    }

    pub async fn get_rider_rides(&self, token: &str, rider_id: &str) -> Result<Vec<Ride>, AppError> {
        let path = format!("/rides/rider/{}", segment(rider_id));
        self.get_json(token, &path, &[]).await
    }

    // ─── Ride Requests ───────────────────────────────────────

    pub async fn request_ride(
        &self,
        token: &str,
        request: &RideRequest,
    ) -> Result<RideRequest, AppError> {
        self.send_json(Method::POST, token, "/rides/requests", Some(request))
            .await
    }

    pub async fn get_rider_requests(
        &self,
        token: &str,
        rider_id: &str,
    ) -> Result<Vec<RideRequest>, AppError> {
        let path = format!("/rides/requests/rider/{}", segment(rider_id));
        self.get_json(token, &path, &[]).await
    }

    pub async fn get_driver_requests(
        &self,
        token: &str,
        driver_id: &str,
    ) -> Result<Vec<RideRequest>, AppError> {
        let path = format!("/rides/requests/driver/{}", segment(driver_id));
        self.get_json(token, &path, &[]).await
    }

    pub async fn approve_request(
        &self,
        token: &str,
        request_id: &str,
    ) -> Result<serde_json::Value, AppError> {
        let path = format!("/rides/requests/{}/approve", segment(request_id));
        self.send_json::<(), _>(Method::PUT, token, &path, None).await
    }

    pub async fn reject_request(
        &self,
        token: &str,
        request_id: &str,
    ) -> Result<serde_json::Value, AppError> {
        let path = format!("/rides/requests/{}/reject", segment(request_id));
        self.send_json::<(), _>(Method::PUT, token, &path, None).await
    }

    // ─── Users & Notifications ───────────────────────────────

    pub async fn get_user_profile(&self, token: &str) -> Result<UserProfile, AppError> {
        self.get_json(token, "/users/profile", &[]).await
    }

    pub async fn send_notification(
        &self,
        token: &str,
        notification: &Notification,
    ) -> Result<SendNotificationResponse, AppError> {
        self.send_json(Method::POST, token, "/notifications/send", Some(notification))
            .await
    }

    /// Register a push-messaging token for the user.
    pub async fn register_push_token(
        &self,
        token: &str,
        user_id: &str,
        push_token: &str,
    ) -> Result<SuccessResponse, AppError> {
        let body = TokenRegistration {
            user_id,
            token: push_token,
        };
        self.send_json(Method::POST, token, "/notifications/tokens", Some(&body))
            .await
    }

    // ─── Plumbing ────────────────────────────────────────────

    /// Generic authenticated GET with JSON response.
    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        tracing::debug!(path, "Backend GET");
        let response = self
            .http
            .get(self.url(path))
            .header(header::AUTHORIZATION, bearer(token))
            .query(query)
            .send()
            .await?;

        check_response_json(path, response).await
    }

    /// Generic authenticated request with optional JSON body.
    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        token: &str,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, AppError> {
        tracing::debug!(method = %method, path, "Backend request");
        let mut request = self
            .http
            .request(method, self.url(path))
            .header(header::AUTHORIZATION, bearer(token));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        check_response_json(path, response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Authorization header value; tokens may already carry the scheme.
fn bearer(token: &str) -> String {
    if token.starts_with("Bearer ") {
        token.to_string()
    } else {
        format!("Bearer {}", token)
    }
}

fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: DeserializeOwned>(
    path: &str,
    response: reqwest::Response,
) -> Result<T, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    tracing::warn!(path, status = status.as_u16(), error = %message, "Backend request failed");

    match status.as_u16() {
        401 => Err(AppError::Unauthorized),
        404 => Err(AppError::NotFound(message)),
        code => Err(AppError::backend(Some(code), message)),
    }
}

/// Best-effort server detail: the body's `message` (or `detail`) field.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "detail", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| "API request failed".to_string())
}
