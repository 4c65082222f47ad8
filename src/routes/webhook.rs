// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook route for refresh signals relayed by the backend.
//!
//! The backend forwards push payloads here so that open sessions learn about
//! ride and request changes. Bodies are signed with HMAC-SHA256 over the raw
//! bytes; the hex digest travels in `X-Rideshare-Signature: sha256=<hex>`.

use crate::models::RefreshEvent;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-rideshare-signature";

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhook/refresh", post(handle_refresh))
}

#[derive(Serialize, Debug)]
pub struct RefreshAck {
    pub user_id: String,
    /// `None` when the user has no open session; the signal is then dropped.
    pub refresh_generation: Option<u64>,
    pub reselect_ride_id: Option<String>,
    pub received_at: String,
}

/// Sign a body the way the backend does. Returns the full header value.
pub fn sign_body(body: &[u8], secret: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(body);
    Some(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

/// Check a `sha256=<hex>` signature against the raw body.
fn verify_signature(body: &[u8], header_value: &str, secret: &[u8]) -> bool {
    let Some(signature_hex) = header_value.trim().strip_prefix("sha256=") else {
        return false;
    };
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    let expected = mac.finalize().into_bytes();

    expected.as_slice().ct_eq(&signature).into()
}

/// Record a refresh signal for the user named in the payload.
async fn handle_refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RefreshAck>, StatusCode> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if !verify_signature(&body, signature, &state.config.refresh_webhook_secret) {
        tracing::warn!("Security Alert: refresh webhook signature mismatch");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let event: RefreshEvent = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse refresh event");
        StatusCode::BAD_REQUEST
    })?;

    if event.user_id.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let reselect = event.payload.view_ride().map(str::to_string);
    let generation = state
        .sessions
        .with_existing(&event.user_id, |s| s.signal_refresh(reselect.as_deref()));

    match generation {
        Some(generation) => tracing::info!(
            user_id = %event.user_id,
            kind = ?event.payload.kind,
            reselect = ?reselect,
            generation,
            "Refresh signal recorded"
        ),
        None => tracing::debug!(
            user_id = %event.user_id,
            kind = ?event.payload.kind,
            "Refresh signal for user without a session"
        ),
    }

    Ok(Json(RefreshAck {
        user_id: event.user_id,
        refresh_generation: generation,
        reselect_ride_id: generation.and(reselect),
        received_at: format_utc_rfc3339(chrono::Utc::now()),
    }))
}
