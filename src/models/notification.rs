// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Notification payloads sent to and relayed from the backend.

use serde::{Deserialize, Serialize};

/// Outgoing notification for `POST /notifications/send`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
    pub user_id: String,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Kind of push message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushKind {
    RideUpdate,
    RequestUpdate,
    NewRequest,
    #[serde(other)]
    Other,
}

/// Typed data carried by a push message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    #[serde(rename = "type")]
    pub kind: PushKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ride_id: Option<String>,
}

impl PushPayload {
    /// Ride to re-select when the user views this notification.
    pub fn view_ride(&self) -> Option<&str> {
        match self.kind {
            PushKind::Other => None,
            _ => self.ride_id.as_deref().filter(|id| !id.is_empty()),
        }
    }
}

/// A push message relayed by the backend for one user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshEvent {
    pub user_id: String,
    #[serde(flatten)]
    pub payload: PushPayload,
}
