// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::config::Config;
use crate::models::{
    location_label, AssembledView, Commute, Location, Notification, RequestStatus, Ride,
    RideList, RideRequest, Selection, UserType,
};
use crate::services::assembler::build_ride_list;
use crate::services::backend::SuccessResponse;
use crate::services::{assemble, AssemblyInput, FetchKind, ListKind};
use crate::time_utils::{display_time, format_utc_rfc3339};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const NO_REQUESTS_MESSAGE: &str = "No requests found.";

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/map", get(get_map))
        .route("/api/map/geojson", get(get_map_geojson))
        .route("/api/map/assemble", post(post_assemble))
        .route("/api/rides", get(get_rides))
        .route("/api/rides/{ride_id}/request", post(post_ride_request))
        .route("/api/requests", get(get_requests))
        .route("/api/requests/{request_id}/approve", post(approve_request))
        .route("/api/requests/{request_id}/reject", post(reject_request))
        .route(
            "/api/selection",
            get(get_selection).put(put_selection).delete(delete_selection),
        )
        .route("/api/commute", get(get_commute))
        .route("/api/notifications/token", post(register_push_token))
}

fn validated<T: Validate>(params: T) -> Result<T> {
    params
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(params)
}

/// The requested walking distance, or the configured default.
///
/// The range check in the query structs passes NaN, so finiteness is
/// checked here.
fn walking_distance_m(requested: Option<f64>, config: &Config) -> Result<f64> {
    match requested {
        Some(meters) if !meters.is_finite() => Err(AppError::BadRequest(
            "max_distance must be a finite number".to_string(),
        )),
        Some(meters) => Ok(meters),
        None => Ok(config.default_max_walking_distance_m),
    }
}

/// Treat a backend 404 as "nothing there yet".
fn absent_as_default<T: Default>(result: Result<T>) -> Result<T> {
    match result {
        Err(AppError::NotFound(_)) => Ok(T::default()),
        other => other,
    }
}

// ─── Map ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
struct MapQuery {
    /// Maximum walking distance in meters
    #[validate(range(min = 100.0, max = 5000.0))]
    max_distance: Option<f64>,
}

/// Assembled map and rides list for the current selection.
async fn get_map(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<MapQuery>,
) -> Result<Json<AssembledView>> {
    let params = validated(params)?;
    let max_distance_m = walking_distance_m(params.max_distance, &state.config)?;
    Ok(Json(load_view(&state, &user, max_distance_m).await?))
}

/// The same map as GeoJSON.
async fn get_map_geojson(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<MapQuery>,
) -> Result<Json<geojson::FeatureCollection>> {
    let params = validated(params)?;
    let max_distance_m = walking_distance_m(params.max_distance, &state.config)?;
    let view = load_view(&state, &user, max_distance_m).await?;
    Ok(Json(view.map.to_geojson()))
}

/// Assemble a view from a caller-supplied snapshot; touches neither the
/// backend nor the session.
async fn post_assemble(
    State(state): State<Arc<AppState>>,
    Json(input): Json<AssemblyInput>,
) -> Result<Json<AssembledView>> {
    if !input.max_walking_distance_m.is_finite() || input.max_walking_distance_m < 0.0 {
        return Err(AppError::BadRequest(
            "max_walking_distance_m must be a non-negative number".to_string(),
        ));
    }
    Ok(Json(assemble(&input, &state.config.assembly_options())))
}

async fn load_view(state: &AppState, user: &AuthUser, max_distance_m: f64) -> Result<AssembledView> {
    resolve_pending_reselect(state, user).await;
    refresh_stale_selection(state, user).await;

    let (commute, candidate_rides) = tokio::try_join!(refresh_commute(state, user), async {
        absent_as_default(
            state
                .backend
                .get_available_rides(&user.token, max_distance_m / 1000.0)
                .await,
        )
    })?;

    let selection = state
        .sessions
        .with(&user.user_id, |s| s.selection().clone());

    let request_ride = match &selection {
        Selection::Request(request) => load_request_ride(state, user, &request.ride_id).await,
        _ => None,
    };
    let request_rider_has_commute = commute.is_some()
        && selection
            .request()
            .is_some_and(|request| request.rider_id == user.user_id);

    let input = AssemblyInput {
        selection,
        commute,
        candidate_rides,
        max_walking_distance_m: max_distance_m,
        request_ride,
        request_rider_has_commute,
        list_kind: ListKind::Available,
    };
    Ok(assemble(&input, &state.config.assembly_options()))
}

/// Fetch the user's commute and return whatever the session holds afterwards.
///
/// A response that was overtaken by a newer fetch is dropped, so the
/// returned commute is always the latest one applied.
async fn refresh_commute(state: &AppState, user: &AuthUser) -> Result<Option<Commute>> {
    let ticket = state
        .sessions
        .with(&user.user_id, |s| s.begin_fetch(FetchKind::Commute));

    let commute = absent_as_default(state.backend.get_commute(&user.token).await)?;

    Ok(state.sessions.with(&user.user_id, |s| {
        s.apply_commute(ticket, commute);
        s.commute().cloned()
    }))
}

/// Apply a ride re-selection recorded by a refresh signal, if any.
///
/// The pending ride id is kept on transient failures so the next view
/// retries it.
async fn resolve_pending_reselect(state: &AppState, user: &AuthUser) {
    let Some((ride_id, generation, ticket)) = state.sessions.with(&user.user_id, |s| {
        let ride_id = s.pending_reselect()?.to_string();
        Some((
            ride_id,
            s.refresh_generation(),
            s.begin_fetch(FetchKind::Selection),
        ))
    }) else {
        return;
    };

    match state.backend.get_ride(&user.token, &ride_id).await {
        Ok(ride) => {
            let applied = state.sessions.with(&user.user_id, |s| {
                s.finish_reselect(&ride_id);
                let applied = s.apply_selection(ticket, Selection::Ride(ride));
                if applied {
                    s.mark_selection_fresh(generation);
                }
                applied
            });
            tracing::info!(
                user_id = %user.user_id,
                ride_id = %ride_id,
                applied,
                "Re-selected ride from refresh signal"
            );
        }
        Err(AppError::NotFound(_)) => {
            state
                .sessions
                .with(&user.user_id, |s| s.finish_reselect(&ride_id));
            tracing::warn!(
                user_id = %user.user_id,
                ride_id = %ride_id,
                "Ride to re-select no longer exists"
            );
        }
        Err(e) => {
            tracing::warn!(
                user_id = %user.user_id,
                ride_id = %ride_id,
                error = %e,
                "Failed to load ride for re-selection, will retry"
            );
        }
    }
}

/// Re-fetch the selected ride or request if a refresh signal arrived since
/// it was last fetched.
async fn refresh_stale_selection(state: &AppState, user: &AuthUser) {
    let Some((kind, id, generation, ticket)) = state.sessions.with(&user.user_id, |s| {
        if !s.selection_is_stale() {
            return None;
        }
        let generation = s.refresh_generation();
        let target = match s.selection() {
            Selection::Ride(ride) => Some((SelectionKind::Ride, ride.ride_id.clone())),
            Selection::Request(request) => {
                Some((SelectionKind::Request, request.request_id.clone()))
            }
            Selection::None => None,
        };
        match target {
            Some((kind, id)) => Some((kind, id, generation, s.begin_fetch(FetchKind::Selection))),
            None => {
                s.mark_selection_fresh(generation);
                None
            }
        }
    }) else {
        return;
    };

    let selection = match fetch_selection(state, user, kind, &id).await {
        Ok(selection) => selection,
        // Deleted on the backend
        Err(AppError::NotFound(_)) => Selection::None,
        Err(e) => {
            tracing::warn!(
                user_id = %user.user_id,
                id = %id,
                error = %e,
                "Failed to refresh selection, keeping previous copy"
            );
            return;
        }
    };

    let applied = state.sessions.with(&user.user_id, |s| {
        let applied = s.apply_selection(ticket, selection);
        if applied {
            s.mark_selection_fresh(generation);
        }
        applied
    });
    tracing::debug!(user_id = %user.user_id, id = %id, applied, "Refreshed selection");
}

/// Load a fresh copy of a ride, or of one of the user's requests.
async fn fetch_selection(
    state: &AppState,
    user: &AuthUser,
    kind: SelectionKind,
    id: &str,
) -> Result<Selection> {
    match kind {
        SelectionKind::Ride => Ok(Selection::Ride(state.backend.get_ride(&user.token, id).await?)),
        SelectionKind::Request => {
            let (_, requests) = fetch_requests(state, user).await?;
            requests
                .into_iter()
                .find(|r| r.request_id == id)
                .map(Selection::Request)
                .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))
        }
    }
}

async fn load_request_ride(state: &AppState, user: &AuthUser, ride_id: &str) -> Option<Ride> {
    match state.backend.get_ride(&user.token, ride_id).await {
        Ok(ride) => Some(ride),
        Err(e) => {
            tracing::warn!(ride_id, error = %e, "Failed to load ride for selected request");
            None
        }
    }
}

// ─── Rides ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
struct RidesQuery {
    #[serde(rename = "type", default)]
    kind: ListKind,
    #[validate(range(min = 100.0, max = 5000.0))]
    max_distance: Option<f64>,
}

/// Rides list with walking-distance labels.
async fn get_rides(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<RidesQuery>,
) -> Result<Json<RideList>> {
    let params = validated(params)?;
    let max_distance_m = walking_distance_m(params.max_distance, &state.config)?;

    let rides = async {
        match params.kind {
            ListKind::Available => absent_as_default(
                state
                    .backend
                    .get_available_rides(&user.token, max_distance_m / 1000.0)
                    .await,
            ),
            ListKind::Driver => {
                absent_as_default(state.backend.get_driver_rides(&user.token, &user.user_id).await)
            }
            ListKind::Rider => {
                absent_as_default(state.backend.get_rider_rides(&user.token, &user.user_id).await)
            }
        }
    };
    let (commute, rides) = tokio::try_join!(refresh_commute(&state, &user), rides)?;

    let selected_ride_id = state.sessions.with(&user.user_id, |s| {
        s.selection().ride().map(|ride| ride.ride_id.clone())
    });

    Ok(Json(build_ride_list(
        params.kind,
        &rides,
        commute.as_ref(),
        max_distance_m,
        state.config.unmatched_ride_policy,
        selected_ride_id.as_deref(),
    )))
}

/// Optional stops for a new request; default to the ride's endpoints.
#[derive(Debug, Default, Deserialize)]
struct RideRequestBody {
    #[serde(default)]
    pickup_location: Option<Location>,
    #[serde(default)]
    dropoff_location: Option<Location>,
}

fn check_location(field: &str, location: Option<&Location>) -> Result<()> {
    match location {
        Some(l)
            if !(-90.0..=90.0).contains(&l.latitude)
                || !(-180.0..=180.0).contains(&l.longitude) =>
        {
            Err(AppError::BadRequest(format!("{} is out of range", field)))
        }
        _ => Ok(()),
    }
}

fn new_ride_request(
    ride: &Ride,
    rider_id: &str,
    body: RideRequestBody,
    now: chrono::DateTime<chrono::Utc>,
) -> RideRequest {
    RideRequest {
        request_id: format!("req_{}", uuid::Uuid::new_v4()),
        ride_id: ride.ride_id.clone(),
        rider_id: rider_id.to_string(),
        driver_id: ride.driver_id.clone(),
        pickup_location: Some(
            body.pickup_location
                .unwrap_or_else(|| ride.start_location.clone()),
        ),
        dropoff_location: Some(
            body.dropoff_location
                .unwrap_or_else(|| ride.end_location.clone()),
        ),
        status: RequestStatus::Pending,
        created_at: format_utc_rfc3339(now),
        updated_at: None,
    }
}

/// Ask to join a ride as the signed-in rider.
async fn post_ride_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(ride_id): Path<String>,
    Json(body): Json<RideRequestBody>,
) -> Result<(StatusCode, Json<RideRequest>)> {
    check_location("pickup_location", body.pickup_location.as_ref())?;
    check_location("dropoff_location", body.dropoff_location.as_ref())?;

    let ride = state.backend.get_ride(&user.token, &ride_id).await?;
    let request = new_ride_request(&ride, &user.user_id, body, chrono::Utc::now());
    let created = state.backend.request_ride(&user.token, &request).await?;

    tracing::info!(
        rider_id = %user.user_id,
        ride_id = %ride_id,
        request_id = %created.request_id,
        "Ride requested"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

// ─── Requests ────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct RequestsQuery {
    status: Option<RequestStatus>,
}

/// One row of the requests list.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RequestListItem {
    pub request_id: String,
    pub ride_id: String,
    pub from: String,
    pub to: String,
    pub status: RequestStatus,
    pub requested_at: String,
    pub selected: bool,
    /// Whether the viewer can approve or reject this request.
    pub actionable: bool,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RequestsResponse {
    pub user_type: UserType,
    pub items: Vec<RequestListItem>,
    pub empty_message: Option<String>,
}

fn requests_response(
    user_type: UserType,
    requests: &[RideRequest],
    status: Option<RequestStatus>,
    selected_request_id: Option<&str>,
) -> RequestsResponse {
    let items: Vec<RequestListItem> = requests
        .iter()
        .filter(|r| status.is_none_or(|s| r.status == s))
        .map(|r| RequestListItem {
            request_id: r.request_id.clone(),
            ride_id: r.ride_id.clone(),
            from: location_label(r.pickup_location.as_ref()).to_string(),
            to: location_label(r.dropoff_location.as_ref()).to_string(),
            status: r.status,
            requested_at: display_time(&r.created_at),
            selected: selected_request_id == Some(r.request_id.as_str()),
            actionable: user_type == UserType::Driver && r.status == RequestStatus::Pending,
        })
        .collect();

    let empty_message = items.is_empty().then(|| NO_REQUESTS_MESSAGE.to_string());

    RequestsResponse {
        user_type,
        items,
        empty_message,
    }
}

/// The user's requests: as rider or driver, per their profile.
async fn fetch_requests(state: &AppState, user: &AuthUser) -> Result<(UserType, Vec<RideRequest>)> {
    let profile = state.backend.get_user_profile(&user.token).await?;
    let requests = match profile.user_type {
        UserType::Driver => state
            .backend
            .get_driver_requests(&user.token, &user.user_id)
            .await,
        UserType::Rider => state
            .backend
            .get_rider_requests(&user.token, &user.user_id)
            .await,
    };
    Ok((profile.user_type, absent_as_default(requests)?))
}

fn selected_request_id(state: &AppState, user: &AuthUser) -> Option<String> {
    state.sessions.with(&user.user_id, |s| {
        s.selection().request().map(|r| r.request_id.clone())
    })
}

async fn get_requests(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<RequestsQuery>,
) -> Result<Json<RequestsResponse>> {
    let (user_type, requests) = fetch_requests(&state, &user).await?;
    let selected = selected_request_id(&state, &user);
    Ok(Json(requests_response(
        user_type,
        &requests,
        params.status,
        selected.as_deref(),
    )))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn title(self) -> &'static str {
        match self {
            Decision::Approve => "Ride Request Approved",
            Decision::Reject => "Ride Request Rejected",
        }
    }

    fn body(self, pickup: &str) -> String {
        match self {
            Decision::Approve => format!("Your ride request from {} has been approved!", pickup),
            Decision::Reject => format!("Your ride request from {} has been rejected.", pickup),
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Decision::Approve => "approved",
            Decision::Reject => "rejected",
        }
    }

    /// Status reported to the rider's client.
    fn notified_status(self) -> &'static str {
        match self {
            Decision::Approve => "accepted",
            Decision::Reject => "rejected",
        }
    }
}

fn decision_notification(request: &RideRequest, decision: Decision) -> Notification {
    Notification {
        notification_id: None,
        user_id: request.rider_id.clone(),
        title: decision.title().to_string(),
        body: decision.body(location_label(request.pickup_location.as_ref())),
        data: Some(serde_json::json!({
            "type": "request_update",
            "requestId": request.request_id,
            "status": decision.notified_status(),
        })),
    }
}

async fn approve_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(request_id): Path<String>,
    Query(params): Query<RequestsQuery>,
) -> Result<Json<RequestsResponse>> {
    decide_request(&state, &user, &request_id, Decision::Approve, params.status).await
}

async fn reject_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(request_id): Path<String>,
    Query(params): Query<RequestsQuery>,
) -> Result<Json<RequestsResponse>> {
    decide_request(&state, &user, &request_id, Decision::Reject, params.status).await
}

/// Approve or reject a request, tell the rider, and return the refreshed
/// driver request list.
async fn decide_request(
    state: &AppState,
    user: &AuthUser,
    request_id: &str,
    decision: Decision,
    status: Option<RequestStatus>,
) -> Result<Json<RequestsResponse>> {
    match decision {
        Decision::Approve => state.backend.approve_request(&user.token, request_id).await?,
        Decision::Reject => state.backend.reject_request(&user.token, request_id).await?,
    };

    tracing::info!(
        driver_id = %user.user_id,
        request_id,
        decision = decision.past_tense(),
        "Ride request decided"
    );

    let requests = absent_as_default(
        state
            .backend
            .get_driver_requests(&user.token, &user.user_id)
            .await,
    )?;

    match requests.iter().find(|r| r.request_id == request_id) {
        Some(request) => {
            let notification = decision_notification(request, decision);
            // Best effort: the decision already happened
            if let Err(e) = state
                .backend
                .send_notification(&user.token, &notification)
                .await
            {
                tracing::warn!(
                    request_id,
                    rider_id = %request.rider_id,
                    error = %e,
                    "Failed to notify rider"
                );
            }
        }
        None => {
            tracing::warn!(request_id, "Decided request missing from refreshed list");
        }
    }

    let selected = selected_request_id(state, user);
    Ok(Json(requests_response(
        UserType::Driver,
        &requests,
        status,
        selected.as_deref(),
    )))
}

// ─── Selection ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SelectionKind {
    Ride,
    Request,
}

#[derive(Debug, Deserialize)]
struct SelectBody {
    kind: SelectionKind,
    id: String,
}

/// Current selection plus the refresh generation the client last saw.
#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub selection: Selection,
    pub refresh_generation: u64,
    /// True when a newer selection overtook this one.
    pub superseded: bool,
}

fn selection_response(state: &AppState, user: &AuthUser, superseded: bool) -> SelectionResponse {
    state.sessions.with(&user.user_id, |s| SelectionResponse {
        selection: s.selection().clone(),
        refresh_generation: s.refresh_generation(),
        superseded,
    })
}

async fn get_selection(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<SelectionResponse> {
    Json(selection_response(&state, &user, false))
}

/// Select a ride or one of the user's requests.
async fn put_selection(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SelectBody>,
) -> Result<Json<SelectionResponse>> {
    if body.id.trim().is_empty() {
        return Err(AppError::BadRequest("id must not be empty".to_string()));
    }

    let (generation, ticket) = state.sessions.with(&user.user_id, |s| {
        (s.refresh_generation(), s.begin_fetch(FetchKind::Selection))
    });

    let selection = fetch_selection(&state, &user, body.kind, &body.id).await?;

    let applied = state.sessions.with(&user.user_id, |s| {
        let applied = s.apply_selection(ticket, selection);
        if applied {
            s.mark_selection_fresh(generation);
        }
        applied
    });

    Ok(Json(selection_response(&state, &user, !applied)))
}

async fn delete_selection(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> StatusCode {
    state.sessions.with(&user.user_id, |s| s.clear_selection());
    StatusCode::NO_CONTENT
}

// ─── Commute ─────────────────────────────────────────────────

async fn get_commute(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Option<Commute>>> {
    Ok(Json(refresh_commute(&state, &user).await?))
}

// ─── Notifications ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PushTokenBody {
    token: String,
}

async fn register_push_token(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<PushTokenBody>,
) -> Result<Json<SuccessResponse>> {
    let push_token = body.token.trim();
    if push_token.is_empty() {
        return Err(AppError::BadRequest("token must not be empty".to_string()));
    }

    let response = state
        .backend
        .register_push_token(&user.token, &user.user_id, push_token)
        .await?;
    tracing::info!(user_id = %user.user_id, "Registered push token");
    Ok(Json(response))
}
