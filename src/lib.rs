// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Rideshare map: view models for the ride-sharing web client.
//!
//! This crate sits between the web client and the ride-sharing backend. It
//! keeps each user's ride/request selection, fetches commutes and rides on
//! the user's behalf, and assembles render-ready map and list view models.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{BackendClient, SessionStore};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub backend: BackendClient,
    pub sessions: SessionStore,
}
