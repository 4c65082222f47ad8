//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use crate::models::LatLng;
use crate::services::assembler::{AssemblyOptions, DEFAULT_MAP_CENTER};
use crate::services::filter::{UnmatchedRidePolicy, DEFAULT_MAX_WALKING_DISTANCE_M};
use std::env;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Base URL of the ride-sharing backend API
    pub backend_url: String,
    /// Frontend URL (allowed CORS origin)
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Timeout for each backend request
    pub backend_timeout: Duration,
    /// Walking-distance threshold used when a request does not give one (meters)
    pub default_max_walking_distance_m: f64,
    /// Whether rides without distance data stay in the available list
    pub unmatched_ride_policy: UnmatchedRidePolicy,
    /// Map centre when nothing is rendered
    pub default_map_center: LatLng,
    /// Sessions unused for this long are dropped
    pub session_idle_timeout: Duration,

    // --- Secrets ---
    /// JWT signing key shared with the backend (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for refresh webhooks relayed by the backend
    pub refresh_webhook_secret: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            backend_url: env::var("BACKEND_URL")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("BACKEND_URL"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            backend_timeout: Duration::from_secs(
                env::var("BACKEND_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            default_max_walking_distance_m: match env::var("DEFAULT_MAX_WALKING_DISTANCE_M") {
                Ok(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("DEFAULT_MAX_WALKING_DISTANCE_M", v))?,
                Err(_) => DEFAULT_MAX_WALKING_DISTANCE_M,
            },
            unmatched_ride_policy: match env::var("UNMATCHED_RIDE_POLICY") {
                Ok(v) => v
                    .parse()
                    .map_err(|_| ConfigError::Invalid("UNMATCHED_RIDE_POLICY", v))?,
                Err(_) => UnmatchedRidePolicy::default(),
            },
            default_map_center: match env::var("DEFAULT_MAP_CENTER") {
                Ok(v) => parse_lat_lng(&v).ok_or(ConfigError::Invalid("DEFAULT_MAP_CENTER", v))?,
                Err(_) => DEFAULT_MAP_CENTER,
            },
            // Defaults to the session token lifetime
            session_idle_timeout: Duration::from_secs(
                env::var("SESSION_IDLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(24 * 60 * 60),
            ),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            refresh_webhook_secret: env::var("REFRESH_WEBHOOK_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("REFRESH_WEBHOOK_SECRET"))?
                .into_bytes(),
        })
    }

    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:9".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            backend_timeout: Duration::from_secs(5),
            default_max_walking_distance_m: DEFAULT_MAX_WALKING_DISTANCE_M,
            unmatched_ride_policy: UnmatchedRidePolicy::Include,
            default_map_center: DEFAULT_MAP_CENTER,
            session_idle_timeout: Duration::from_secs(60),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            refresh_webhook_secret: b"test_webhook_secret".to_vec(),
        }
    }

    pub fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions {
            unmatched: self.unmatched_ride_policy,
            default_center: self.default_map_center,
        }
    }
}

/// Parse "lat,lng".
fn parse_lat_lng(raw: &str) -> Option<LatLng> {
    let (lat, lng) = raw.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng))
        .then(|| LatLng::new(lat, lng))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
