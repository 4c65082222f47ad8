// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod assembler;
pub mod backend;
pub mod filter;
pub mod route;
pub mod store;

pub use assembler::{assemble, AssemblyInput, AssemblyOptions};
pub use backend::BackendClient;
pub use filter::{ListKind, UnmatchedRidePolicy};
pub use route::{decode_route, derive_route_points, RouteError};
pub use store::{FetchKind, RideStore, SessionStore};
