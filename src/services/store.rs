// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user selection state.
//!
//! Each field has a single writer function. Backend fetches that feed the
//! store are sequenced with [`FetchTicket`]s: a response is applied only if
//! no newer fetch (or direct write) of the same kind happened meanwhile.

use crate::models::{Commute, Ride, RideRequest, Selection};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Store fields that are populated from backend fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    Commute,
    Selection,
}

/// Proof of having started a fetch; see [`RideStore::begin_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    kind: FetchKind,
    seq: u64,
}

/// Selection, commute and refresh state for one user.
#[derive(Debug, Default)]
pub struct RideStore {
    selection: Selection,
    commute: Option<Commute>,
    refresh_generation: u64,
    /// Refresh generation the selection was last fetched at.
    selection_generation: u64,
    pending_reselect: Option<String>,
    next_seq: u64,
    latest: HashMap<FetchKind, u64>,
}

impl RideStore {
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn commute(&self) -> Option<&Commute> {
        self.commute.as_ref()
    }

    pub fn refresh_generation(&self) -> u64 {
        self.refresh_generation
    }

    pub fn pending_reselect(&self) -> Option<&str> {
        self.pending_reselect.as_deref()
    }

    /// Select a ride (replacing any selection), or clear a ride selection.
    ///
    /// Clearing leaves a selected request untouched.
    pub fn select_ride(&mut self, ride: Option<Ride>) {
        self.supersede(FetchKind::Selection);
        match ride {
            Some(ride) => self.selection = Selection::Ride(ride),
            None if self.selection.ride().is_some() => self.selection = Selection::None,
            None => {}
        }
    }

    /// Select a request (replacing any selection), or clear a request selection.
    ///
    /// Clearing leaves a selected ride untouched.
    pub fn select_request(&mut self, request: Option<RideRequest>) {
        self.supersede(FetchKind::Selection);
        match request {
            Some(request) => self.selection = Selection::Request(request),
            None if self.selection.request().is_some() => self.selection = Selection::None,
            None => {}
        }
    }

    pub fn clear_selection(&mut self) {
        self.supersede(FetchKind::Selection);
        self.selection = Selection::None;
    }

    pub fn set_commute(&mut self, commute: Option<Commute>) {
        self.supersede(FetchKind::Commute);
        self.commute = commute;
    }

    /// Start a fetch of `kind`, superseding any fetch of that kind in flight.
    pub fn begin_fetch(&mut self, kind: FetchKind) -> FetchTicket {
        FetchTicket {
            kind,
            seq: self.supersede(kind),
        }
    }

    /// Whether a fetch's result would still be applied.
    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.latest.get(&ticket.kind) == Some(&ticket.seq)
    }

    /// Apply a fetched commute. Returns `false` if the fetch was superseded.
    pub fn apply_commute(&mut self, ticket: FetchTicket, commute: Option<Commute>) -> bool {
        debug_assert_eq!(ticket.kind, FetchKind::Commute);
        if !self.is_current(ticket) {
            tracing::debug!(seq = ticket.seq, "Dropping superseded commute response");
            return false;
        }
        self.commute = commute;
        true
    }

    /// Apply a fetched selection. Returns `false` if the fetch was superseded.
    pub fn apply_selection(&mut self, ticket: FetchTicket, selection: Selection) -> bool {
        debug_assert_eq!(ticket.kind, FetchKind::Selection);
        if !self.is_current(ticket) {
            tracing::debug!(seq = ticket.seq, "Dropping superseded selection response");
            return false;
        }
        self.selection = selection;
        true
    }

    /// Record a refresh signal; `reselect` names a ride to select on next view.
    pub fn signal_refresh(&mut self, reselect: Option<&str>) -> u64 {
        self.refresh_generation += 1;
        if let Some(ride_id) = reselect {
            self.pending_reselect = Some(ride_id.to_string());
        }
        self.refresh_generation
    }

    /// Drop the pending re-select once it has been handled.
    ///
    /// A newer signal naming a different ride stays pending.
    pub fn finish_reselect(&mut self, ride_id: &str) {
        if self.pending_reselect.as_deref() == Some(ride_id) {
            self.pending_reselect = None;
        }
    }

    /// Whether a refresh signal arrived after the selection was last fetched.
    pub fn selection_is_stale(&self) -> bool {
        self.selection_generation < self.refresh_generation
    }

    /// Record that the selection reflects the backend as of `generation`.
    pub fn mark_selection_fresh(&mut self, generation: u64) {
        self.selection_generation = self.selection_generation.max(generation);
    }

    fn supersede(&mut self, kind: FetchKind) -> u64 {
        self.next_seq += 1;
        self.latest.insert(kind, self.next_seq);
        self.next_seq
    }
}

/// A user's store plus when the user last used it.
#[derive(Debug)]
struct Session {
    store: RideStore,
    last_seen: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            store: RideStore::default(),
            last_seen: Instant::now(),
        }
    }
}

/// All users' stores, keyed by user id.
///
/// Entries are only locked inside [`SessionStore::with`] and
/// [`SessionStore::with_existing`], never across an `.await`.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against a user's store on behalf of that user, creating it on
    /// first use and marking it as recently seen.
    pub fn with<R>(&self, user_id: &str, f: impl FnOnce(&mut RideStore) -> R) -> R {
        let mut entry = self.sessions.entry(user_id.to_string()).or_default();
        entry.last_seen = Instant::now();
        f(&mut entry.store)
    }

    /// Run `f` against a user's store only if the user has a session.
    ///
    /// Does not count as activity, so it never keeps an idle session alive.
    pub fn with_existing<R>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut RideStore) -> R,
    ) -> Option<R> {
        self.sessions
            .get_mut(user_id)
            .map(|mut entry| f(&mut entry.store))
    }

    /// Drop sessions not used for longer than `max_idle`. Returns how many.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        match Instant::now().checked_sub(max_idle) {
            Some(cutoff) => self.evict_seen_before(cutoff),
            None => 0,
        }
    }

    fn evict_seen_before(&self, cutoff: Instant) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.last_seen >= cutoff);
        before.saturating_sub(self.sessions.len())
    }

    /// Periodically evict idle sessions for as long as the runtime lives.
    pub fn spawn_sweeper(
        &self,
        max_idle: Duration,
        every: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let sessions = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = sessions.evict_idle(max_idle);
                if evicted > 0 {
                    tracing::info!(evicted, remaining = sessions.len(), "Evicted idle sessions");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
