//! Versioned, atomically replaced forecast snapshots.
//!
//! Every refresh takes a [`RefreshTicket`] carrying a monotonically
//! increasing sequence number. A finished build is published only if no
//! newer ticket has been issued in the meantime; otherwise the result is
//! stale and dropped. Readers always receive a complete snapshot behind an
//! `Arc`, never a partially built series.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::NaiveDateTime;
use serde::Serialize;

use super::types::ForecastPoint;

/// An immutable, complete forecast series labelled with its version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastSnapshot {
    /// Sequence number of the refresh that produced this snapshot.
    pub version: u64,
    /// Local time the forecast was anchored at.
    pub built_at: NaiveDateTime,
    /// Hourly series; index 0 is the hour containing `built_at`.
    pub points: Vec<ForecastPoint>,
}

/// Proof that a refresh was started; consumed on publish or abandon.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct RefreshTicket {
    sequence: u64,
}

impl RefreshTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Result of attempting to publish a finished build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The snapshot is now current.
    Published { version: u64 },
    /// A newer refresh was requested first; the result was discarded.
    Superseded { sequence: u64, latest: u64 },
}

#[derive(Debug, Default)]
struct StoreState {
    /// Highest sequence number handed out.
    latest_requested: u64,
    /// Tickets issued but not yet published or abandoned.
    in_flight: usize,
    current: Option<Arc<ForecastSnapshot>>,
}

/// Single-writer store for the published forecast.
#[derive(Debug, Default)]
pub struct ForecastStore {
    state: RwLock<StoreState>,
}

impl ForecastStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a refresh, superseding every earlier in-flight one.
    pub fn begin_refresh(&self) -> RefreshTicket {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.latest_requested += 1;
        state.in_flight += 1;
        RefreshTicket {
            sequence: state.latest_requested,
        }
    }

    /// Publishes a finished build unless a newer refresh has been requested.
    pub fn publish(
        &self,
        ticket: RefreshTicket,
        built_at: NaiveDateTime,
        points: Vec<ForecastPoint>,
    ) -> PublishOutcome {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.in_flight = state.in_flight.saturating_sub(1);

        if ticket.sequence != state.latest_requested {
            tracing::info!(
                sequence = ticket.sequence,
                latest = state.latest_requested,
                "discarding superseded forecast"
            );
            return PublishOutcome::Superseded {
                sequence: ticket.sequence,
                latest: state.latest_requested,
            };
        }

        state.current = Some(Arc::new(ForecastSnapshot {
            version: ticket.sequence,
            built_at,
            points,
        }));
        PublishOutcome::Published {
            version: ticket.sequence,
        }
    }

    /// Ends a failed refresh; the last published snapshot stays current.
    pub fn abandon(&self, ticket: RefreshTicket) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.in_flight = state.in_flight.saturating_sub(1);
        tracing::debug!(sequence = ticket.sequence, "forecast refresh abandoned");
    }

    /// The current complete snapshot, if any has been published.
    pub fn snapshot(&self) -> Option<Arc<ForecastSnapshot>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .clone()
    }

    /// Whether any refresh is still running.
    pub fn is_refreshing(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight
            > 0
    }
}
