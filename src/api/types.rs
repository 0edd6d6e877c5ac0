//! API request and response bodies.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::forecast::{GridCondition, PublishOutcome};

/// `GET /state` body.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    /// Version of the published snapshot, if any.
    pub version: Option<u64>,
    /// Local time the published snapshot was anchored at.
    pub built_at: Option<NaiveDateTime>,
    /// Whether a refresh is in flight.
    pub refreshing: bool,
    /// Condition of the current hour.
    pub condition: Option<GridCondition>,
}

/// `POST /schedule` body.
#[derive(Debug, Deserialize)]
pub struct ScheduleBody {
    pub task: String,
    pub duration_hours: f64,
    /// Overrides the behavior class from appliance metadata.
    pub behavior: Option<String>,
}

/// `POST /refresh` body.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshResponse {
    Published { version: u64 },
    Superseded { sequence: u64, latest: u64 },
}

impl From<PublishOutcome> for RefreshResponse {
    fn from(outcome: PublishOutcome) -> Self {
        match outcome {
            PublishOutcome::Published { version } => Self::Published { version },
            PublishOutcome::Superseded { sequence, latest } => {
                Self::Superseded { sequence, latest }
            }
        }
    }
}

/// Error body for 4xx/5xx responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
