//! Task requests and scheduling results.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::forecast::hour_label;

/// Whether a task needs someone around while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorClass {
    /// Must start during waking hours.
    Attended,
    /// May start at any hour.
    Unattended,
}

impl BehaviorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorClass::Attended => "attended",
            BehaviorClass::Unattended => "unattended",
        }
    }
}

impl fmt::Display for BehaviorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BehaviorClass {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attended" => Ok(BehaviorClass::Attended),
            "unattended" => Ok(BehaviorClass::Unattended),
            _ => Err(TaskError::UnknownBehavior(s.to_string())),
        }
    }
}

/// A scheduling request was rejected before optimization.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskError {
    #[error("task duration must be a positive number of hours, got {0}")]
    InvalidDuration(f64),
    #[error("unknown behavior class \"{0}\", expected \"attended\" or \"unattended\"")]
    UnknownBehavior(String),
    #[error("task name must not be empty")]
    EmptyName,
}

/// A validated request to schedule one appliance run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRequest {
    name: String,
    duration_hours: f64,
    behavior: BehaviorClass,
}

impl TaskRequest {
    /// # Errors
    ///
    /// Returns `TaskError::EmptyName` for a blank name and
    /// `TaskError::InvalidDuration` unless `duration_hours` is finite and > 0.
    pub fn new(
        name: impl Into<String>,
        duration_hours: f64,
        behavior: BehaviorClass,
    ) -> Result<Self, TaskError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TaskError::EmptyName);
        }
        validate_duration(duration_hours)?;
        Ok(Self {
            name,
            duration_hours,
            behavior,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_hours
    }

    pub fn behavior(&self) -> BehaviorClass {
        self.behavior
    }

    /// Same task with a different behavior class.
    pub fn with_behavior(self, behavior: BehaviorClass) -> Self {
        Self { behavior, ..self }
    }
}

/// Checks a duration the way [`TaskRequest::new`] does.
///
/// # Errors
///
/// Returns `TaskError::InvalidDuration` unless `hours` is finite and > 0.
pub fn validate_duration(hours: f64) -> Result<(), TaskError> {
    if hours.is_finite() && hours > 0.0 {
        Ok(())
    } else {
        Err(TaskError::InvalidDuration(hours))
    }
}

/// Actionable classification of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// Starting now is as good as it gets.
    RunNow,
    /// A materially cleaner window starts later.
    Wait,
    /// Even the cleanest window is above the green threshold.
    DirtyAllDay,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::RunNow => "run_now",
            SlotStatus::Wait => "wait",
            SlotStatus::DirtyAllDay => "dirty_all_day",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best start time for a task within the forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotRecommendation {
    /// Index into the forecast series of the first hour of the window.
    pub start_index: usize,
    /// Start of that hour; `None` only when the series was empty.
    pub start_timestamp: Option<NaiveDateTime>,
    pub status: SlotStatus,
    /// Share of the worst eligible window's emissions avoided, 0-100.
    pub saved_percent: u8,
    /// Mean intensity over the window, gCO2/kWh.
    pub average_intensity: u32,
}

impl SlotRecommendation {
    /// Display label of the start hour, e.g. `"14:00"`.
    pub fn start_label(&self) -> Option<String> {
        self.start_timestamp.map(hour_label)
    }

    /// One-line headline for the recommendation card.
    pub fn headline(&self) -> String {
        match self.status {
            SlotStatus::RunNow => "Grid is Clean - Run Now".to_string(),
            SlotStatus::Wait => format!(
                "Wait until {} to save {}%",
                self.start_label().unwrap_or_else(|| "later".to_string()),
                self.saved_percent
            ),
            SlotStatus::DirtyAllDay => "High Grid Impact Today".to_string(),
        }
    }
}

/// Estimated energy use and emissions of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactEstimate {
    pub energy_kwh: f64,
    pub emissions_kg: f64,
}
