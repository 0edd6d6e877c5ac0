//! Forecast refresh and schedule requests over shared collaborators.
//!
//! A refresh awaits the weather source, then the model, and only then
//! publishes the new series into the [`ForecastStore`]. Schedule requests
//! read whichever complete snapshot is current when they start.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::appliance::{ApplianceCatalog, ApplianceProfile};
use crate::forecast::{
    ForecastBuilder, ForecastError, ForecastSnapshot, ForecastStore, GridCondition, PublishOutcome,
};
use crate::model::CarbonModel;
use crate::schedule::{
    BehaviorClass, ImpactEstimate, SlotOptimizer, SlotRecommendation, TaskError, TaskRequest,
    estimate,
};
use crate::weather::{HourlyWeather, Location, WeatherSource};

/// A schedule request could not be answered.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error(transparent)]
    InvalidTask(#[from] TaskError),
    #[error("no forecast available yet")]
    NoForecast,
    #[error("forecast is still being built")]
    ForecastPending,
}

/// Recommendation card for one task.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulePlan {
    pub task: TaskRequest,
    pub appliance: ApplianceProfile,
    /// Version of the forecast snapshot the plan was computed against.
    pub forecast_version: u64,
    pub recommendation: SlotRecommendation,
    pub impact: ImpactEstimate,
}

impl fmt::Display for SchedulePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} ({}h) ---", self.task.name(), self.task.duration_hours())?;
        writeln!(f, "{}", self.recommendation.headline())?;
        writeln!(
            f,
            "Start:             {}",
            self.recommendation
                .start_label()
                .unwrap_or_else(|| "n/a".to_string())
        )?;
        writeln!(
            f,
            "Window intensity:  {} gCO2/kWh",
            self.recommendation.average_intensity
        )?;
        writeln!(f, "Energy:            {:.2} kWh", self.impact.energy_kwh)?;
        write!(f, "Emissions:         {:.2} kgCO2", self.impact.emissions_kg)
    }
}

/// Owns the collaborators and the published forecast.
#[derive(Debug)]
pub struct CarbonAdvisor {
    weather: Arc<dyn WeatherSource>,
    model: Arc<dyn CarbonModel>,
    appliances: Arc<dyn ApplianceCatalog>,
    builder: ForecastBuilder,
    optimizer: SlotOptimizer,
    default_profile: ApplianceProfile,
    store: ForecastStore,
}

impl CarbonAdvisor {
    pub fn new(
        weather: Arc<dyn WeatherSource>,
        model: Arc<dyn CarbonModel>,
        appliances: Arc<dyn ApplianceCatalog>,
        builder: ForecastBuilder,
        optimizer: SlotOptimizer,
    ) -> Self {
        Self {
            weather,
            model,
            appliances,
            builder,
            optimizer,
            default_profile: ApplianceProfile::default(),
            store: ForecastStore::new(),
        }
    }

    /// Profile used when the appliance catalog cannot answer.
    pub fn with_default_profile(mut self, profile: ApplianceProfile) -> Self {
        self.default_profile = profile;
        self
    }

    pub fn optimizer(&self) -> &SlotOptimizer {
        &self.optimizer
    }

    /// Fetches weather for `location`, runs inference and publishes the result.
    ///
    /// `now` is converted into the location's local time using the offset
    /// reported by the weather source. If a newer refresh starts before this
    /// one finishes, this result is discarded and `Superseded` is returned.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError` if weather or inference fails; the previously
    /// published forecast stays current.
    pub async fn refresh(
        &self,
        location: Location,
        now: DateTime<Utc>,
    ) -> Result<PublishOutcome, ForecastError> {
        self.refresh_with(location, |weather| weather.local_time(now))
            .await
    }

    /// Like [`CarbonAdvisor::refresh`], with "now" already given in the
    /// location's local time.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError` if weather or inference fails.
    pub async fn refresh_local(
        &self,
        location: Location,
        local_now: NaiveDateTime,
    ) -> Result<PublishOutcome, ForecastError> {
        self.refresh_with(location, |_| local_now).await
    }

    async fn refresh_with<F>(
        &self,
        location: Location,
        local_now: F,
    ) -> Result<PublishOutcome, ForecastError>
    where
        F: FnOnce(&HourlyWeather) -> NaiveDateTime,
    {
        let ticket = self.store.begin_refresh();
        tracing::info!(
            sequence = ticket.sequence(),
            lat = location.latitude,
            lon = location.longitude,
            "refreshing forecast"
        );

        let weather = match self.weather.hourly(location).await {
            Ok(weather) => weather,
            Err(e) => {
                tracing::warn!(error = %e, "weather fetch failed");
                self.store.abandon(ticket);
                return Err(e.into());
            }
        };

        let local_now = local_now(&weather);
        let points = match self.builder.build(local_now, &weather, self.model.as_ref()).await {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!(error = %e, "forecast build failed");
                self.store.abandon(ticket);
                return Err(e);
            }
        };

        if points.len() < self.builder.horizon_hours() {
            tracing::info!(
                hours = points.len(),
                horizon = self.builder.horizon_hours(),
                "weather data shorter than horizon"
            );
        }

        let outcome = self.store.publish(ticket, local_now, points);
        if let PublishOutcome::Published { version } = outcome {
            tracing::info!(version, "forecast published");
        }
        Ok(outcome)
    }

    /// The current complete forecast, if one has been published.
    pub fn forecast(&self) -> Option<Arc<ForecastSnapshot>> {
        self.store.snapshot()
    }

    pub fn is_refreshing(&self) -> bool {
        self.store.is_refreshing()
    }

    /// Condition of the current hour of the published forecast.
    pub fn grid_condition(&self) -> Option<GridCondition> {
        let snapshot = self.store.snapshot()?;
        GridCondition::current(&snapshot.points, self.optimizer.params().green_threshold)
    }

    /// Looks up appliance metadata, falling back to the default profile.
    pub async fn appliance_profile(&self, name: &str) -> ApplianceProfile {
        match self.appliances.lookup(name).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(appliance = name, error = %e, "using default appliance profile");
                self.default_profile
            }
        }
    }

    /// Plans `task` using catalog metadata for its power draw.
    ///
    /// # Errors
    ///
    /// See [`CarbonAdvisor::schedule_with_profile`].
    pub async fn schedule(&self, task: &TaskRequest) -> Result<SchedulePlan, ScheduleError> {
        // Fail fast before waiting on the catalog.
        let snapshot = self.current_snapshot()?;
        let profile = self.appliance_profile(task.name()).await;
        Ok(self.plan(&snapshot, task, profile))
    }

    /// Validates and plans a task by name.
    ///
    /// Without an explicit `behavior`, the appliance's catalog behavior
    /// (or the default profile's) applies.
    ///
    /// # Errors
    ///
    /// * `ScheduleError::InvalidTask` for a blank name or invalid duration
    /// * `ScheduleError::ForecastPending` / `ScheduleError::NoForecast` as in
    ///   [`CarbonAdvisor::schedule_with_profile`]
    pub async fn schedule_task(
        &self,
        name: &str,
        duration_hours: f64,
        behavior: Option<BehaviorClass>,
    ) -> Result<SchedulePlan, ScheduleError> {
        let task = TaskRequest::new(
            name,
            duration_hours,
            behavior.unwrap_or(self.default_profile.behavior),
        )?;
        let snapshot = self.current_snapshot()?;
        let profile = self.appliance_profile(task.name()).await;
        let task = match behavior {
            Some(_) => task,
            None => task.with_behavior(profile.behavior),
        };
        Ok(self.plan(&snapshot, &task, profile))
    }

    /// Plans `task` with an already known appliance profile.
    ///
    /// # Errors
    ///
    /// * `ScheduleError::ForecastPending` while the first forecast is building
    /// * `ScheduleError::NoForecast` if no forecast was ever published
    pub fn schedule_with_profile(
        &self,
        task: &TaskRequest,
        profile: ApplianceProfile,
    ) -> Result<SchedulePlan, ScheduleError> {
        let snapshot = self.current_snapshot()?;
        Ok(self.plan(&snapshot, task, profile))
    }

    fn current_snapshot(&self) -> Result<Arc<ForecastSnapshot>, ScheduleError> {
        match self.store.snapshot() {
            Some(snapshot) => Ok(snapshot),
            None if self.store.is_refreshing() => Err(ScheduleError::ForecastPending),
            None => Err(ScheduleError::NoForecast),
        }
    }

    fn plan(
        &self,
        snapshot: &ForecastSnapshot,
        task: &TaskRequest,
        profile: ApplianceProfile,
    ) -> SchedulePlan {
        let recommendation = self.optimizer.recommend(&snapshot.points, task);
        let impact = estimate(
            profile.power_kw,
            task.duration_hours(),
            f64::from(recommendation.average_intensity),
        );
        tracing::info!(
            task = task.name(),
            version = snapshot.version,
            status = %recommendation.status,
            start = recommendation.start_index,
            "schedule computed"
        );
        SchedulePlan {
            task: task.clone(),
            appliance: profile,
            forecast_version: snapshot.version,
            recommendation,
            impact,
        }
    }
}
