use std::ops::Range;

use chrono::Timelike;

use super::types::{BehaviorClass, SlotRecommendation, SlotStatus, TaskRequest};
use crate::forecast::ForecastPoint;

/// Tunable thresholds and search bounds for [`SlotOptimizer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerParams {
    /// Mean window intensity above which the whole day counts as dirty (gCO2/kWh).
    pub green_threshold: f64,
    /// Minimum drop from the current hour that justifies waiting (gCO2/kWh).
    pub wait_delta: f64,
    /// Latest start index considered.
    pub max_start_offset: usize,
    /// First allowed start hour for attended tasks (inclusive).
    pub attended_start_hour: u32,
    /// Last allowed start hour for attended tasks (inclusive).
    pub attended_end_hour: u32,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self {
            green_threshold: 180.0,
            wait_delta: 30.0,
            max_start_offset: 12,
            attended_start_hour: 7,
            attended_end_hour: 22,
        }
    }
}

/// Chooses the lowest-carbon contiguous window for a task.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotOptimizer {
    params: OptimizerParams,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    window_carbon: u64,
}

impl SlotOptimizer {
    pub fn new(params: OptimizerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &OptimizerParams {
        &self.params
    }

    /// Recommends a start for a validated task.
    pub fn recommend(&self, series: &[ForecastPoint], task: &TaskRequest) -> SlotRecommendation {
        self.find_best_slot(series, task.duration_hours(), task.behavior())
    }

    /// Finds the best window of `ceil(duration_hours)` hours.
    ///
    /// Start indices run from 0 up to `max_start_offset`, limited so the
    /// window plus one trailing hour fits in `series`. Attended tasks only
    /// consider starts within the attended hours. Ties go to the earlier
    /// start. With no eligible start the result falls back to index 0,
    /// `DirtyAllDay` and 0% saved.
    ///
    /// `duration_hours` is expected to be positive; see [`TaskRequest::new`].
    pub fn find_best_slot(
        &self,
        series: &[ForecastPoint],
        duration_hours: f64,
        behavior: BehaviorClass,
    ) -> SlotRecommendation {
        let window_len = window_len(duration_hours);
        let mut best: Option<Candidate> = None;
        let mut worst = 0_u64;

        for start in self.candidate_starts(series.len(), window_len) {
            if behavior == BehaviorClass::Attended && !self.attended_ok(&series[start]) {
                continue;
            }

            let window_carbon: u64 = series[start..start + window_len]
                .iter()
                .map(|p| u64::from(p.carbon_intensity))
                .sum();

            if best.is_none_or(|b| window_carbon < b.window_carbon) {
                best = Some(Candidate {
                    start,
                    window_carbon,
                });
            }
            worst = worst.max(window_carbon);
        }

        let Some(best) = best else {
            tracing::debug!(
                series_len = series.len(),
                window_len,
                %behavior,
                "no eligible start, falling back to now"
            );
            return self.fallback(series, window_len);
        };

        let average = best.window_carbon as f64 / window_len as f64;
        let status = self.classify(series, best.start, average);
        let saved_percent = saved_percent(best.window_carbon, worst);

        tracing::debug!(
            start = best.start,
            window_carbon = best.window_carbon,
            worst,
            %status,
            "selected slot"
        );

        SlotRecommendation {
            start_index: best.start,
            start_timestamp: Some(series[best.start].timestamp),
            status,
            saved_percent,
            average_intensity: average.round() as u32,
        }
    }

    /// Start indices whose window leaves at least one trailing hour.
    fn candidate_starts(&self, len: usize, window_len: usize) -> Range<usize> {
        if window_len == 0 || len <= window_len {
            return 0..0;
        }
        0..self.params.max_start_offset.min(len - window_len - 1) + 1
    }

    fn attended_ok(&self, point: &ForecastPoint) -> bool {
        let hour = point.timestamp.hour();
        hour >= self.params.attended_start_hour && hour <= self.params.attended_end_hour
    }

    fn classify(&self, series: &[ForecastPoint], start: usize, average: f64) -> SlotStatus {
        if average > self.params.green_threshold {
            return SlotStatus::DirtyAllDay;
        }
        let current = f64::from(series[0].carbon_intensity);
        if start > 0 && current - average > self.params.wait_delta {
            SlotStatus::Wait
        } else {
            SlotStatus::RunNow
        }
    }

    fn fallback(&self, series: &[ForecastPoint], window_len: usize) -> SlotRecommendation {
        let head = &series[..series.len().min(window_len.max(1))];
        let average_intensity = if head.is_empty() {
            0
        } else {
            let sum: u64 = head.iter().map(|p| u64::from(p.carbon_intensity)).sum();
            (sum as f64 / head.len() as f64).round() as u32
        };
        SlotRecommendation {
            start_index: 0,
            start_timestamp: series.first().map(|p| p.timestamp),
            status: SlotStatus::DirtyAllDay,
            saved_percent: 0,
            average_intensity,
        }
    }
}

/// Number of whole hourly points a task of `duration_hours` occupies.
pub fn window_len(duration_hours: f64) -> usize {
    if duration_hours.is_finite() && duration_hours > 0.0 {
        duration_hours.ceil() as usize
    } else {
        0
    }
}

fn saved_percent(best: u64, worst: u64) -> u8 {
    if worst == 0 {
        return 0;
    }
    let pct = (worst.saturating_sub(best)) as f64 / worst as f64 * 100.0;
    pct.round().clamp(0.0, 100.0) as u8
}
