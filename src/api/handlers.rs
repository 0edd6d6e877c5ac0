//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use super::AppState;
use super::types::{ErrorResponse, RefreshResponse, ScheduleBody, StateResponse};
use crate::advisor::{SchedulePlan, ScheduleError};
use crate::forecast::ForecastSnapshot;
use crate::schedule::BehaviorClass;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Returns the published forecast snapshot.
///
/// `GET /forecast` → 200 + `ForecastSnapshot` JSON
/// `GET /forecast` before the first publish → 503 + `ErrorResponse`
pub async fn get_forecast(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ForecastSnapshot>, ApiError> {
    let snapshot = state
        .advisor
        .forecast()
        .ok_or_else(|| error(StatusCode::SERVICE_UNAVAILABLE, ScheduleError::NoForecast))?;
    Ok(Json(ForecastSnapshot::clone(&snapshot)))
}

/// Returns the snapshot version, refresh flag and current grid condition.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let snapshot = state.advisor.forecast();
    Json(StateResponse {
        version: snapshot.as_ref().map(|s| s.version),
        built_at: snapshot.as_ref().map(|s| s.built_at),
        refreshing: state.advisor.is_refreshing(),
        condition: state.advisor.grid_condition(),
    })
}

/// Plans a task against the current forecast.
///
/// Without `behavior` in the body, the appliance's catalog behavior applies.
///
/// `POST /schedule` → 200 + `SchedulePlan` JSON
/// invalid task → 400, no forecast yet → 503
pub async fn post_schedule(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ScheduleBody>,
) -> Result<Json<SchedulePlan>, ApiError> {
    let behavior = body
        .behavior
        .as_deref()
        .map(str::parse::<BehaviorClass>)
        .transpose()
        .map_err(|e| error(StatusCode::BAD_REQUEST, e))?;

    state
        .advisor
        .schedule_task(&body.task, body.duration_hours, behavior)
        .await
        .map(Json)
        .map_err(|e| match e {
            ScheduleError::InvalidTask(_) => error(StatusCode::BAD_REQUEST, e),
            ScheduleError::NoForecast | ScheduleError::ForecastPending => {
                error(StatusCode::SERVICE_UNAVAILABLE, e)
            }
        })
}

/// Rebuilds the forecast for the configured location.
///
/// `POST /refresh` → 200 + `RefreshResponse` JSON
/// upstream weather or inference failure → 502
pub async fn post_refresh(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshResponse>, ApiError> {
    state
        .advisor
        .refresh(state.location, chrono::Utc::now())
        .await
        .map(|outcome| Json(outcome.into()))
        .map_err(|e| error(StatusCode::BAD_GATEWAY, e))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike, Utc};
    use tower::util::ServiceExt;

    use super::*;
    use crate::advisor::CarbonAdvisor;
    use crate::api::router;
    use crate::appliance::{ApplianceProfile, StaticCatalog};
    use crate::forecast::{ForecastBuilder, WeatherSample};
    use crate::model::LinearModel;
    use crate::schedule::SlotOptimizer;
    use crate::weather::{HourlyWeather, Location, WeatherError, WeatherSource};

    /// Hourly weather whose temperature equals the wanted intensity.
    #[derive(Debug)]
    struct StubWeather {
        start: Option<NaiveDateTime>,
        intensities: Vec<f64>,
    }

    #[async_trait]
    impl WeatherSource for StubWeather {
        async fn hourly(&self, _location: Location) -> Result<HourlyWeather, WeatherError> {
            let start = self.start.unwrap_or_else(|| {
                let now = Utc::now().naive_utc();
                now.date().and_hms_opt(now.hour(), 0, 0).unwrap_or(now)
            });
            let samples = self
                .intensities
                .iter()
                .enumerate()
                .map(|(i, &ci)| WeatherSample {
                    timestamp: start + TimeDelta::hours(i as i64),
                    temperature_c: ci,
                    shortwave_radiation: 0.0,
                    wind_speed: 0.0,
                })
                .collect();
            Ok(HourlyWeather::new(0, samples))
        }
    }

    fn midnight() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    fn make_state(start: Option<NaiveDateTime>, intensities: Vec<f64>) -> Arc<AppState> {
        let catalog: StaticCatalog = [(
            "Dishwasher",
            ApplianceProfile {
                power_kw: 1.2,
                behavior: BehaviorClass::Unattended,
            },
        )]
        .into_iter()
        .collect();
        let advisor = CarbonAdvisor::new(
            Arc::new(StubWeather { start, intensities }),
            Arc::new(LinearModel::new(0.0, [0.0, 0.0, 0.0, 1.0, 0.0, 0.0])),
            Arc::new(catalog),
            ForecastBuilder::default(),
            SlotOptimizer::default(),
        );
        Arc::new(AppState {
            advisor: Arc::new(advisor),
            location: Location::new(51.5, -0.1),
        })
    }

    async fn published_state(intensities: Vec<f64>) -> Arc<AppState> {
        let state = make_state(Some(midnight()), intensities);
        state
            .advisor
            .refresh_local(state.location, midnight())
            .await
            .unwrap();
        state
    }

    fn schedule_request(json: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/schedule")
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn forecast_before_publish_returns_503() {
        let app = router(make_state(Some(midnight()), vec![100.0; 24]));

        let req = Request::builder()
            .uri("/forecast")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(body_json(resp).await.get("error").is_some());
    }

    #[tokio::test]
    async fn forecast_returns_published_series() {
        let app = router(published_state(vec![100.0; 24]).await);

        let req = Request::builder()
            .uri("/forecast")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["version"], 1);
        assert_eq!(json["points"].as_array().map(Vec::len), Some(24));
        assert_eq!(json["points"][0]["hour_label"], "0:00");
    }

    #[tokio::test]
    async fn state_reports_condition() {
        let app = router(published_state(vec![250.0; 24]).await);

        let req = Request::builder().uri("/state").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["version"], 1);
        assert_eq!(json["refreshing"], false);
        assert_eq!(json["condition"]["level"], "high");
        assert_eq!(json["condition"]["carbon_intensity"], 250);
    }

    #[tokio::test]
    async fn schedule_returns_plan() {
        let mut intensities = vec![200.0; 24];
        intensities[3] = 60.0;
        intensities[4] = 60.0;
        let app = router(published_state(intensities).await);

        let resp = app
            .oneshot(schedule_request(
                r#"{"task": "Dishwasher", "duration_hours": 2}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["recommendation"]["status"], "wait");
        assert_eq!(json["recommendation"]["start_index"], 3);
        assert_eq!(json["task"]["behavior"], "unattended");
        assert_eq!(json["forecast_version"], 1);
    }

    #[tokio::test]
    async fn schedule_invalid_duration_returns_400() {
        let app = router(published_state(vec![100.0; 24]).await);

        let resp = app
            .oneshot(schedule_request(
                r#"{"task": "Laundry", "duration_hours": 0}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn schedule_unknown_behavior_returns_400() {
        let app = router(published_state(vec![100.0; 24]).await);

        let resp = app
            .oneshot(schedule_request(
                r#"{"task": "Laundry", "duration_hours": 1, "behavior": "sometimes"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn schedule_without_forecast_returns_503() {
        let app = router(make_state(Some(midnight()), vec![100.0; 24]));

        let resp = app
            .oneshot(schedule_request(
                r#"{"task": "Laundry", "duration_hours": 1}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn refresh_publishes_forecast() {
        let state = make_state(None, vec![120.0; 30]);
        let app = router(state.clone());

        let req = Request::builder()
            .method("POST")
            .uri("/refresh")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["outcome"], "published");
        assert_eq!(json["version"], 1);
        assert!(state.advisor.forecast().is_some());
    }
}
