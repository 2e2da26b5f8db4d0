///! HTTP surface of the visibility service.
///! Handlers only parse parameters and map errors; the work happens in
///! `module::visibility` and the catalog behind `SatelliteDirectory`.
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use satvis_common::{
    ErrorResponse, LastUpdateResponse, SatelliteCategory, TranspondersLastUpdateResponse,
};

use crate::error::{Result, VisibilityError};
use crate::model::sat::SatelliteDirectory;
use crate::module::visibility::{
    PassQuery, VisibilityCalculator, VisibilityRequest, query_passes, query_visibility,
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    directory: Arc<dyn SatelliteDirectory>,
    calculator: VisibilityCalculator,
    pass_defaults: PassQuery,
    clock: fn() -> DateTime<Utc>,
}

impl AppState {
    pub fn new(
        directory: Arc<dyn SatelliteDirectory>,
        calculator: VisibilityCalculator,
        pass_defaults: PassQuery,
    ) -> Self {
        Self {
            directory,
            calculator,
            pass_defaults,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock used as the query instant
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }
}

impl IntoResponse for VisibilityError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match &self {
            VisibilityError::Internal(e) => tracing::error!("Internal error: {:#}", e),
            other if status.is_server_error() => tracing::warn!("{}", other),
            other => tracing::debug!("Rejected request: {}", other),
        }
        (status, Json(ErrorResponse::new(self.public_message()))).into_response()
    }
}

/// Query string shared by the visibility and pass endpoints.
///
/// Numbers arrive as text so a garbled value becomes a 400 with a
/// readable message instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ObserverParams {
    #[serde(rename = "satId")]
    sat_id: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    height: Option<String>,
    hours: Option<String>,
    #[serde(rename = "minElevation")]
    min_elevation: Option<String>,
}

fn parse_param<T: std::str::FromStr>(name: &str, value: Option<&str>) -> Result<Option<T>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| VisibilityError::InvalidRequest(format!("Invalid {} parameter: {}", name, raw))),
    }
}

impl ObserverParams {
    fn to_request(&self) -> Result<VisibilityRequest> {
        Ok(VisibilityRequest {
            sat_id: self.sat_id.clone(),
            latitude: parse_param("lat", self.lat.as_deref())?,
            longitude: parse_param("lon", self.lon.as_deref())?,
            height: parse_param("height", self.height.as_deref())?,
        })
    }

    fn to_pass_query(&self, defaults: PassQuery) -> Result<PassQuery> {
        Ok(PassQuery {
            window_hours: parse_param("hours", self.hours.as_deref())?.unwrap_or(defaults.window_hours),
            min_elevation_deg: parse_param("minElevation", self.min_elevation.as_deref())?
                .unwrap_or(defaults.min_elevation_deg),
            step_seconds: defaults.step_seconds,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryParams {
    category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn visibility(
    State(state): State<AppState>,
    Query(params): Query<ObserverParams>,
) -> Result<impl IntoResponse> {
    let request = params.to_request()?;
    let response =
        query_visibility(state.directory.as_ref(), state.calculator, &request, (state.clock)()).await?;
    Ok(Json(response))
}

async fn passes(
    State(state): State<AppState>,
    Query(params): Query<ObserverParams>,
) -> Result<impl IntoResponse> {
    let request = params.to_request()?;
    let query = params.to_pass_query(state.pass_defaults)?;
    let response = query_passes(state.directory.as_ref(), &request, query, (state.clock)()).await?;
    Ok(Json(response))
}

async fn satellite_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let record = state
        .directory
        .find(&id)
        .await
        .ok_or_else(|| VisibilityError::NotFound(format!("Satellite not found: {}", id)))?;
    Ok(Json(record.to_detail()))
}

async fn list_satellites(
    State(state): State<AppState>,
    Query(params): Query<CategoryParams>,
) -> Result<impl IntoResponse> {
    let category = match params.category.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(
            raw.parse::<SatelliteCategory>()
                .map_err(VisibilityError::InvalidRequest)?,
        ),
    };
    Ok(Json(state.directory.list(category).await))
}

async fn search_satellites(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(VisibilityError::InvalidRequest("q param required".to_string()));
    }
    Ok(Json(state.directory.search(&query).await))
}

async fn tle_last_update(State(state): State<AppState>) -> Response {
    match state.directory.last_update().await {
        Some(updated_at) => Json(LastUpdateResponse {
            last_update: Some(updated_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            error: None,
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(LastUpdateResponse {
                last_update: None,
                error: Some("TLE data has not been loaded yet".to_string()),
            }),
        )
            .into_response(),
    }
}

async fn transponders_last_update(State(state): State<AppState>) -> Response {
    match state.directory.transmitters_last_update().await {
        Some(updated_at) => Json(TranspondersLastUpdateResponse {
            updated_at: Some(updated_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            error: None,
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(TranspondersLastUpdateResponse {
                updated_at: None,
                error: Some("Transponders have not been updated yet".to_string()),
            }),
        )
            .into_response(),
    }
}

/// Build the application routes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/visibility", get(visibility))
        .route("/api/passes", get(passes))
        .route("/api/satellite/{id}", get(satellite_detail))
        .route("/api/satellites", get(list_satellites))
        .route("/api/satellites/search", get(search_satellites))
        .route("/api/tle-last-update", get(tle_last_update))
        .route("/api/transponders-last-update", get(transponders_last_update))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
