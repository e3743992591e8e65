//! Geocoding proxy handlers: place search and walking directions.
//!
//! Both endpoints forward to the upstream geocoding service and return
//! 503 when no access token was configured.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{DirectionsParams, SearchParams, SearchResponseDto};
use crate::app_state::AppState;
use crate::domain::Coordinate;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::geocoding::Route;

/// `GET /places/search` — Free-text place search.
///
/// # Errors
///
/// Returns [`GatewayError::GeocodingUnavailable`] when the proxy is not
/// configured, [`GatewayError::InvalidRequest`] on a blank query, and
/// [`GatewayError::Upstream`] when the upstream call fails.
#[utoipa::path(
    get,
    path = "/api/v1/places/search",
    tag = "Geocoding",
    summary = "Search places",
    description = "Proxies a free-text place search to the upstream geocoding service.",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching places", body = SearchResponseDto),
        (status = 400, description = "Blank query", body = ErrorResponse),
        (status = 502, description = "Upstream failure", body = ErrorResponse),
        (status = 503, description = "Geocoding not configured", body = ErrorResponse),
    )
)]
pub async fn search_places(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let client = state
        .geocoding
        .as_ref()
        .ok_or(GatewayError::GeocodingUnavailable)?;

    if params.q.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "query must not be blank".to_string(),
        ));
    }

    let results = client.search_places(&params.q).await?;
    Ok(Json(SearchResponseDto { results }))
}

/// `GET /directions` — Walking route between two coordinates.
///
/// # Errors
///
/// Returns [`GatewayError::GeocodingUnavailable`] when the proxy is not
/// configured, [`GatewayError::InvalidRequest`] on non-finite
/// coordinates, and [`GatewayError::Upstream`] when the upstream call
/// fails.
#[utoipa::path(
    get,
    path = "/api/v1/directions",
    tag = "Geocoding",
    summary = "Get walking directions",
    description = "Proxies a walking-directions request to the upstream geocoding service.",
    params(DirectionsParams),
    responses(
        (status = 200, description = "Walking route", body = Route),
        (status = 400, description = "Non-finite coordinates", body = ErrorResponse),
        (status = 502, description = "Upstream failure", body = ErrorResponse),
        (status = 503, description = "Geocoding not configured", body = ErrorResponse),
    )
)]
pub async fn directions(
    State(state): State<AppState>,
    Query(params): Query<DirectionsParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let client = state
        .geocoding
        .as_ref()
        .ok_or(GatewayError::GeocodingUnavailable)?;

    let finite = params.from_lat.is_finite()
        && params.from_lon.is_finite()
        && params.to_lat.is_finite()
        && params.to_lon.is_finite();
    if !finite {
        return Err(GatewayError::InvalidRequest(
            "route endpoints must be finite coordinates".to_string(),
        ));
    }

    let from = Coordinate::new(params.from_lat, params.from_lon);
    let to = Coordinate::new(params.to_lat, params.to_lon);
    let route = client.route(from, to).await?;
    Ok(Json(route))
}

/// Geocoding proxy routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/places/search", get(search_places))
        .route("/directions", get(directions))
}
