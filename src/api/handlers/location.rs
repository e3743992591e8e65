//! Location pipeline handlers: foreground ticks, geofence callbacks,
//! and the derived nearby state.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{GeofenceEnterRequest, LocationUpdateRequest};
use crate::app_state::AppState;
use crate::domain::Coordinate;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::NearbyBusinessState;

/// `POST /location` — Process a foreground location tick.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] when the coordinate is not
/// finite.
#[utoipa::path(
    post,
    path = "/api/v1/location",
    tag = "Location",
    summary = "Report a location sample",
    description = "Runs one proximity tick: selects the nearest qualifying business, triggers the entry routine on change, and returns the derived nearby state.",
    request_body = LocationUpdateRequest,
    responses(
        (status = 200, description = "Derived nearby state", body = NearbyBusinessState),
        (status = 400, description = "Non-finite coordinate", body = ErrorResponse),
    )
)]
pub async fn location_update(
    State(state): State<AppState>,
    Json(req): Json<LocationUpdateRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let position = Coordinate::new(req.latitude, req.longitude);
    if !position.is_finite() {
        return Err(GatewayError::InvalidRequest(
            "latitude and longitude must be finite".to_string(),
        ));
    }

    let nearby = state
        .proximity
        .handle_location_update(position, req.user_id.as_deref())
        .await;
    Ok(Json(nearby))
}

/// `POST /geofence/enter` — Process a platform region-enter callback.
///
/// Unknown region ids are accepted and ignored (warn + no-op), matching
/// the pipeline's best-effort contract.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] when the region id is blank.
#[utoipa::path(
    post,
    path = "/api/v1/geofence/enter",
    tag = "Location",
    summary = "Report a geofence entry",
    description = "Background entry path: resolves the business by region id (registry, then mirrored-document point-read) and runs the shared entry routine.",
    request_body = GeofenceEnterRequest,
    responses(
        (status = 202, description = "Entry accepted"),
        (status = 400, description = "Blank region id", body = ErrorResponse),
    )
)]
pub async fn geofence_enter(
    State(state): State<AppState>,
    Json(req): Json<GeofenceEnterRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    if req.region_id.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "region_id must not be blank".to_string(),
        ));
    }

    state
        .proximity
        .handle_geofence_entry(&req.region_id, req.user_id.as_deref())
        .await;
    Ok(StatusCode::ACCEPTED)
}

/// `GET /nearby` — Current derived nearby-business state.
#[utoipa::path(
    get,
    path = "/api/v1/nearby",
    tag = "Location",
    summary = "Get the nearby state",
    description = "Returns the currently nearby business (at most one) and its derived chat channel id.",
    responses(
        (status = 200, description = "Derived nearby state", body = NearbyBusinessState),
    )
)]
pub async fn nearby(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.proximity.nearby_state().await)
}

/// Location pipeline routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/location", post(location_update))
        .route("/geofence/enter", post(geofence_enter))
        .route("/nearby", get(nearby))
}
