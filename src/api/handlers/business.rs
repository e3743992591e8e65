//! Business registry handlers: snapshot sync, list, get.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    BusinessListResponse, BusinessSyncRequest, BusinessSyncResponse, PaginationParams,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::persistence::models::VisitRecord;

/// `POST /businesses/sync` — Apply a business collection snapshot.
///
/// This is the delivery boundary of the remote-store subscription:
/// every document is validated, invalid ones are dropped, the registry
/// is replaced wholesale, and geofences re-register when the id set
/// changed.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures only; malformed
/// documents are dropped silently per the parse-boundary contract.
#[utoipa::path(
    post,
    path = "/api/v1/businesses/sync",
    tag = "Businesses",
    summary = "Apply a business snapshot",
    description = "Replaces the in-memory business registry with the given collection snapshot. Documents failing validation are dropped, never rejected.",
    request_body = BusinessSyncRequest,
    responses(
        (status = 200, description = "Snapshot applied", body = BusinessSyncResponse),
    )
)]
pub async fn sync_businesses(
    State(state): State<AppState>,
    Json(req): Json<BusinessSyncRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let documents = req
        .documents
        .into_iter()
        .map(|d| (d.id, d.payload))
        .collect();
    let summary = state.proximity.sync_businesses(documents).await;

    Ok(Json(BusinessSyncResponse {
        accepted: summary.accepted,
        dropped: summary.dropped,
        geofences_reregistered: summary.geofences_reregistered,
    }))
}

/// `GET /businesses` — List registered businesses.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/businesses",
    tag = "Businesses",
    summary = "List businesses",
    description = "Returns a paginated list of all businesses currently in the registry, ordered by id.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated business list", body = BusinessListResponse),
    )
)]
pub async fn list_businesses(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let params = params.clamped();
    let businesses = state.proximity.registry().list().await;

    let total = businesses.len() as u32;
    let data = businesses
        .into_iter()
        .skip(params.offset())
        .take(params.per_page as usize)
        .collect();

    Ok(Json(BusinessListResponse {
        data,
        pagination: params.meta(total),
    }))
}

/// `GET /businesses/:id` — Get one business.
///
/// # Errors
///
/// Returns [`GatewayError::BusinessNotFound`] if the id is not in the
/// registry.
#[utoipa::path(
    get,
    path = "/api/v1/businesses/{id}",
    tag = "Businesses",
    summary = "Get business details",
    description = "Returns the registered business with the given id.",
    params(
        ("id" = String, Path, description = "Business id"),
    ),
    responses(
        (status = 200, description = "Business details", body = crate::domain::Business),
        (status = 404, description = "Business not found", body = ErrorResponse),
    )
)]
pub async fn get_business(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let business = state
        .proximity
        .registry()
        .get(&id)
        .await
        .ok_or(GatewayError::BusinessNotFound(id))?;
    Ok(Json(business))
}

/// `GET /businesses/:id/visits` — Recent visits to one business.
///
/// # Errors
///
/// Returns [`GatewayError::BusinessNotFound`] for unknown ids and
/// [`GatewayError::Persistence`] on database failure.
#[utoipa::path(
    get,
    path = "/api/v1/businesses/{id}/visits",
    tag = "Businesses",
    summary = "List recent visits",
    description = "Returns the most recent visit records for a business, newest first. Empty when the gateway runs memory-only.",
    params(
        ("id" = String, Path, description = "Business id"),
        VisitQuery,
    ),
    responses(
        (status = 200, description = "Recent visits", body = Vec<VisitRecord>),
        (status = 404, description = "Business not found", body = ErrorResponse),
    )
)]
pub async fn list_visits(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<VisitQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    if state.proximity.registry().get(&id).await.is_none() {
        return Err(GatewayError::BusinessNotFound(id));
    }
    let limit = params.limit.unwrap_or(50).clamp(1, 500);
    let visits = state.proximity.recent_visits(&id, limit).await?;
    Ok(Json(visits))
}

/// `GET /businesses/:id/visits` query parameters.
#[derive(Debug, Clone, serde::Deserialize, utoipa::IntoParams)]
pub struct VisitQuery {
    /// Maximum rows to return.
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Business routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/businesses/sync", post(sync_businesses))
        .route("/businesses", get(list_businesses))
        .route("/businesses/{id}", get(get_business))
        .route("/businesses/{id}/visits", get(list_visits))
}
