//! Business endpoint DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::Business;

/// One raw document in a snapshot delivery.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BusinessDocumentDto {
    /// Remote document id.
    pub id: String,
    /// Raw document payload; validated at the parse boundary.
    pub payload: serde_json::Value,
}

/// `POST /businesses/sync` request: a full collection snapshot.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BusinessSyncRequest {
    /// Every document currently in the remote collection.
    pub documents: Vec<BusinessDocumentDto>,
}

/// `POST /businesses/sync` response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BusinessSyncResponse {
    /// Documents accepted into the registry.
    pub accepted: usize,
    /// Documents dropped at the parse boundary.
    pub dropped: usize,
    /// Whether platform geofences were re-registered.
    pub geofences_reregistered: bool,
}

/// Paginated business list response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BusinessListResponse {
    /// Businesses on this page, ordered by id.
    pub data: Vec<Business>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
