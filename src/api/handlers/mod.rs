//! REST endpoint handlers organized by resource.

pub mod business;
pub mod conversation;
pub mod geocoding;
pub mod location;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(business::routes())
        .merge(location::routes())
        .merge(conversation::routes())
        .merge(geocoding::routes())
}
