//! Route definitions for the `/submissions` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::submissions;
use crate::state::AppState;

/// Routes mounted at `/submissions`.
///
/// ```text
/// GET    /{id}            -> get_by_id
/// GET    /{id}/history    -> field_history
/// POST   /{id}/confirm    -> confirm
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(submissions::get_by_id))
        .route("/{id}/history", get(submissions::field_history))
        .route("/{id}/confirm", post(submissions::confirm))
}
