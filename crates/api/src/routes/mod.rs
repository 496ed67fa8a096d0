pub mod health;
pub mod load_pallets;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /load-pallets                                    list, upsert, record progress, delete
/// /load-pallets/{load_id}/pallets                  per-pallet detail
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/load-pallets", load_pallets::router())
}
