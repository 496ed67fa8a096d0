//! Route definitions for load-pallet tracking.

use axum::routing::get;
use axum::Router;

use crate::handlers::load_pallets;
use crate::state::AppState;

/// Load-pallet routes mounted at `/load-pallets`.
///
/// ```text
/// GET    /                       -> list_load_pallets
/// POST   /                       -> upsert_load_pallets
/// PUT    /                       -> record_progress
/// DELETE /?loadId=...            -> delete_load_pallets
/// GET    /{load_id}/pallets      -> get_pallet_detail
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(load_pallets::list_load_pallets)
                .post(load_pallets::upsert_load_pallets)
                .put(load_pallets::record_progress)
                .delete(load_pallets::delete_load_pallets),
        )
        .route("/{load_id}/pallets", get(load_pallets::get_pallet_detail))
}
