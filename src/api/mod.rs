pub mod asset;
pub mod change;
pub mod error;
pub mod export;
pub mod health;
pub mod loan;
pub mod sync;
pub mod user;

use axum::{
    Router,
    routing::{get, post},
};

use crate::infrastructure::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Catalog
        .route("/assets", get(asset::list_assets).post(asset::create_asset))
        .route("/assets/types", get(asset::list_asset_types))
        .route(
            "/assets/:id",
            get(asset::get_asset)
                .put(asset::update_asset)
                .delete(asset::delete_asset),
        )
        .route("/assets/:id/availability", get(asset::get_availability))
        // Borrowers
        .route("/users", get(user::list_users).post(user::create_user))
        .route(
            "/users/:id",
            get(user::get_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
        // Loans
        .route("/loans", get(loan::list_loans).post(loan::create_loan))
        .route("/loans/history", get(loan::list_history))
        .route("/loans/repair", post(loan::repair_loans))
        .route("/loans/:id/return", post(loan::return_loan))
        // Change logs
        .route(
            "/changes/:domain",
            get(change::list_changes).delete(change::clear_changes),
        )
        .route("/changes/:domain/pending", get(change::list_pending))
        .route("/changes/:domain/mark-synced", post(change::mark_synced))
        // Spreadsheet sync
        .route("/sync/:domain/down", post(sync::sync_down))
        .route("/sync/:domain/up", post(sync::sync_up))
        // Backup
        .route("/export", get(export::export_data))
        .with_state(state)
}
