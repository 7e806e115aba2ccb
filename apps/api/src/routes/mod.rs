pub mod health;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::ai::handlers as ai;
use crate::invoices::handlers as invoices;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Invoices
        .route(
            "/api/invoices",
            get(invoices::handle_list_invoices).post(invoices::handle_create_invoice),
        )
        .route(
            "/api/invoices/:id",
            get(invoices::handle_get_invoice)
                .put(invoices::handle_update_invoice)
                .delete(invoices::handle_delete_invoice),
        )
        // AI assist
        .route("/api/ai/parse-text", post(ai::handle_parse_text))
        .route("/api/ai/generate-reminder", post(ai::handle_generate_reminder))
        .route("/api/ai/dashboard-summary", get(ai::handle_dashboard_summary))
        .with_state(state)
}

/// Any origin; the methods and headers the frontend uses.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
