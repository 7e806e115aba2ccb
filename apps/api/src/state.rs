use std::sync::Arc;

use crate::invoices::store::InvoiceStore;
use crate::llm_client::TextModel;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once in `main` and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub invoices: Arc<dyn InvoiceStore>,
    /// The text model behind every AI assist call. `GeminiClient` in production.
    pub model: Arc<dyn TextModel>,
}
