//! Axum route handlers for the AI assist API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::ai::extract::{extract_invoice, ExtractedInvoice};
use crate::ai::insights::{summarize_dashboard, DashboardInsights};
use crate::ai::reminder::{generate_reminder, ReminderEmail};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extractors::AppJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ParseTextRequest {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReminderRequest {
    pub invoice_id: Option<String>,
}

/// POST /api/ai/parse-text
pub async fn handle_parse_text(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    AppJson(request): AppJson<ParseTextRequest>,
) -> Result<Json<ExtractedInvoice>, AppError> {
    let extracted = extract_invoice(request.text.as_deref(), state.model.as_ref()).await?;
    Ok(Json(extracted))
}

/// POST /api/ai/generate-reminder
pub async fn handle_generate_reminder(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(request): AppJson<GenerateReminderRequest>,
) -> Result<Json<ReminderEmail>, AppError> {
    let reminder = generate_reminder(
        user_id,
        request.invoice_id.as_deref(),
        state.invoices.as_ref(),
        state.model.as_ref(),
    )
    .await?;
    Ok(Json(reminder))
}

/// GET /api/ai/dashboard-summary
pub async fn handle_dashboard_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DashboardInsights>, AppError> {
    let insights =
        summarize_dashboard(user_id, state.invoices.as_ref(), state.model.as_ref()).await?;
    Ok(Json(insights))
}
