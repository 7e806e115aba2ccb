//! Payment reminder emails for a single invoice.

use serde::Serialize;
use uuid::Uuid;

use crate::ai::prompts::{render, REMINDER_EMAIL_PROMPT};
use crate::errors::AppError;
use crate::invoices::store::InvoiceStore;
use crate::llm_client::{LlmError, TextModel};
use crate::models::invoice::Invoice;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderEmail {
    pub reminder_text: String,
}

pub fn build_reminder_prompt(invoice: &Invoice) -> String {
    let amount_due = format!("{:.2}", invoice.total);
    let due_date = invoice.due_date.format("%-m/%-d/%Y").to_string();
    render(
        REMINDER_EMAIL_PROMPT,
        &[
            ("client_name", invoice.client_name.as_str()),
            ("invoice_number", invoice.invoice_number.as_str()),
            ("amount_due", amount_due.as_str()),
            ("due_date", due_date.as_str()),
        ],
    )
}

/// Looks up the caller's invoice and asks the model for a reminder.
/// Unknown or foreign ids are a 404 and never reach the model.
pub async fn generate_reminder(
    user_id: Uuid,
    invoice_id: Option<&str>,
    store: &dyn InvoiceStore,
    model: &dyn TextModel,
) -> Result<ReminderEmail, AppError> {
    let invoice_id = match invoice_id {
        Some(id) if !id.trim().is_empty() => id.trim(),
        _ => return Err(AppError::BadRequest("Invoice ID is required".to_string())),
    };

    let not_found = || AppError::NotFound("Invoice not found".to_string());
    let id = Uuid::parse_str(invoice_id).map_err(|_| not_found())?;
    let invoice = store.get(user_id, id).await?.ok_or_else(not_found)?;

    let reminder_text = model
        .generate(&build_reminder_prompt(&invoice))
        .await
        .and_then(|text| {
            if text.trim().is_empty() {
                Err(LlmError::EmptyContent)
            } else {
                Ok(text)
            }
        })
        .map_err(|e| AppError::upstream("Failed to generate reminder email", e))?;

    Ok(ReminderEmail { reminder_text })
}
