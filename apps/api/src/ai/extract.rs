//! Invoice extraction. Turns pasted free text into fields for the invoice form.

use serde::{Deserialize, Serialize};

use crate::ai::prompts::{render, INVOICE_EXTRACT_PROMPT};
use crate::errors::AppError;
use crate::llm_client::{call_json, TextModel};
use crate::models::invoice::LineItem;

/// Transient extraction result; never persisted. Fields the model could not
/// find stay empty for the user to fill in on the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedInvoice {
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

pub fn build_extract_prompt(text: &str) -> String {
    render(INVOICE_EXTRACT_PROMPT, &[("text", text)])
}

/// Blank text is rejected before the model is called.
pub async fn extract_invoice(
    text: Option<&str>,
    model: &dyn TextModel,
) -> Result<ExtractedInvoice, AppError> {
    let text = match text {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(AppError::BadRequest("Text is required".to_string())),
    };

    call_json::<ExtractedInvoice>(model, &build_extract_prompt(text))
        .await
        .map_err(|e| AppError::upstream("Failed to parse invoice data from text", e))
}
