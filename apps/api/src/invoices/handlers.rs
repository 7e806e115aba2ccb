//! Axum route handlers for invoice CRUD. Totals are always computed here,
//! never taken from the client.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extractors::{AppJson, AppPath};
use crate::models::invoice::{compute_total, Invoice, InvoiceStatus, LineItem};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub invoice_number: String,
    pub client_name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub status: Option<InvoiceStatus>,
    pub due_date: NaiveDate,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceRequest {
    pub invoice_number: Option<String>,
    pub client_name: Option<String>,
    /// Absent leaves the field alone; `null` clears it.
    #[serde(default, deserialize_with = "present")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub address: Option<Option<String>>,
    pub items: Option<Vec<LineItem>>,
    pub status: Option<InvoiceStatus>,
    pub due_date: Option<NaiveDate>,
}

/// Marks a field as present, including when its value is `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn require_non_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

fn validate_items(items: &[LineItem]) -> Result<(), AppError> {
    for (i, item) in items.iter().enumerate() {
        if item.name.trim().is_empty() {
            return Err(AppError::BadRequest(format!("items[{i}].name is required")));
        }
        if !item.quantity.is_finite() || item.quantity < 0.0 {
            return Err(AppError::BadRequest(format!(
                "items[{i}].quantity must be a non-negative number"
            )));
        }
        if !item.unit_price.is_finite() || item.unit_price < 0.0 {
            return Err(AppError::BadRequest(format!(
                "items[{i}].unitPrice must be a non-negative number"
            )));
        }
    }
    Ok(())
}

pub fn build_invoice(user_id: Uuid, request: CreateInvoiceRequest) -> Result<Invoice, AppError> {
    require_non_blank("invoiceNumber", &request.invoice_number)?;
    require_non_blank("clientName", &request.client_name)?;
    validate_items(&request.items)?;

    let now = Utc::now();
    Ok(Invoice {
        id: Uuid::new_v4(),
        user_id,
        invoice_number: request.invoice_number.trim().to_string(),
        client_name: request.client_name.trim().to_string(),
        email: request.email,
        address: request.address,
        total: compute_total(&request.items),
        items: request.items,
        status: request.status.unwrap_or_default(),
        due_date: request.due_date,
        created_at: now,
        updated_at: now,
    })
}

pub fn apply_update(invoice: &mut Invoice, request: UpdateInvoiceRequest) -> Result<(), AppError> {
    if let Some(number) = request.invoice_number {
        require_non_blank("invoiceNumber", &number)?;
        invoice.invoice_number = number.trim().to_string();
    }
    if let Some(name) = request.client_name {
        require_non_blank("clientName", &name)?;
        invoice.client_name = name.trim().to_string();
    }
    if let Some(items) = request.items {
        validate_items(&items)?;
        invoice.set_items(items);
    }
    if let Some(email) = request.email {
        invoice.email = email;
    }
    if let Some(address) = request.address {
        invoice.address = address;
    }
    if let Some(status) = request.status {
        invoice.status = status;
    }
    if let Some(due_date) = request.due_date {
        invoice.due_date = due_date;
    }
    invoice.updated_at = Utc::now();
    Ok(())
}

fn invoice_not_found() -> AppError {
    AppError::NotFound("Invoice not found".to_string())
}

/// POST /api/invoices
pub async fn handle_create_invoice(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(request): AppJson<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    let invoice = build_invoice(user_id, request)?;
    state.invoices.insert(&invoice).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET /api/invoices
pub async fn handle_list_invoices(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Invoice>>, AppError> {
    Ok(Json(state.invoices.list(user_id).await?))
}

/// GET /api/invoices/:id
pub async fn handle_get_invoice(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Invoice>, AppError> {
    let invoice = state
        .invoices
        .get(user_id, id)
        .await?
        .ok_or_else(invoice_not_found)?;
    Ok(Json(invoice))
}

/// PUT /api/invoices/:id
pub async fn handle_update_invoice(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateInvoiceRequest>,
) -> Result<Json<Invoice>, AppError> {
    let mut invoice = state
        .invoices
        .get(user_id, id)
        .await?
        .ok_or_else(invoice_not_found)?;

    apply_update(&mut invoice, request)?;

    if !state.invoices.update(&invoice).await? {
        return Err(invoice_not_found());
    }
    Ok(Json(invoice))
}

/// DELETE /api/invoices/:id
pub async fn handle_delete_invoice(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.invoices.delete(user_id, id).await? {
        return Err(invoice_not_found());
    }
    Ok(Json(json!({ "message": "Invoice deleted" })))
}
