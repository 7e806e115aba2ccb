//! Dashboard insights. Aggregates a user's invoices and asks the model for
//! a few encouraging observations about them.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::ai::prompts::{render, DASHBOARD_INSIGHTS_PROMPT, NO_INVOICES_INSIGHT};
use crate::errors::AppError;
use crate::invoices::store::InvoiceStore;
use crate::llm_client::{call_json, TextModel};
use crate::models::invoice::Invoice;

const RECENT_INVOICE_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardInsights {
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceStats {
    pub total_invoices: usize,
    pub paid_invoices: usize,
    pub unpaid_invoices: usize,
    /// Σ totals of paid invoices
    pub total_revenue: f64,
    /// Σ totals of everything not paid
    pub total_outstanding: f64,
}

impl InvoiceStats {
    pub fn from_invoices(invoices: &[Invoice]) -> Self {
        invoices.iter().fold(Self::default(), |mut stats, inv| {
            stats.total_invoices += 1;
            if inv.status.is_paid() {
                stats.paid_invoices += 1;
                stats.total_revenue += inv.total;
            } else {
                stats.unpaid_invoices += 1;
                stats.total_outstanding += inv.total;
            }
            stats
        })
    }
}

/// Renders the data block fed to the model. `invoices` must be newest first.
pub fn build_data_summary(stats: &InvoiceStats, invoices: &[Invoice]) -> String {
    let recent = invoices
        .iter()
        .take(RECENT_INVOICE_LIMIT)
        .map(|inv| {
            format!(
                "Invoice #{} for {:.2} with status {}",
                inv.invoice_number,
                inv.total,
                inv.status.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "- Total number of invoices: {}\n\
         - Total paid invoices: {}\n\
         - Total unpaid/pending invoices: {}\n\
         - Total revenue from paid invoices: {:.2}\n\
         - Total outstanding amount from unpaid/pending invoices: {:.2}\n\
         - Recent invoices (last {RECENT_INVOICE_LIMIT}): {}",
        stats.total_invoices,
        stats.paid_invoices,
        stats.unpaid_invoices,
        stats.total_revenue,
        stats.total_outstanding,
        recent
    )
}

pub async fn summarize_dashboard(
    user_id: Uuid,
    store: &dyn InvoiceStore,
    model: &dyn TextModel,
) -> Result<DashboardInsights, AppError> {
    let invoices = store.list(user_id).await?;

    if invoices.is_empty() {
        return Ok(DashboardInsights {
            insights: vec![NO_INVOICES_INSIGHT.to_string()],
        });
    }

    let stats = InvoiceStats::from_invoices(&invoices);
    debug!("Dashboard stats for user {user_id}: {stats:?}");

    let data_summary = build_data_summary(&stats, &invoices);
    let prompt = render(DASHBOARD_INSIGHTS_PROMPT, &[("data_summary", data_summary.as_str())]);

    call_json::<DashboardInsights>(model, &prompt)
        .await
        .map_err(|e| AppError::upstream("Failed to fetch dashboard summary", e))
}
