//! Shared fixtures for unit and router tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::invoices::store::InvoiceStore;
use crate::llm_client::{LlmError, TextModel};
use crate::models::invoice::{compute_total, Invoice, InvoiceStatus, LineItem};
use crate::state::AppState;

/// A `TextModel` that returns a canned reply and records every prompt.
pub struct StubModel {
    reply: Result<String, String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubModel {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextModel for StubModel {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(|message| LlmError::Api {
            status: 500,
            message,
        })
    }
}

/// In-memory `InvoiceStore`; `list` returns newest-inserted first.
#[derive(Default)]
pub struct InMemoryInvoiceStore {
    invoices: Mutex<Vec<Invoice>>,
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn insert(&self, invoice: &Invoice) -> Result<(), AppError> {
        self.invoices.lock().unwrap().push(invoice.clone());
        Ok(())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Invoice>, AppError> {
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id && i.user_id == user_id)
            .cloned())
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<Invoice>, AppError> {
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update(&self, invoice: &Invoice) -> Result<bool, AppError> {
        let mut invoices = self.invoices.lock().unwrap();
        match invoices
            .iter_mut()
            .find(|i| i.id == invoice.id && i.user_id == invoice.user_id)
        {
            Some(existing) => {
                *existing = invoice.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut invoices = self.invoices.lock().unwrap();
        let before = invoices.len();
        invoices.retain(|i| !(i.id == id && i.user_id == user_id));
        Ok(invoices.len() < before)
    }
}

pub fn state_with(store: Arc<InMemoryInvoiceStore>, model: Arc<StubModel>) -> AppState {
    AppState {
        invoices: store,
        model,
    }
}

pub fn invoice_for(user_id: Uuid, number: &str, items: Vec<LineItem>, status: InvoiceStatus) -> Invoice {
    let now = Utc::now();
    Invoice {
        id: Uuid::new_v4(),
        user_id,
        invoice_number: number.to_string(),
        client_name: "Acme Corp".to_string(),
        email: Some("billing@acme.test".to_string()),
        address: None,
        total: compute_total(&items),
        items,
        status,
        due_date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
        created_at: now,
        updated_at: now,
    }
}

pub fn item(name: &str, quantity: f64, unit_price: f64) -> LineItem {
    LineItem {
        name: name.to_string(),
        quantity,
        unit_price,
    }
}
