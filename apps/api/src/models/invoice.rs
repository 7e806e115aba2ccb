use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Payment status. Anything other than `Paid` counts as outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Paid,
    #[default]
    Pending,
    Unpaid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Unpaid => "Unpaid",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "Paid" => InvoiceStatus::Paid,
            "Unpaid" => InvoiceStatus::Unpaid,
            _ => InvoiceStatus::Pending,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, InvoiceStatus::Paid)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub quantity: f64,
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub unit_price: f64,
}

/// Accepts `2`, `2.5` or `"2.5"`. Model replies quote numbers often enough.
fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    let value = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n,
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expected a number, got {s:?}")))?,
    };
    if !value.is_finite() {
        return Err(de::Error::custom("expected a finite number"));
    }
    Ok(value)
}

impl LineItem {
    pub fn amount(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// total = Σ quantity × unitPrice
pub fn compute_total(items: &[LineItem]) -> f64 {
    items.iter().map(LineItem::amount).sum()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub user_id: Uuid,
    pub invoice_number: String,
    pub client_name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub items: Vec<LineItem>,
    pub total: f64,
    pub status: InvoiceStatus,
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Replaces the line items and recomputes the total.
    pub fn set_items(&mut self, items: Vec<LineItem>) {
        self.total = compute_total(&items);
        self.items = items;
    }
}

/// Row shape of the `invoices` table.
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub invoice_number: String,
    pub client_name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub items: Json<Vec<LineItem>>,
    pub total: f64,
    pub status: String,
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Invoice {
            id: row.id,
            user_id: row.user_id,
            invoice_number: row.invoice_number,
            client_name: row.client_name,
            email: row.email,
            address: row.address,
            items: row.items.0,
            total: row.total,
            status: InvoiceStatus::from_db(&row.status),
            due_date: row.due_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, quantity: f64, unit_price: f64) -> LineItem {
        LineItem {
            name: name.to_string(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn test_compute_total_sums_quantity_times_price() {
        let items = vec![item("Logo", 1.0, 300.0), item("Hours", 2.5, 80.0)];
        assert!((compute_total(&items) - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_compute_total_empty_is_zero() {
        assert_eq!(compute_total(&[]), 0.0);
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&InvoiceStatus::Paid).unwrap(), r#""Paid""#);
        let s: InvoiceStatus = serde_json::from_str(r#""Unpaid""#).unwrap();
        assert_eq!(s, InvoiceStatus::Unpaid);
    }

    #[test]
    fn test_status_from_db_roundtrips_known_values() {
        for status in [InvoiceStatus::Paid, InvoiceStatus::Pending, InvoiceStatus::Unpaid] {
            assert_eq!(InvoiceStatus::from_db(status.as_str()), status);
        }
        assert_eq!(InvoiceStatus::from_db("garbage"), InvoiceStatus::Pending);
    }

    #[test]
    fn test_only_paid_is_paid() {
        assert!(InvoiceStatus::Paid.is_paid());
        assert!(!InvoiceStatus::Pending.is_paid());
        assert!(!InvoiceStatus::Unpaid.is_paid());
    }

    #[test]
    fn test_line_item_accepts_quoted_numbers() {
        let parsed: LineItem =
            serde_json::from_str(r#"{"name": "Chair", "quantity": " 2 ", "unitPrice": 40.5}"#)
                .unwrap();
        assert_eq!(parsed, item("Chair", 2.0, 40.5));
    }

    #[test]
    fn test_line_item_rejects_non_numeric_strings() {
        for bad in [r#""two""#, r#""NaN""#, "null"] {
            let json = format!(r#"{{"name": "Chair", "quantity": {bad}, "unitPrice": 1}}"#);
            assert!(serde_json::from_str::<LineItem>(&json).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn test_line_item_uses_camel_case() {
        let json = serde_json::to_value(item("Design", 2.0, 50.0)).unwrap();
        assert_eq!(json["unitPrice"], 50.0);
    }
}
