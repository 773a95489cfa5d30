use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Quote line items are carried as opaque JSON; the PDF renderer and the UI
/// own their shape.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: Uuid,
    pub craftsman_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub quote_number: String,
    pub status: String,
    pub items: Value,
    pub total_amount: f64,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const QUOTE_STATUSES: &[&str] = &["draft", "sent", "accepted", "rejected"];
