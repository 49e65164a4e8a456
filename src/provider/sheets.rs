//! Google Sheets registration log.
//!
//! The worksheet is the durable record of which tickets were registered and by
//! whom: one row per registration, barcode in the first column. The bot only
//! ever appends rows and scans the barcode column.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use serenity::async_trait;

use crate::config::SheetsConfig;
use crate::error::AppError;
use crate::model::Ticket;
use crate::provider::RegistrationStore;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Client for the Google Sheets values API.
pub struct SheetsClient {
    http: reqwest::Client,
    oauth_token: String,
    sheet_id: String,
    worksheet: String,
}

impl SheetsClient {
    pub fn new(http: reqwest::Client, config: &SheetsConfig) -> Self {
        Self {
            http,
            oauth_token: config.oauth_token.clone(),
            sheet_id: config.sheet_id.clone(),
            worksheet: config.worksheet.clone(),
        }
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "{SHEETS_API_BASE}/{}/values/{}!{range}{suffix}",
            self.sheet_id, self.worksheet
        )
    }
}

#[async_trait]
impl RegistrationStore for SheetsClient {
    /// Scans the barcode column for the given barcode.
    async fn is_ticket_used(&self, barcode: &str) -> Result<bool, AppError> {
        let response: ValueRange = self
            .http
            .get(self.values_url("A:A", ""))
            .bearer_auth(&self.oauth_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .values
            .unwrap_or_default()
            .iter()
            .any(|row| row_matches(row, barcode)))
    }

    /// Appends a registration row: barcode, full name, Discord name, Discord
    /// id, timestamp.
    async fn append_registration(
        &self,
        ticket: &Ticket,
        member_name: &str,
        member_id: u64,
    ) -> Result<(), AppError> {
        let row = json!({
            "values": [[
                ticket.barcode,
                ticket.full_name(),
                member_name,
                member_id.to_string(),
                Utc::now().to_rfc3339(),
            ]]
        });

        self.http
            .post(self.values_url("A:E", ":append"))
            .bearer_auth(&self.oauth_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&row)
            .send()
            .await?
            .error_for_status()?;

        tracing::info!(
            "Registered barcode {} for {} ({})",
            ticket.barcode,
            member_name,
            member_id
        );
        Ok(())
    }
}

#[derive(Deserialize)]
struct ValueRange {
    values: Option<Vec<Vec<Value>>>,
}

/// Whether the first cell of a row holds the given barcode. The sheet may
/// store barcodes as numbers or strings depending on how rows were written.
fn row_matches(row: &[Value], barcode: &str) -> bool {
    match row.first() {
        Some(Value::String(cell)) => cell == barcode,
        Some(Value::Number(cell)) => cell.to_string() == barcode,
        _ => false,
    }
}
