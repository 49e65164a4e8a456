//! Quicket ticketing client.

use serde::Deserialize;
use serenity::async_trait;

use crate::config::QuicketConfig;
use crate::error::AppError;
use crate::model::Ticket;
use crate::provider::{FieldValue, TicketProvider};

const QUICKET_BASE_URL: &str = "https://api.quicket.co.za";

/// Client for the Quicket guest list API.
pub struct QuicketClient {
    http: reqwest::Client,
    api_key: String,
    user_token: String,
    event_id: u64,
}

impl QuicketClient {
    pub fn new(http: reqwest::Client, config: &QuicketConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            user_token: config.user_token.clone(),
            event_id: config.event_id,
        }
    }
}

#[async_trait]
impl TicketProvider for QuicketClient {
    /// Fetches the full guest list for the configured event.
    ///
    /// # Returns
    /// - `Ok(Vec<Ticket>)` - One record per guest, in listing order
    /// - `Err(AppError)` - Request failure or malformed payload
    async fn fetch_tickets(&self) -> Result<Vec<Ticket>, AppError> {
        let url = format!("{QUICKET_BASE_URL}/api/events/{}/guests", self.event_id);
        let response: GuestListResponse = self
            .http
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .header("usertoken", &self.user_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(tickets_from(response))
    }
}

#[derive(Deserialize)]
struct GuestListResponse {
    results: Vec<GuestRecord>,
}

#[derive(Deserialize)]
struct GuestRecord {
    #[serde(rename = "TicketInformation")]
    ticket_information: TicketInformation,
}

#[derive(Deserialize)]
struct TicketInformation {
    #[serde(rename = "Ticket Barcode")]
    barcode: FieldValue,
    #[serde(rename = "Valid")]
    valid: FieldValue,
    #[serde(rename = "First name")]
    first_name: String,
    #[serde(rename = "Surname")]
    surname: String,
    #[serde(rename = "Ticket Type")]
    ticket_type: String,
}

fn tickets_from(response: GuestListResponse) -> Vec<Ticket> {
    response
        .results
        .into_iter()
        .map(|record| {
            let info = record.ticket_information;
            Ticket {
                barcode: info.barcode.as_string(),
                valid: info.valid.as_flag(),
                first_name: info.first_name,
                surname: info.surname,
                ticket_type: info.ticket_type,
            }
        })
        .collect()
}
