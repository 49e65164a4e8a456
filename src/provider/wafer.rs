//! Wafer talk/schedule client.
//!
//! Speaker discovery is a two-stage paginated walk: the talks endpoint yields
//! author user ids, the tickets endpoint yields the barcodes of tickets owned
//! by those users. The remote is prone to network errors when hit quickly, so
//! a fixed pause separates page fetches.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use serenity::async_trait;

use crate::config::WaferConfig;
use crate::error::AppError;
use crate::model::CalendarEvent;
use crate::provider::{CalendarProvider, FieldValue, SpeakerProvider};
use crate::util::ics;

/// Pause between paginated requests.
const PAGE_PAUSE: Duration = Duration::from_millis(1500);

/// Client for the Wafer REST and ICS endpoints.
pub struct WaferClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    talks_endpoint: String,
    tickets_endpoint: String,
    ics_endpoint: String,
}

impl WaferClient {
    pub fn new(http: reqwest::Client, config: &WaferConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            talks_endpoint: config.talks_endpoint.clone(),
            tickets_endpoint: config.tickets_endpoint.clone(),
            ics_endpoint: config.ics_endpoint.clone(),
        }
    }

    async fn get_page<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Page<T>, AppError> {
        let page = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(page)
    }
}

#[async_trait]
impl SpeakerProvider for WaferClient {
    /// Builds the set of ticket barcodes owned by talk authors.
    async fn fetch_speaker_barcodes(&self) -> Result<HashSet<String>, AppError> {
        let mut speaker_uids: HashSet<u64> = HashSet::new();

        let mut next_url = Some(join_url(&self.base_url, &self.talks_endpoint));
        while let Some(url) = next_url {
            let page: Page<TalkRecord> = self.get_page(&url).await?;
            for talk in page.results {
                speaker_uids.extend(talk.authors);
            }
            next_url = page.next;
            if next_url.is_some() {
                tokio::time::sleep(PAGE_PAUSE).await;
            }
        }

        tokio::time::sleep(PAGE_PAUSE).await;

        let mut barcodes = HashSet::new();
        let mut next_url = Some(join_url(&self.base_url, &self.tickets_endpoint));
        while let Some(url) = next_url {
            let page: Page<TicketRecord> = self.get_page(&url).await?;
            for ticket in page.results {
                if ticket.user.is_some_and(|uid| speaker_uids.contains(&uid)) {
                    barcodes.insert(ticket.barcode.as_string());
                }
            }
            next_url = page.next;
            if next_url.is_some() {
                tokio::time::sleep(PAGE_PAUSE).await;
            }
        }

        Ok(barcodes)
    }
}

#[async_trait]
impl CalendarProvider for WaferClient {
    /// Fetches the published schedule, dropping break entries.
    async fn fetch_events(&self) -> Result<Vec<CalendarEvent>, AppError> {
        let url = join_url(&self.base_url, &self.ics_endpoint);
        let text = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let events = ics::parse_calendar(&text)?
            .into_iter()
            .filter(|event| !event.name.to_lowercase().contains("break"))
            .collect();
        Ok(events)
    }
}

#[derive(Deserialize)]
struct Page<T> {
    results: Vec<T>,
    /// Absolute URL of the next page, when there is one.
    next: Option<String>,
}

#[derive(Deserialize)]
struct TalkRecord {
    authors: Vec<u64>,
}

#[derive(Deserialize)]
struct TicketRecord {
    user: Option<u64>,
    barcode: FieldValue,
}

/// Joins an endpoint path onto the base URL; absolute paths pass through.
fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
