//! YouTube live broadcast client.
//!
//! Walks the configured playlist for video ids, then pulls the live broadcast
//! snippets for those ids. Token acquisition is not handled here: the client
//! consumes a pre-acquired OAuth bearer token from configuration.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serenity::async_trait;

use crate::config::YouTubeConfig;
use crate::error::AppError;
use crate::model::Broadcast;
use crate::provider::BroadcastProvider;
use crate::util::sanitize;

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const PAGE_SIZE: &str = "50";

/// Client for the YouTube Data API live broadcast listing.
pub struct YouTubeClient {
    http: reqwest::Client,
    oauth_token: String,
    playlist_id: String,
}

impl YouTubeClient {
    pub fn new(http: reqwest::Client, config: &YouTubeConfig) -> Self {
        Self {
            http,
            oauth_token: config.oauth_token.clone(),
            playlist_id: config.playlist_id.clone(),
        }
    }
}

#[async_trait]
impl BroadcastProvider for YouTubeClient {
    /// Fetches all broadcasts on the playlist, sorted by scheduled start.
    async fn fetch_broadcasts(&self) -> Result<Vec<Broadcast>, AppError> {
        let playlist: PlaylistItemsResponse = self
            .http
            .get(format!("{YOUTUBE_API_BASE}/playlistItems"))
            .bearer_auth(&self.oauth_token)
            .query(&[
                ("part", "contentDetails"),
                ("playlistId", self.playlist_id.as_str()),
                ("maxResults", PAGE_SIZE),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let video_ids: Vec<String> = playlist
            .items
            .into_iter()
            .map(|item| item.content_details.video_id)
            .collect();
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let broadcasts: LiveBroadcastsResponse = self
            .http
            .get(format!("{YOUTUBE_API_BASE}/liveBroadcasts"))
            .bearer_auth(&self.oauth_token)
            .query(&[
                ("part", "snippet"),
                ("id", video_ids.join(",").as_str()),
                ("maxResults", PAGE_SIZE),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(broadcasts_from(broadcasts.items, Utc::now()))
    }
}

#[derive(Deserialize)]
struct PlaylistItemsResponse {
    items: Vec<PlaylistItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    content_details: ContentDetails,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    video_id: String,
}

#[derive(Deserialize)]
struct LiveBroadcastsResponse {
    items: Vec<LiveBroadcastItem>,
}

#[derive(Deserialize)]
struct LiveBroadcastItem {
    id: String,
    snippet: BroadcastSnippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastSnippet {
    title: String,
    #[serde(default)]
    description: String,
    scheduled_start_time: DateTime<Utc>,
    #[serde(default)]
    live_chat_id: String,
}

/// Maps broadcast snippets into domain records, sorted by start time.
fn broadcasts_from(items: Vec<LiveBroadcastItem>, now: DateTime<Utc>) -> Vec<Broadcast> {
    let mut broadcasts: Vec<Broadcast> = items
        .into_iter()
        .map(|item| {
            let snippet = item.snippet;
            Broadcast {
                stale: Broadcast::is_stale_at(snippet.scheduled_start_time, now),
                title: sanitize::to_channel_name(&snippet.title),
                original_title: snippet.title,
                description: sanitize::to_channel_topic(&snippet.description),
                start_time: snippet.scheduled_start_time,
                live_chat_id: snippet.live_chat_id,
                id: item.id,
            }
        })
        .collect();
    broadcasts.sort_by_key(|broadcast| broadcast.start_time);
    broadcasts
}
