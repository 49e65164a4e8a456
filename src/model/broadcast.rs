use chrono::{DateTime, Duration, Utc};

/// A live broadcast scheduled on the conference streaming playlist.
///
/// Built from the provider's raw snippet with the title/description already
/// sanitized for Discord use; the originals are kept for the pinned messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    /// Video id, usable to build a watch link.
    pub id: String,
    /// Channel-name-safe version of the title.
    pub title: String,
    pub original_title: String,
    /// Topic-safe version of the description.
    pub description: String,
    pub start_time: DateTime<Utc>,
    /// Chat session id attached to the broadcast.
    pub live_chat_id: String,
    /// Set when the broadcast started more than an hour ago. Stale broadcasts
    /// are parked at a fixed low-priority channel position.
    pub stale: bool,
}

impl Broadcast {
    /// A watch link for this broadcast.
    pub fn link(&self) -> String {
        format!("https://youtu.be/{}", self.id)
    }

    /// Whether a broadcast that started at `start_time` counts as stale at
    /// `now`.
    pub fn is_stale_at(start_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        start_time + Duration::hours(1) < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stale_only_after_an_hour() {
        let start = Utc.with_ymd_and_hms(2021, 10, 7, 9, 0, 0).unwrap();
        assert!(!Broadcast::is_stale_at(start, start + Duration::minutes(59)));
        assert!(!Broadcast::is_stale_at(start, start + Duration::hours(1)));
        assert!(Broadcast::is_stale_at(
            start,
            start + Duration::hours(1) + Duration::seconds(1)
        ));
    }

    #[test]
    fn link_points_at_video_id() {
        let broadcast = Broadcast {
            id: "abc123".to_string(),
            title: "talk-a".to_string(),
            original_title: "Talk A".to_string(),
            description: String::new(),
            start_time: Utc::now(),
            live_chat_id: String::new(),
            stale: false,
        };
        assert_eq!(broadcast.link(), "https://youtu.be/abc123");
    }
}
