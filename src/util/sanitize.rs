/// Maximum length of a Discord channel name.
const CHANNEL_NAME_MAX: usize = 100;

/// Maximum length of a Discord channel topic.
const CHANNEL_TOPIC_MAX: usize = 1024;

/// Converts a broadcast title into a Discord-channel-safe name.
///
/// Lowercases, maps whitespace and punctuation runs to single dashes, strips
/// everything outside `[a-z0-9-]`, trims leading/trailing dashes and caps the
/// result at Discord's channel name limit. Titles that differ only in
/// punctuation therefore collide, which is what the duplicate-channel
/// reconciliation step cleans up.
pub fn to_channel_name(title: &str) -> String {
    let mut name = String::with_capacity(title.len());
    let mut last_dash = true; // suppress a leading dash
    for c in title.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            name.push(c);
            last_dash = false;
        } else if !last_dash {
            name.push('-');
            last_dash = true;
        }
    }
    while name.ends_with('-') {
        name.pop();
    }
    name.truncate(CHANNEL_NAME_MAX);
    name
}

/// Truncates a broadcast description to fit a Discord channel topic.
///
/// Cuts on a character boundary and trims trailing whitespace left by the cut.
pub fn to_channel_topic(description: &str) -> String {
    let mut topic: String = description.chars().take(CHANNEL_TOPIC_MAX).collect();
    topic.truncate(topic.trim_end().len());
    topic
}
