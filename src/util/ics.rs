//! Minimal ICS calendar reader.
//!
//! Reads just the subset of RFC 5545 that the conference schedule export
//! emits: VEVENT blocks with SUMMARY, DTSTART and LOCATION properties, with
//! timestamps in UTC. Entries missing a summary or start time are skipped.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{internal::InternalError, AppError};
use crate::model::CalendarEvent;

/// Parses an ICS document into calendar events.
///
/// # Arguments
/// - `text` - The raw ICS document
///
/// # Returns
/// - `Ok(Vec<CalendarEvent>)` - Every complete VEVENT in document order
/// - `Err(AppError)` - A DTSTART value could not be parsed
pub fn parse_calendar(text: &str) -> Result<Vec<CalendarEvent>, AppError> {
    let mut events = Vec::new();
    let mut current: Option<PartialEvent> = None;

    for line in unfold_lines(text) {
        let Some((name, value)) = split_property(&line) else {
            continue;
        };

        match name.as_str() {
            "BEGIN" if value == "VEVENT" => current = Some(PartialEvent::default()),
            "END" if value == "VEVENT" => {
                if let Some(event) = current.take().and_then(PartialEvent::finish) {
                    events.push(event);
                }
            }
            "SUMMARY" => {
                if let Some(partial) = current.as_mut() {
                    partial.summary = Some(unescape(value));
                }
            }
            "LOCATION" => {
                if let Some(partial) = current.as_mut() {
                    partial.location = unescape(value);
                }
            }
            "DTSTART" => {
                if let Some(partial) = current.as_mut() {
                    partial.start = Some(parse_timestamp(value)?);
                }
            }
            _ => {}
        }
    }

    Ok(events)
}

#[derive(Default)]
struct PartialEvent {
    summary: Option<String>,
    start: Option<DateTime<Utc>>,
    location: String,
}

impl PartialEvent {
    fn finish(self) -> Option<CalendarEvent> {
        Some(CalendarEvent {
            name: self.summary?,
            start: self.start?,
            location: self.location,
        })
    }
}

/// Joins folded continuation lines (lines starting with a space or tab) onto
/// their preceding line.
fn unfold_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.lines() {
        if let Some(rest) = raw.strip_prefix(' ').or_else(|| raw.strip_prefix('\t')) {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        lines.push(raw.trim_end_matches('\r').to_string());
    }
    lines
}

/// Splits a content line into its property name (parameters stripped) and
/// value.
fn split_property(line: &str) -> Option<(String, &str)> {
    let (head, value) = line.split_once(':')?;
    let name = head.split(';').next().unwrap_or(head);
    Some((name.to_ascii_uppercase(), value))
}

/// Parses a DTSTART value, treating naive timestamps as UTC.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, AppError> {
    let bare = value.trim().trim_end_matches('Z');

    if let Ok(dt) = NaiveDateTime::parse_from_str(bare, "%Y%m%dT%H%M%S") {
        return Ok(dt.and_utc());
    }
    // All-day entries carry a bare date.
    if let Ok(date) = NaiveDate::parse_from_str(bare, "%Y%m%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }

    Err(InternalError::InvalidIcsTimestamp {
        value: value.to_string(),
        reason: "not a YYYYMMDDTHHMMSS[Z] or YYYYMMDD value".to_string(),
    }
    .into())
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(escaped) => out.push(escaped),
            None => out.push('\\'),
        }
    }
    out
}
