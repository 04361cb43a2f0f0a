use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::scrapers::ConversationSummary;

/// Timestamp format used by the conversation-list endpoint
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of the `chat` table. Listing fields stay `None` when the ad
/// behind the conversation has been removed.
#[derive(Debug, Clone)]
pub struct ConversationRecord {
    /// Provider-assigned conversation id (unique per account)
    pub conversation_id: i64,
    /// Free-text location of the listing, as shown on the page
    pub location: Option<String>,
    /// Size in square meters, `m²` suffix stripped
    pub size: Option<String>,
    /// Rental type (WG room, 1-Zimmer-Wohnung, ...)
    pub rental_type: Option<String>,
    /// Latitude as returned by the geocoder
    pub lat: Option<String>,
    /// Longitude as returned by the geocoder
    pub lon: Option<String>,
    /// Public-transit commute to campus, in minutes
    pub commute_minutes: Option<f64>,
    /// Monthly rent in euros
    pub price: Option<i64>,
    pub unread: bool,
    pub last_message_time: NaiveDateTime,
    pub last_visited: NaiveDateTime,
}

impl ConversationRecord {
    /// Build a record from a conversation-list entry. Listing fields are
    /// filled in later, once the conversation page has been scraped.
    pub fn from_summary(summary: &ConversationSummary) -> Result<Self> {
        Ok(Self {
            conversation_id: summary.conversation_id,
            location: None,
            size: None,
            rental_type: None,
            lat: None,
            lon: None,
            commute_minutes: None,
            price: None,
            unread: summary.unread != 0,
            last_message_time: parse_timestamp(&summary.last_message_timestamp)?,
            last_visited: parse_timestamp(&summary.last_visited)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .with_context(|| format!("invalid timestamp {raw:?}"))
}
