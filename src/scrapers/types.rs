use serde::Deserialize;

/// One entry of the conversation-list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: i64,
    /// `%Y-%m-%d %H:%M:%S`
    pub last_message_timestamp: String,
    /// `%Y-%m-%d %H:%M:%S`
    pub last_visited: String,
    /// 0 means read
    pub unread: i64,
}

/// Envelope around the conversation list (HAL-style `_embedded`)
#[derive(Debug, Deserialize)]
pub(crate) struct ConversationsResponse {
    #[serde(rename = "_embedded")]
    pub embedded: EmbeddedConversations,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddedConversations {
    pub conversations: Vec<ConversationSummary>,
}

/// Raw listing fragments scraped from a conversation page, before
/// field-by-field population: the `|`-split summary line of the sticky box
/// (`type | size | price`) and the `|`-split location line of the ad card.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFragments {
    pub summary: Vec<String>,
    pub location_parts: Vec<String>,
}
