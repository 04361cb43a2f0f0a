use anyhow::{bail, Context, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::models::ConversationRecord;
use crate::scrapers::types::{ConversationSummary, ConversationsResponse, ListingFragments};

const LOGIN_URL: &str = "https://www.wg-gesucht.de/ajax/sessions.php?action=login";
const CONVERSATIONS_URL: &str =
    "https://www.wg-gesucht.de/ajax/conversations.php?action=all-conversations-notifications";
const CONVERSATION_PAGE_URL: &str = "https://www.wg-gesucht.de/nachricht.html";

/// Authenticated WG-Gesucht session. The login cookie lives in the client's
/// cookie store, so every request after `login` is authenticated.
pub struct WgGesuchtClient {
    client: Client,
}

impl WgGesuchtClient {
    /// Log in and return a session-carrying client
    pub async fn login(username: &str, password: &str) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .context("Failed to create HTTP client")?;

        let response = client
            .post(LOGIN_URL)
            .json(&json!({
                "login_email_username": username,
                "login_password": password,
            }))
            .send()
            .await
            .context("Login request failed")?;

        if !response.status().is_success() {
            bail!("Login failed with status {}", response.status());
        }

        Ok(Self { client })
    }

    /// Fetch the account's full conversation list
    pub async fn conversations(&self) -> Result<Vec<ConversationSummary>> {
        let body = self
            .client
            .get(CONVERSATIONS_URL)
            .send()
            .await
            .context("Failed to fetch conversation list")?
            .text()
            .await
            .context("Failed to read conversation list body")?;

        debug!("Downloaded {} bytes of conversation list", body.len());

        let response: ConversationsResponse =
            serde_json::from_str(&body).context("Malformed conversation list JSON")?;

        Ok(response.embedded.conversations)
    }

    /// Fetch the server-rendered HTML page of one conversation
    pub async fn conversation_page(&self, conversation_id: i64) -> Result<String> {
        self.client
            .get(CONVERSATION_PAGE_URL)
            .query(&[("nachrichten-id", conversation_id)])
            .send()
            .await
            .with_context(|| format!("Failed to fetch conversation {conversation_id}"))?
            .text()
            .await
            .with_context(|| format!("Failed to read conversation {conversation_id} body"))
    }
}

/// Extract the raw listing fragments from a conversation page.
///
/// The summary box renders as `type | size | price` inside the sticky box,
/// the location sits in the second column of the ad card. Returns `None`
/// when either node is missing, which is what a removed ad looks like.
/// Whether the split lines hold enough fields is checked field by field
/// during population, so a short line still yields its prefix.
pub fn parse_listing(document: &Html) -> Option<ListingFragments> {
    let summary_selector = Selector::parse("div.sticky_box_content b").ok()?;
    let card_selector = Selector::parse("div.card_body div.col-xs-12").ok()?;

    let summary = document
        .select(&summary_selector)
        .next()?
        .text()
        .collect::<String>()
        .replace(['\n', ' '], "");

    let location_line = document
        .select(&card_selector)
        .nth(1)?
        .text()
        .collect::<String>();
    let location_line = location_line.trim().replace('\n', "");

    Some(ListingFragments {
        summary: summary.split('|').map(str::to_string).collect(),
        location_parts: location_line.split('|').map(str::to_string).collect(),
    })
}

/// First population step: rental type, then the location field. A location
/// line without separator fails here and leaves the rental type in place.
/// Returns the location so the caller can geocode it.
pub fn apply_type_and_location(
    record: &mut ConversationRecord,
    fragments: &ListingFragments,
) -> Result<String> {
    let rental_type = fragments
        .summary
        .first()
        .context("Listing summary is empty")?;
    record.rental_type = Some(rental_type.clone());

    let location = fragments
        .location_parts
        .get(1)
        .context("Location line has no separator")?
        .trim()
        .to_string();
    record.location = Some(location.clone());

    Ok(location)
}

/// Final population step, after the commute lookup: size, then price.
/// Fields already written stay written when a later one is missing.
pub fn apply_size_and_price(
    record: &mut ConversationRecord,
    fragments: &ListingFragments,
) -> Result<()> {
    let size = fragments
        .summary
        .get(1)
        .context("Listing summary has no size field")?;
    record.size = Some(size.replace("m²", ""));

    let price = fragments
        .summary
        .get(2)
        .context("Listing summary has no price field")?
        .replace('€', "");
    record.price = Some(
        price
            .parse()
            .with_context(|| format!("Unparsable price {price:?}"))?,
    );

    Ok(())
}

/// Extract all message bodies from a conversation page, in document order
pub fn parse_messages(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("div.message_text") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .collect()
}
