mod commute;
mod config;
mod models;
mod scrapers;
mod storage;

use anyhow::Result;
use commute::CommutePlanner;
use config::Config;
use models::ConversationRecord;
use scraper::Html;
use scrapers::wg_gesucht::{
    apply_size_and_price, apply_type_and_location, parse_listing, parse_messages,
};
use scrapers::{ListingFragments, WgGesuchtClient};
use storage::Database;
use tracing::{debug, info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("🏠 WG Scout - WG-Gesucht inbox ingestion");
    info!("=========================================");

    let config = Config::from_env()?;
    let db = Database::connect(&config.database_url).await?;

    info!("Logging in as {}", config.username);
    let client = WgGesuchtClient::login(&config.username, &config.password).await?;
    let planner = CommutePlanner::new()?;

    let conversations = client.conversations().await?;
    info!("Fetched {} conversations", conversations.len());

    for summary in &conversations {
        let mut record = ConversationRecord::from_summary(summary)?;

        let html = client.conversation_page(record.conversation_id).await?;
        let (fragments, messages) = {
            let document = Html::parse_document(&html);
            (parse_listing(&document), parse_messages(&document))
        };

        match fragments {
            Some(fragments) => {
                // Extraction stops at the first missing piece; fields
                // populated before that stay set
                if let Err(e) = enrich_from_listing(&mut record, &fragments, &planner).await {
                    debug!(
                        "Conversation {}: listing extraction stopped early: {e:#}",
                        record.conversation_id
                    );
                }
            }
            None => debug!(
                "Conversation {}: ad appears to be removed",
                record.conversation_id
            ),
        }

        let chat_id = db.insert_conversation(&record).await?;

        debug!(
            "Adding {} messages for chat: {}",
            messages.len(),
            record.conversation_id
        );
        for (number, text) in messages.iter().enumerate() {
            db.insert_message(chat_id, number as i64, text).await?;
        }
    }

    info!("✅ Ingested {} conversations", conversations.len());

    Ok(())
}

/// Populate listing fields onto the record in extraction order: rental
/// type and location, the commute lookup, then size and price. The first
/// failure stops the chain and keeps everything written before it.
async fn enrich_from_listing(
    record: &mut ConversationRecord,
    fragments: &ListingFragments,
    planner: &CommutePlanner,
) -> Result<()> {
    let location = apply_type_and_location(record, fragments)?;

    let commute = planner.commute_from(&location).await?;
    record.lat = Some(commute.lat);
    record.lon = Some(commute.lon);
    record.commute_minutes = Some(commute.minutes);

    apply_size_and_price(record, fragments)
}
