pub mod types;
pub mod wg_gesucht;

pub use types::{ConversationSummary, ListingFragments};
pub use wg_gesucht::WgGesuchtClient;
