pub mod browser;
pub mod listing_page;
pub mod redfin;

pub use browser::BrowserPageFetcher;
pub use redfin::{RedfinClient, REDFIN_BASE_URL};
