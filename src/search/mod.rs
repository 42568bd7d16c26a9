//! Listing search: collaborator traits, strategies and the fallback
//! orchestrator.

pub mod orchestrator;
pub mod params;
pub mod record;
pub mod synthetic;
pub mod traits;
pub mod url_pattern;

pub use orchestrator::{
    AttemptOutcome, SearchOrchestrator, SearchOutcome, SearchState, StrategyAttempt,
};
pub use params::QueryParams;
pub use record::{resolve_region_id, RegionId};
pub use synthetic::{SyntheticListings, SYNTHETIC_ID_PREFIX};
pub use traits::{ListingProvider, LocationResolver, PageFetcher};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A real (non-synthetic) way of obtaining listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Resolve a region id, then query the listing API for it
    RegionApi,
    /// Fetch the city filter page and read listings embedded in it
    UrlPattern,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::RegionApi => "region_api",
            StrategyKind::UrlPattern => "url_pattern",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "region_api" | "api" => Ok(StrategyKind::RegionApi),
            "url_pattern" | "url" => Ok(StrategyKind::UrlPattern),
            other => Err(format!("unknown search strategy '{other}'")),
        }
    }
}
