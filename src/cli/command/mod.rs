pub mod accumulation;
pub mod climatology;
pub mod download;
pub mod monthly;
pub mod snowfall;

pub use accumulation::accumulation;
pub use climatology::climatology;
pub use download::download;
pub use monthly::monthly;
pub use snowfall::snowfall;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;

/// Parses a YYYYMMDD command line date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .map_err(|e| anyhow!("bad date `{}` (expected YYYYMMDD): {}", s, e))
}

// -- Tests -------------------------------------------------------------------
