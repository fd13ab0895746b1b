use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::SalesEntryStats;

/// One calendar day of the cash register ("caixa").
///
/// Exactly one row exists per date; at most one day is open at any time.
/// Days are closed by the sweep that runs whenever another day becomes
/// current, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesDay {
    pub id: i64,
    pub date: NaiveDate,
    pub open: bool,
}

impl SalesDay {
    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// A sales day joined with the aggregates over its entries.
///
/// Days without entries carry zeroed stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteSalesDay {
    #[serde(flatten)]
    pub day: SalesDay,
    #[serde(flatten)]
    pub stats: SalesEntryStats,
}
