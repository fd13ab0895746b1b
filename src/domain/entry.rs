use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Cents;

/// One signed monetary movement ("movimentação") within a sales day.
///
/// Positive values are income, negative values are outgo. The timestamp
/// is assigned by the store at insertion time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesEntry {
    pub id: i64,
    pub sales_day_id: i64,
    pub value: Cents,
    pub timestamp: DateTime<Utc>,
}

impl SalesEntry {
    pub fn is_income(&self) -> bool {
        self.value > 0
    }
}

/// Aggregates over the entries of a single day.
///
/// Invariant: `balance == income + outcome`, with `income >= 0 >= outcome`.
/// The zero value doubles as the result for a day with no entries (or no
/// row at all).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesEntryStats {
    pub count: i64,
    pub income: Cents,
    pub outcome: Cents,
    pub balance: Cents,
}

impl SalesEntryStats {
    /// Fold entry values into stats. The SQL aggregation in the store is
    /// the production path; this is the in-memory equivalent.
    pub fn from_values<I: IntoIterator<Item = Cents>>(values: I) -> Self {
        values.into_iter().fold(Self::default(), |mut stats, value| {
            stats.count += 1;
            if value > 0 {
                stats.income += value;
            } else {
                stats.outcome += value;
            }
            stats.balance += value;
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_empty() {
        assert_eq!(SalesEntryStats::from_values([]), SalesEntryStats::default());
    }

    #[test]
    fn test_stats_mixed() {
        let stats = SalesEntryStats::from_values([10000, -4000, 2500]);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.income, 12500);
        assert_eq!(stats.outcome, -4000);
        assert_eq!(stats.balance, 8500);
    }

    #[test]
    fn test_stats_balance_invariant() {
        let stats = SalesEntryStats::from_values([500, -300, -300, 1200, -1]);
        assert_eq!(stats.balance, stats.income + stats.outcome);
        assert!(stats.income >= 0);
        assert!(stats.outcome <= 0);
    }
}
