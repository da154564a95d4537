//! Stable fill ordering for deterministic processing.

use crate::domain::FillRecord;
use chrono::NaiveDate;

/// Stable ordering key for fills.
///
/// Ensures deterministic ordering of fills with the same date.
/// Ordering: fill_date -> seq (insertion order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FillOrderingKey {
    /// Calendar date (primary sort).
    pub fill_date: NaiveDate,
    /// Ledger insertion sequence (tie-breaker).
    pub seq: i64,
}

impl FillOrderingKey {
    /// Create an ordering key from a fill.
    pub fn from_fill(fill: &FillRecord) -> Self {
        FillOrderingKey {
            fill_date: fill.fill_date,
            seq: fill.seq,
        }
    }
}

/// Sort fills deterministically, oldest first.
pub fn sort_fills_deterministic(fills: &mut [FillRecord]) {
    fills.sort_by_key(FillOrderingKey::from_fill);
}

/// The most recent fill dated on or before `date`.
///
/// When several fills share the latest qualifying date, the one inserted last
/// wins. `history` does not need to be sorted.
pub fn latest_on_or_before(history: &[FillRecord], date: NaiveDate) -> Option<&FillRecord> {
    history
        .iter()
        .filter(|f| f.fill_date <= date)
        .max_by_key(|f| FillOrderingKey::from_fill(f))
}

/// Fills ordered newest first.
pub fn newest_first(history: &[FillRecord]) -> Vec<&FillRecord> {
    let mut fills: Vec<&FillRecord> = history.iter().collect();
    fills.sort_by(|a, b| FillOrderingKey::from_fill(b).cmp(&FillOrderingKey::from_fill(a)));
    fills
}
