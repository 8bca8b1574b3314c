//! Monthly status reporting: the drill-down aggregator.
//!
//! Pure computation over an already-materialized lead list — no store
//! access, no streaming, no incremental maintenance. Reports are rebuilt
//! from scratch on every request; the dataset is small enough that full
//! recomputation is cheaper than keeping derived counts fresh.
//!
//! Rows are `(year, month)` buckets from each lead's `created_at`, columns
//! are the closed [`LeadStatus`] set. Every bucket carries a count for every
//! status, zero included, so a stage with no leads in a month renders as 0
//! instead of disappearing from the table.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;

use crate::error::LeadError;
use crate::types::{Lead, LeadStatus};

/// Default maximum rows returned by a drill-down fetch.
pub const DRILL_DOWN_CAP: usize = 100;

/// One `(year, month)` row of the report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    /// `"{year}-{month:02}"`, e.g. `"2024-01"`.
    pub key: String,
    pub year: i32,
    pub month: u32,
    /// Count per status. Every [`LeadStatus`] variant is present.
    pub status_counts: BTreeMap<LeadStatus, usize>,
    /// Total leads in this bucket; equals the sum of `status_counts`.
    pub total: usize,
}

impl MonthBucket {
    fn empty(year: i32, month: u32) -> Self {
        let mut status_counts = BTreeMap::new();
        for status in LeadStatus::ALL {
            status_counts.insert(status, 0);
        }
        MonthBucket {
            key: bucket_key(year, month),
            year,
            month,
            status_counts,
            total: 0,
        }
    }
}

/// Format a `(year, month)` pair as a bucket key.
pub fn bucket_key(year: i32, month: u32) -> String {
    format!("{}-{:02}", year, month)
}

/// Group leads into `(year, month)` buckets of per-status counts, sorted
/// ascending by `(year, month)`.
///
/// Leads with a missing or unparseable `created_at` are skipped with a
/// warning — one bad record never aborts the whole report. For every lead
/// that parses, exactly one bucket total is incremented, so the grand total
/// across buckets equals the number of valid input leads.
pub fn aggregate_by_month(leads: &[Lead]) -> Vec<MonthBucket> {
    let mut buckets: BTreeMap<(i32, u32), MonthBucket> = BTreeMap::new();

    for lead in leads {
        let created = match DateTime::parse_from_rfc3339(&lead.created_at) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(e) => {
                log::warn!(
                    "Skipping lead {} in report: unparseable createdAt {:?}: {}",
                    lead.id,
                    lead.created_at,
                    e
                );
                continue;
            }
        };

        let (year, month) = (created.year(), created.month());
        let bucket = buckets
            .entry((year, month))
            .or_insert_with(|| MonthBucket::empty(year, month));
        *bucket.status_counts.entry(lead.status).or_insert(0) += 1;
        bucket.total += 1;
    }

    buckets.into_values().collect()
}

/// A parsed, validated `"YYYY-MM"` bucket key.
///
/// Parsing happens before any store query runs, so a malformed key from
/// stale UI state fails fast instead of turning into a meaningless
/// full-range scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketKey {
    pub year: i32,
    pub month: u32,
}

impl BucketKey {
    pub fn parse(key: &str) -> Result<Self, LeadError> {
        let invalid =
            || LeadError::InvalidInput(format!("invalid bucket key {:?}, expected YYYY-MM", key));

        let (year_part, month_part) = key.split_once('-').ok_or_else(invalid)?;
        if year_part.len() != 4 || !year_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if month_part.len() != 2 || !month_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = year_part.parse().map_err(|_| invalid())?;
        let month: u32 = month_part.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(BucketKey { year, month })
    }

    pub fn label(&self) -> String {
        bucket_key(self.year, self.month)
    }

    /// Month boundary as `[start, end)` UTC instants: the first instant of
    /// this month up to (exclusive) the first instant of the next. Over
    /// instants this is the same set as the closed interval through the last
    /// instant of the month.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = first_instant(self.year, self.month);
        let end = if self.month == 12 {
            first_instant(self.year + 1, 1)
        } else {
            first_instant(self.year, self.month + 1)
        };
        (start, end)
    }
}

fn first_instant(year: i32, month: u32) -> DateTime<Utc> {
    // month is validated to 1..=12 before this is reached
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Result of a drill-down fetch: the leads behind one `(month, status)`
/// cell, newest-first. `truncated` is set when more matches existed than the
/// cap allowed — an explicit flag rather than a silently short list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillDown {
    pub leads: Vec<Lead>,
    pub truncated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LeadSource;

    fn lead(id: &str, created_at: &str, status: LeadStatus) -> Lead {
        Lead {
            id: id.to_string(),
            first_name: "Test".to_string(),
            last_name: "Lead".to_string(),
            email: None,
            phone: None,
            company: None,
            status,
            source: LeadSource::Other,
            notes: None,
            created_at: created_at.to_string(),
            updated_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_aggregate_scenario() {
        let leads = vec![
            lead("a", "2024-01-15T10:00:00+00:00", LeadStatus::New),
            lead("b", "2024-01-20T10:00:00+00:00", LeadStatus::New),
            lead("c", "2024-02-01T10:00:00+00:00", LeadStatus::Qualified),
        ];
        let buckets = aggregate_by_month(&leads);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, "2024-01");
        assert_eq!(buckets[0].status_counts[&LeadStatus::New], 2);
        assert_eq!(buckets[0].status_counts[&LeadStatus::Qualified], 0);
        assert_eq!(buckets[0].total, 2);
        assert_eq!(buckets[1].key, "2024-02");
        assert_eq!(buckets[1].status_counts[&LeadStatus::Qualified], 1);
        assert_eq!(buckets[1].status_counts[&LeadStatus::New], 0);
        assert_eq!(buckets[1].total, 1);
    }

    #[test]
    fn test_grand_total_invariant() {
        let leads: Vec<Lead> = (0..25)
            .map(|i| {
                let month = (i % 3) + 1;
                let status = LeadStatus::ALL[i % LeadStatus::ALL.len()];
                lead(
                    &format!("l{}", i),
                    &format!("2023-{:02}-10T08:00:00+00:00", month),
                    status,
                )
            })
            .collect();

        let buckets = aggregate_by_month(&leads);
        let grand_total: usize = buckets.iter().map(|b| b.total).sum();
        assert_eq!(grand_total, leads.len());

        for bucket in &buckets {
            let status_sum: usize = bucket.status_counts.values().sum();
            assert_eq!(status_sum, bucket.total, "bucket {}", bucket.key);
        }
    }

    #[test]
    fn test_every_status_present_in_every_bucket() {
        let leads = vec![lead("a", "2024-06-01T00:00:00+00:00", LeadStatus::Won)];
        let buckets = aggregate_by_month(&leads);
        assert_eq!(buckets.len(), 1);
        for status in LeadStatus::ALL {
            assert!(buckets[0].status_counts.contains_key(&status));
        }
    }

    #[test]
    fn test_malformed_created_at_skipped_not_fatal() {
        let leads = vec![
            lead("good", "2024-03-05T12:00:00+00:00", LeadStatus::New),
            lead("bad", "not-a-timestamp", LeadStatus::New),
            lead("empty", "", LeadStatus::Contacted),
        ];
        let buckets = aggregate_by_month(&leads);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].total, 1);
    }

    #[test]
    fn test_buckets_sorted_ascending() {
        let leads = vec![
            lead("a", "2024-03-01T00:00:00+00:00", LeadStatus::New),
            lead("b", "2023-11-01T00:00:00+00:00", LeadStatus::New),
            lead("c", "2024-01-01T00:00:00+00:00", LeadStatus::New),
        ];
        let keys: Vec<String> = aggregate_by_month(&leads)
            .into_iter()
            .map(|b| b.key)
            .collect();
        assert_eq!(keys, vec!["2023-11", "2024-01", "2024-03"]);
    }

    #[test]
    fn test_empty_input_yields_no_buckets() {
        assert!(aggregate_by_month(&[]).is_empty());
    }

    #[test]
    fn test_bucket_key_parse_valid() {
        let key = BucketKey::parse("2024-01").expect("valid key");
        assert_eq!(key.year, 2024);
        assert_eq!(key.month, 1);
        assert_eq!(key.label(), "2024-01");
    }

    #[test]
    fn test_bucket_key_parse_rejects_malformed() {
        for bad in ["", "2024", "2024-13", "2024-00", "24-01", "2024-1", "2024-jan", "2024-011"] {
            let err = BucketKey::parse(bad).expect_err(bad);
            assert!(matches!(err, LeadError::InvalidInput(_)), "{}", bad);
        }
    }

    #[test]
    fn test_month_bounds_cover_whole_month() {
        let key = BucketKey::parse("2024-02").unwrap();
        let (start, end) = key.bounds();
        assert_eq!(start.to_rfc3339(), "2024-02-01T00:00:00+00:00");
        // 2024 is a leap year — the interval runs through Feb 29.
        assert_eq!(end.to_rfc3339(), "2024-03-01T00:00:00+00:00");

        let december = BucketKey::parse("2024-12").unwrap();
        let (_, dec_end) = december.bounds();
        assert_eq!(dec_end.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }
}
