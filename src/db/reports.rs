//! Store side of monthly reporting.
//!
//! `leads_for_report` materializes the full input list for the pure
//! aggregator; `drill_down` re-fetches the leads behind one report cell.
//! Both validate caller input before touching the store.

use rusqlite::params;

use super::{DbError, LeadDb};
use crate::error::LeadError;
use crate::reports::{aggregate_by_month, BucketKey, DrillDown, MonthBucket};
use crate::types::{Lead, LeadStatus, ReportFilter};

impl LeadDb {
    /// Materialize the lead list a report is built over. Filters are plain
    /// equality/range clauses pushed into SQL; the aggregation itself stays
    /// in memory.
    ///
    /// Rows with an unrecognized stored status or source are skipped with a
    /// warning rather than failing the whole report, matching how the
    /// aggregator treats unparseable timestamps.
    pub fn leads_for_report(&self, filter: &ReportFilter) -> Result<Vec<Lead>, DbError> {
        let mut sql = format!(
            "SELECT {} FROM leads WHERE 1=1",
            super::leads::LEAD_COLUMNS
        );
        let mut values: Vec<String> = Vec::new();
        if let Some(start) = &filter.start {
            values.push(start.clone());
            sql.push_str(&format!(" AND created_at >= ?{}", values.len()));
        }
        if let Some(end) = &filter.end {
            values.push(end.clone());
            sql.push_str(&format!(" AND created_at < ?{}", values.len()));
        }
        if let Some(status) = filter.status {
            values.push(status.as_str().to_string());
            sql.push_str(&format!(" AND status = ?{}", values.len()));
        }
        if let Some(source) = filter.source {
            values.push(source.as_str().to_string());
            sql.push_str(&format!(" AND source = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY created_at ASC");

        let mut stmt = self.conn_ref().prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(values.iter()),
            Self::map_lead_row_lossy,
        )?;
        let mut leads = Vec::new();
        for row in rows {
            if let Some(lead) = row? {
                leads.push(lead);
            }
        }
        Ok(leads)
    }

    /// Fetch-and-aggregate convenience: the monthly status report for the
    /// filtered lead set. Rebuilt from scratch on every call.
    pub fn monthly_report(&self, filter: &ReportFilter) -> Result<Vec<MonthBucket>, DbError> {
        let leads = self.leads_for_report(filter)?;
        Ok(aggregate_by_month(&leads))
    }

    /// Retrieve the leads behind one `(month, status)` report cell,
    /// newest-first, capped at `cap` rows.
    ///
    /// The bucket key and cap are validated before any query runs: a
    /// malformed key or a zero cap is `InvalidInput`, which the caller can
    /// tell apart from a legitimate empty cell. The query fetches one row
    /// past the cap so truncation is reported explicitly.
    pub fn drill_down(
        &self,
        bucket_key: &str,
        status: LeadStatus,
        cap: usize,
    ) -> Result<DrillDown, LeadError> {
        let key = BucketKey::parse(bucket_key)?;
        if cap == 0 {
            return Err(LeadError::InvalidInput(
                "drill-down cap must be greater than zero".to_string(),
            ));
        }

        let (start, end) = key.bounds();
        // Fetch one row past the cap; saturate so an absurd cap can't
        // overflow the LIMIT computation.
        let limit = i64::try_from(cap.saturating_add(1)).unwrap_or(i64::MAX);
        let mut stmt = self
            .conn_ref()
            .prepare(&format!(
                "SELECT {} FROM leads
                 WHERE status = ?1 AND created_at >= ?2 AND created_at < ?3
                 ORDER BY created_at DESC
                 LIMIT ?4",
                super::leads::LEAD_COLUMNS
            ))
            .map_err(DbError::from)?;
        let rows = stmt
            .query_map(
                params![status.as_str(), start.to_rfc3339(), end.to_rfc3339(), limit],
                Self::map_lead_row,
            )
            .map_err(DbError::from)?;
        let mut leads = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)?;

        let truncated = leads.len() > cap;
        leads.truncate(cap);
        Ok(DrillDown { leads, truncated })
    }
}
