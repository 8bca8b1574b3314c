//! Prefix search over the denormalized index.
//!
//! The store answers one membership probe per query, combined with plain
//! equality filters. Multi-word terms therefore run the first word as the
//! SQL probe and post-filter the broader candidate set client-side against
//! each lead's stored prefix set.

use super::{DbError, LeadDb};
use crate::index::normalize_query;
use crate::types::{Lead, LeadFilter};

impl LeadDb {
    /// Search leads whose prefix set contains the normalized term,
    /// optionally narrowed by status/source, newest-first.
    ///
    /// An empty or all-punctuation term normalizes to nothing and returns an
    /// empty list — a valid result, not an error.
    pub fn search_leads(&self, term: &str, filter: &LeadFilter) -> Result<Vec<Lead>, DbError> {
        let probes = normalize_query(term);
        let Some(sql_probe) = probes.first() else {
            return Ok(Vec::new());
        };

        let mut sql = format!(
            "SELECT {} FROM leads l
             JOIN lead_prefixes lp ON lp.lead_id = l.id
             WHERE lp.prefix = ?1",
            super::leads::LEAD_COLUMNS
        );
        let mut values: Vec<String> = vec![sql_probe.clone()];
        if let Some(status) = filter.status {
            values.push(status.as_str().to_string());
            sql.push_str(&format!(" AND l.status = ?{}", values.len()));
        }
        if let Some(source) = filter.source {
            values.push(source.as_str().to_string());
            sql.push_str(&format!(" AND l.source = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY l.created_at DESC");

        let mut stmt = self.conn_ref().prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(values.iter()),
            Self::map_lead_row,
        )?;
        let mut leads = rows.collect::<Result<Vec<_>, _>>()?;

        // Remaining probes (the joined multi-word term) can't go in the SQL
        // query; check them against each candidate's stored set.
        if probes.len() > 1 {
            let mut kept = Vec::with_capacity(leads.len());
            for lead in leads {
                let prefixes = self.get_lead_prefixes(&lead.id)?;
                if probes[1..].iter().all(|p| prefixes.contains(p)) {
                    kept.push(lead);
                }
            }
            leads = kept;
        }

        if let Some(limit) = filter.limit {
            leads.truncate(limit);
        }
        Ok(leads)
    }
}
