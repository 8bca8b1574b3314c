//! Lead CRUD.
//!
//! Every write flows through `persist_lead`, which recomputes the prefix
//! index from the lead's current text fields and rewrites `lead_prefixes`
//! in the same transaction as the row. Recomputation is structural, not a
//! step callers remember to invoke — forgetting it is how a denormalized
//! index goes stale.

use std::collections::HashSet;

use chrono::Utc;
use rusqlite::params;
use serde_json::json;
use uuid::Uuid;

use super::{DbError, LeadDb};
use crate::index::{lead_prefixes, LeadTextFields};
use crate::types::{Lead, LeadFilter, LeadSource, LeadStatus, NewLead, UpdateLead};

pub(crate) const LEAD_COLUMNS: &str =
    "id, first_name, last_name, email, phone, company, status, source, notes, created_at, updated_at";

impl LeadDb {
    /// Strict row mapper for point lookups and search: a stored status or
    /// source outside the known enums is a hard conversion error.
    pub(crate) fn map_lead_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
        let status_raw: String = row.get(6)?;
        let status = LeadStatus::parse(&status_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                format!("unknown lead status {:?}", status_raw).into(),
            )
        })?;
        let source_raw: String = row.get(7)?;
        let source = LeadSource::parse(&source_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                7,
                rusqlite::types::Type::Text,
                format!("unknown lead source {:?}", source_raw).into(),
            )
        })?;

        Self::lead_from_row(row, status, source)
    }

    /// Lenient row mapper for report materialization: a row whose stored
    /// status or source no longer parses is skipped with a warning — one bad
    /// record never aborts a whole report.
    pub(crate) fn map_lead_row_lossy(row: &rusqlite::Row<'_>) -> rusqlite::Result<Option<Lead>> {
        let id: String = row.get(0)?;
        let status_raw: String = row.get(6)?;
        let source_raw: String = row.get(7)?;
        let (Some(status), Some(source)) = (
            LeadStatus::parse(&status_raw),
            LeadSource::parse(&source_raw),
        ) else {
            log::warn!(
                "Skipping lead {} in report: unrecognized status/source ({:?}/{:?})",
                id,
                status_raw,
                source_raw
            );
            return Ok(None);
        };

        Self::lead_from_row(row, status, source).map(Some)
    }

    fn lead_from_row(
        row: &rusqlite::Row<'_>,
        status: LeadStatus,
        source: LeadSource,
    ) -> rusqlite::Result<Lead> {
        Ok(Lead {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            company: row.get(5)?,
            status,
            source,
            notes: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    /// Create a lead. Assigns the id and timestamps, builds the prefix
    /// index, and records the audit entry — all in one transaction.
    pub fn create_lead(&self, new: &NewLead) -> Result<Lead, DbError> {
        let now = Utc::now().to_rfc3339();
        let lead = Lead {
            id: Uuid::new_v4().to_string(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            company: new.company.clone(),
            status: new.status.unwrap_or_default(),
            source: new.source.unwrap_or_default(),
            notes: new.notes.clone(),
            created_at: now.clone(),
            updated_at: now,
        };

        self.with_transaction(|db| {
            db.conn_ref().execute(
                "INSERT INTO leads (id, first_name, last_name, email, phone, company,
                                    status, source, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    lead.id,
                    lead.first_name,
                    lead.last_name,
                    lead.email,
                    lead.phone,
                    lead.company,
                    lead.status.as_str(),
                    lead.source.as_str(),
                    lead.notes,
                    lead.created_at,
                    lead.updated_at,
                ],
            )?;
            db.persist_lead_prefixes(&lead)?;
            db.insert_audit_entry(
                &lead.id,
                "created",
                Some(json!({ "status": lead.status.as_str(), "source": lead.source.as_str() })),
                &lead.created_at,
            )?;
            Ok(())
        })?;

        Ok(lead)
    }

    /// Apply a patch to a lead. The merged row, the rebuilt prefix index,
    /// the audit entry and (on a stage change) the status transition commit
    /// as a single atomic batch — a partial failure can never leave the
    /// audit trail inconsistent with the lead.
    ///
    /// Returns `Ok(None)` when the id is unknown.
    pub fn update_lead(&self, id: &str, patch: &UpdateLead) -> Result<Option<Lead>, DbError> {
        self.with_transaction(|db| {
            let Some(existing) = db.get_lead(id)? else {
                return Ok(None);
            };

            let mut lead = existing.clone();
            if let Some(v) = &patch.first_name {
                lead.first_name = v.clone();
            }
            if let Some(v) = &patch.last_name {
                lead.last_name = v.clone();
            }
            if let Some(v) = &patch.email {
                lead.email = Some(v.clone());
            }
            if let Some(v) = &patch.phone {
                lead.phone = Some(v.clone());
            }
            if let Some(v) = &patch.company {
                lead.company = Some(v.clone());
            }
            if let Some(v) = patch.status {
                lead.status = v;
            }
            if let Some(v) = patch.source {
                lead.source = v;
            }
            if let Some(v) = &patch.notes {
                lead.notes = Some(v.clone());
            }
            lead.updated_at = Utc::now().to_rfc3339();

            db.conn_ref().execute(
                "UPDATE leads
                 SET first_name = ?2, last_name = ?3, email = ?4, phone = ?5, company = ?6,
                     status = ?7, source = ?8, notes = ?9, updated_at = ?10
                 WHERE id = ?1",
                params![
                    lead.id,
                    lead.first_name,
                    lead.last_name,
                    lead.email,
                    lead.phone,
                    lead.company,
                    lead.status.as_str(),
                    lead.source.as_str(),
                    lead.notes,
                    lead.updated_at,
                ],
            )?;

            db.persist_lead_prefixes(&lead)?;
            db.insert_audit_entry(
                &lead.id,
                "updated",
                Some(json!({ "changed": patch.changed_fields() })),
                &lead.updated_at,
            )?;
            if existing.status != lead.status {
                db.insert_status_transition(
                    &lead.id,
                    existing.status,
                    lead.status,
                    &lead.updated_at,
                )?;
            }

            Ok(Some(lead))
        })
    }

    /// Get a lead by id.
    pub fn get_lead(&self, id: &str) -> Result<Option<Lead>, DbError> {
        let mut stmt = self.conn_ref().prepare(&format!(
            "SELECT {} FROM leads WHERE id = ?1",
            LEAD_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![id], Self::map_lead_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List leads newest-first, with optional equality filters.
    pub fn list_leads(&self, filter: &LeadFilter) -> Result<Vec<Lead>, DbError> {
        let mut sql = format!("SELECT {} FROM leads WHERE 1=1", LEAD_COLUMNS);
        let mut values: Vec<String> = Vec::new();
        if let Some(status) = filter.status {
            values.push(status.as_str().to_string());
            sql.push_str(&format!(" AND status = ?{}", values.len()));
        }
        if let Some(source) = filter.source {
            values.push(source.as_str().to_string());
            sql.push_str(&format!(" AND source = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY created_at DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = self.conn_ref().prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), Self::map_lead_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Delete a lead and its prefix rows in one transaction. The audit
    /// trail and transition log outlive the lead — the deletion itself is
    /// recorded as an audit entry in the same transaction. Returns false
    /// when the id is unknown.
    pub fn delete_lead(&self, id: &str) -> Result<bool, DbError> {
        self.with_transaction(|db| {
            let conn = db.conn_ref();
            conn.execute("DELETE FROM lead_prefixes WHERE lead_id = ?1", params![id])?;
            let deleted = conn.execute("DELETE FROM leads WHERE id = ?1", params![id])?;
            if deleted > 0 {
                db.insert_audit_entry(id, "deleted", None, &Utc::now().to_rfc3339())?;
            }
            Ok(deleted > 0)
        })
    }

    /// Fetch a lead's stored prefix set.
    pub fn get_lead_prefixes(&self, lead_id: &str) -> Result<HashSet<String>, DbError> {
        let mut stmt = self
            .conn_ref()
            .prepare("SELECT prefix FROM lead_prefixes WHERE lead_id = ?1")?;
        let rows = stmt.query_map(params![lead_id], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<HashSet<_>, _>>()?)
    }

    /// Rebuild the denormalized prefix index for a lead from its current
    /// text fields. Only ever called inside a write transaction, alongside
    /// the row it was derived from.
    fn persist_lead_prefixes(&self, lead: &Lead) -> Result<(), DbError> {
        let prefixes = lead_prefixes(&LeadTextFields {
            first_name: Some(&lead.first_name),
            last_name: Some(&lead.last_name),
            email: lead.email.as_deref(),
            phone: lead.phone.as_deref(),
            company: lead.company.as_deref(),
        });

        self.conn_ref().execute(
            "DELETE FROM lead_prefixes WHERE lead_id = ?1",
            params![lead.id],
        )?;
        let mut stmt = self
            .conn_ref()
            .prepare("INSERT INTO lead_prefixes (lead_id, prefix) VALUES (?1, ?2)")?;
        for prefix in prefixes {
            stmt.execute(params![lead.id, prefix])?;
        }
        Ok(())
    }
}
