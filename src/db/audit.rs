//! Audit trail and status-transition log.
//!
//! Writes happen only from inside the lead write transactions in
//! `db::leads`, so an audit row can never exist without the mutation it
//! describes (and vice versa).

use rusqlite::params;

use super::{DbAuditEntry, DbError, DbStatusTransition, LeadDb};
use crate::types::LeadStatus;

impl LeadDb {
    pub(crate) fn insert_audit_entry(
        &self,
        lead_id: &str,
        action: &str,
        detail: Option<serde_json::Value>,
        created_at: &str,
    ) -> Result<(), DbError> {
        self.conn_ref().execute(
            "INSERT INTO lead_audit (lead_id, action, detail, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![lead_id, action, detail.map(|d| d.to_string()), created_at],
        )?;
        Ok(())
    }

    pub(crate) fn insert_status_transition(
        &self,
        lead_id: &str,
        from: LeadStatus,
        to: LeadStatus,
        created_at: &str,
    ) -> Result<(), DbError> {
        self.conn_ref().execute(
            "INSERT INTO status_transitions (lead_id, from_status, to_status, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![lead_id, from.as_str(), to.as_str(), created_at],
        )?;
        Ok(())
    }

    /// Audit entries for a lead, newest-first.
    pub fn get_lead_audit(&self, lead_id: &str, limit: usize) -> Result<Vec<DbAuditEntry>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT id, lead_id, action, detail, created_at
             FROM lead_audit
             WHERE lead_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![lead_id, limit as i64], |row| {
            Ok(DbAuditEntry {
                id: row.get(0)?,
                lead_id: row.get(1)?,
                action: row.get(2)?,
                detail: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Status transitions for a lead, newest-first.
    pub fn get_status_transitions(
        &self,
        lead_id: &str,
    ) -> Result<Vec<DbStatusTransition>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT id, lead_id, from_status, to_status, created_at
             FROM status_transitions
             WHERE lead_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![lead_id], |row| {
            Ok(DbStatusTransition {
                id: row.get(0)?,
                lead_id: row.get(1)?,
                from_status: row.get(2)?,
                to_status: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
