//! Shared type definitions for the database layer.

use serde::Serialize;
use thiserror::Error;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),
}

/// A row from the `lead_audit` table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbAuditEntry {
    pub id: i64,
    pub lead_id: String,
    /// "created", "updated" or "deleted".
    pub action: String,
    /// JSON payload describing the mutation (changed field names, status).
    pub detail: Option<String>,
    pub created_at: String,
}

/// A row from the `status_transitions` table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStatusTransition {
    pub id: i64,
    pub lead_id: String,
    pub from_status: String,
    pub to_status: String,
    pub created_at: String,
}
