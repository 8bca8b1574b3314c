//! leadbook — lead management backend.
//!
//! A SQLite-backed lead store with two deliberately pure cores:
//!
//! - [`index`]: the prefix index builder. The store only answers exact-match
//!   and membership queries, so "starts with" search works by denormalizing
//!   every prefix of every normalized token onto the lead at write time.
//! - [`reports`]: the drill-down aggregator. Monthly `(year, month, status)`
//!   count tables built in memory from an already-fetched lead list, with
//!   on-demand re-fetch of the leads behind any single cell.
//!
//! Neither core touches the store; [`db::LeadDb`] feeds them and persists
//! their output. Writes that touch searchable fields rebuild the prefix
//! index inside the same transaction as the field change, and every
//! mutation commits together with its audit entry.

pub mod db;
pub mod error;
pub mod index;
mod migrations;
pub mod reports;
pub mod types;

pub use db::{DbError, LeadDb};
pub use error::LeadError;
pub use index::{lead_prefixes, LeadTextFields, PREFIX_CAP};
pub use reports::{aggregate_by_month, BucketKey, DrillDown, MonthBucket, DRILL_DOWN_CAP};
pub use types::{Lead, LeadFilter, LeadSource, LeadStatus, NewLead, ReportFilter, UpdateLead};
