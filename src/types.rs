//! Shared domain types for the lead store and reporting layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pipeline stage of a lead. Closed set — reports seed a zero count for every
/// variant, so adding a stage here automatically shows up in every bucket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Proposal,
    Won,
    Lost,
}

impl LeadStatus {
    /// All statuses, in pipeline order. Aggregation buckets are pre-seeded
    /// from this list so a zero count is explicit, never absent.
    pub const ALL: [LeadStatus; 6] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Proposal,
        LeadStatus::Won,
        LeadStatus::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Proposal => "proposal",
            LeadStatus::Won => "won",
            LeadStatus::Lost => "lost",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(LeadStatus::New),
            "contacted" => Some(LeadStatus::Contacted),
            "qualified" => Some(LeadStatus::Qualified),
            "proposal" => Some(LeadStatus::Proposal),
            "won" => Some(LeadStatus::Won),
            "lost" => Some(LeadStatus::Lost),
            _ => None,
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a lead came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Website,
    Referral,
    Advertisement,
    ColdCall,
    Event,
    #[default]
    Other,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::Website => "website",
            LeadSource::Referral => "referral",
            LeadSource::Advertisement => "advertisement",
            LeadSource::ColdCall => "cold_call",
            LeadSource::Event => "event",
            LeadSource::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "website" => Some(LeadSource::Website),
            "referral" => Some(LeadSource::Referral),
            "advertisement" => Some(LeadSource::Advertisement),
            "cold_call" => Some(LeadSource::ColdCall),
            "event" => Some(LeadSource::Event),
            "other" => Some(LeadSource::Other),
            _ => None,
        }
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row from the `leads` table.
///
/// Timestamps are RFC3339 UTC strings, matching what the store writes.
/// `created_at` is immutable once set; `updated_at` moves on every write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: LeadStatus,
    pub source: LeadSource,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Lead {
    /// Display name, "First Last" with empty parts dropped.
    pub fn full_name(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if !self.first_name.trim().is_empty() {
            parts.push(self.first_name.trim());
        }
        if !self.last_name.trim().is_empty() {
            parts.push(self.last_name.trim());
        }
        parts.join(" ")
    }
}

/// Input for creating a lead. The store assigns the id and timestamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub notes: Option<String>,
}

/// Patch for updating a lead. `None` means "leave unchanged"; every field
/// that is `Some` is applied and the prefix index is recomputed from the
/// merged result before the write commits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLead {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub notes: Option<String>,
}

impl UpdateLead {
    /// Names of the fields this patch sets, for the audit detail payload.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.first_name.is_some() {
            fields.push("firstName");
        }
        if self.last_name.is_some() {
            fields.push("lastName");
        }
        if self.email.is_some() {
            fields.push("email");
        }
        if self.phone.is_some() {
            fields.push("phone");
        }
        if self.company.is_some() {
            fields.push("company");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.source.is_some() {
            fields.push("source");
        }
        if self.notes.is_some() {
            fields.push("notes");
        }
        fields
    }

    /// True if the patch touches any field that feeds the prefix index.
    pub fn touches_text_fields(&self) -> bool {
        self.first_name.is_some()
            || self.last_name.is_some()
            || self.email.is_some()
            || self.phone.is_some()
            || self.company.is_some()
    }
}

/// Equality filters for listing leads.
#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub limit: Option<usize>,
}

/// Filters applied when materializing the input list for a report.
/// Date bounds are RFC3339 strings; `start` is inclusive, `end` exclusive.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub start: Option<String>,
    pub end: Option<String>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
}
