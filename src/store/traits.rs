//! `IncidentStore` trait: single async interface for report persistence.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::pipeline::types::{IncidentRecord, TriageReport};

/// Lifecycle of a stored report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "pending" => Ok(Self::Pending),
            "in progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            other => Err(format!("unknown report status '{other}'")),
        }
    }
}

/// A persisted, enriched incident report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReport {
    pub report_id: String,
    pub category: String,
    pub location: String,
    pub description: String,
    pub classification: String,
    pub routing: String,
    #[serde(rename = "authority_routing_agent")]
    pub authority_routing: String,
    pub suggestions: String,
    pub media_files: Vec<String>,
    /// Intake time (ISO-8601, +05:30).
    pub timestamp: String,
    pub status: ReportStatus,
}

impl StoredReport {
    /// A fresh report id.
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Build the persisted form of a pipeline result.
    pub fn from_record(report_id: String, record: &IncidentRecord, media_files: Vec<String>) -> Self {
        let view = TriageReport::from(record);
        Self {
            report_id,
            category: view.category,
            location: view.location,
            description: view.description,
            classification: view.classification,
            routing: view.routing,
            authority_routing: view.authority_routing,
            suggestions: view.suggestions,
            media_files,
            timestamp: view.submitted_at,
            status: ReportStatus::Pending,
        }
    }
}

/// Backend-agnostic report persistence.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    /// Insert a new report.
    async fn insert_report(&self, report: &StoredReport) -> Result<(), DatabaseError>;

    /// Get a report by id.
    async fn get_report(&self, report_id: &str) -> Result<Option<StoredReport>, DatabaseError>;

    /// All reports, newest first.
    async fn list_reports(&self) -> Result<Vec<StoredReport>, DatabaseError>;

    /// Update a report's status. `NotFound` if no such report.
    async fn update_status(&self, report_id: &str, status: ReportStatus) -> Result<(), DatabaseError>;

    /// Record a reporter's feedback together with the revised classification
    /// text it produced.
    async fn insert_feedback(
        &self,
        report_id: &str,
        feedback: &str,
        revision: &str,
    ) -> Result<(), DatabaseError>;
}
