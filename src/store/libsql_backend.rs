//! libSQL backend: async `IncidentStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{IncidentStore, ReportStatus, StoredReport};

/// Column list shared by every report SELECT.
const REPORT_COLUMNS: &str = "report_id, category, location, description, classification, \
     routing, authority_routing, suggestions, media_files, timestamp, status";

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Map a libsql Row to a StoredReport. Column order matches REPORT_COLUMNS.
fn row_to_report(row: &libsql::Row) -> Result<StoredReport, DatabaseError> {
    let get = |idx: i32| -> Result<String, DatabaseError> {
        row.get::<String>(idx)
            .map_err(|e| DatabaseError::Query(format!("report column {idx}: {e}")))
    };

    let media_json = get(8)?;
    let media_files: Vec<String> = serde_json::from_str(&media_json)
        .map_err(|e| DatabaseError::Serialization(format!("media_files: {e}")))?;
    let status = get(10)?.parse().unwrap_or_default();

    Ok(StoredReport {
        report_id: get(0)?,
        category: get(1)?,
        location: get(2)?,
        description: get(3)?,
        classification: get(4)?,
        routing: get(5)?,
        authority_routing: get(6)?,
        suggestions: get(7)?,
        media_files,
        timestamp: get(9)?,
        status,
    })
}

// ── IncidentStore implementation ────────────────────────────────────

#[async_trait]
impl IncidentStore for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    async fn insert_report(&self, report: &StoredReport) -> Result<(), DatabaseError> {
        let media_json = serde_json::to_string(&report.media_files)
            .map_err(|e| DatabaseError::Serialization(format!("media_files: {e}")))?;

        self.conn()
            .execute(
                "INSERT INTO incident_reports (report_id, category, location, description, \
                 classification, routing, authority_routing, suggestions, media_files, timestamp, status) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    report.report_id.clone(),
                    report.category.clone(),
                    report.location.clone(),
                    report.description.clone(),
                    report.classification.clone(),
                    report.routing.clone(),
                    report.authority_routing.clone(),
                    report.suggestions.clone(),
                    media_json,
                    report.timestamp.clone(),
                    report.status.as_str(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_report: {e}")))?;

        debug!(report_id = %report.report_id, "Report stored");
        Ok(())
    }

    async fn get_report(&self, report_id: &str) -> Result<Option<StoredReport>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {REPORT_COLUMNS} FROM incident_reports WHERE report_id = ?1"),
                params![report_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_report: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_report(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_report: {e}"))),
        }
    }

    async fn list_reports(&self) -> Result<Vec<StoredReport>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {REPORT_COLUMNS} FROM incident_reports ORDER BY timestamp DESC, rowid DESC"
                ),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_reports: {e}")))?;

        let mut reports = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_reports: {e}")))?
        {
            reports.push(row_to_report(&row)?);
        }
        Ok(reports)
    }

    async fn update_status(&self, report_id: &str, status: ReportStatus) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let changed = self
            .conn()
            .execute(
                "UPDATE incident_reports SET status = ?1, updated_at = ?2 WHERE report_id = ?3",
                params![status.as_str(), now, report_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_status: {e}")))?;

        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "incident_report".to_string(),
                id: report_id.to_string(),
            });
        }

        debug!(report_id, status = %status, "Report status updated");
        Ok(())
    }

    async fn insert_feedback(
        &self,
        report_id: &str,
        feedback: &str,
        revision: &str,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO report_feedback (id, report_id, feedback, revision) VALUES (?1, ?2, ?3, ?4)",
                params![Uuid::new_v4().to_string(), report_id, feedback, revision],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_feedback: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: &str, timestamp: &str) -> StoredReport {
        StoredReport {
            report_id: id.to_string(),
            category: "Fire".into(),
            location: "Sector 5 (12.97, 77.59)".into(),
            description: "Smoke".into(),
            classification: "Type: Fire\nUrgency: high\nSeverity: 3".into(),
            routing: "community push notification;authority email".into(),
            authority_routing: "Department of Fire and Emergency Services".into(),
            suggestions: "Stay back.".into(),
            media_files: vec![format!("{id}_photo.jpg")],
            timestamp: timestamp.into(),
            status: ReportStatus::Pending,
        }
    }

    #[tokio::test]
    async fn insert_and_get_roundtrip() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        let r = report("r1", "2026-03-01T09:30:00.000000+05:30");
        db.insert_report(&r).await.unwrap();

        let loaded = db.get_report("r1").await.unwrap().unwrap();
        assert_eq!(loaded, r);
        assert!(db.get_report("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        db.insert_report(&report("old", "2026-03-01T09:30:00.000000+05:30"))
            .await
            .unwrap();
        db.insert_report(&report("new", "2026-03-02T09:30:00.000000+05:30"))
            .await
            .unwrap();

        let ids: Vec<String> = db
            .list_reports()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.report_id)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn status_update_and_missing_report() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        db.insert_report(&report("r1", "2026-03-01T09:30:00.000000+05:30"))
            .await
            .unwrap();

        db.update_status("r1", ReportStatus::Resolved).await.unwrap();
        let loaded = db.get_report("r1").await.unwrap().unwrap();
        assert_eq!(loaded.status, ReportStatus::Resolved);

        let err = db.update_status("nope", ReportStatus::Resolved).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn feedback_is_recorded() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        db.insert_report(&report("r1", "2026-03-01T09:30:00.000000+05:30"))
            .await
            .unwrap();
        db.insert_feedback("r1", "not a fire", "Type: Others").await.unwrap();

        let mut rows = db
            .conn()
            .query("SELECT COUNT(*) FROM report_feedback WHERE report_id = 'r1'", ())
            .await
            .unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 1);
    }
}
