//! Persistence layer: SQLite-backed storage for enriched incident reports.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{IncidentStore, ReportStatus, StoredReport};
