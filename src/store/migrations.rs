//! Versioned schema for the report store.

use libsql::Connection;

use crate::error::DatabaseError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "incident_reports",
        sql: r#"
            CREATE TABLE IF NOT EXISTS incident_reports (
                report_id TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                location TEXT NOT NULL,
                description TEXT NOT NULL,
                classification TEXT NOT NULL,
                routing TEXT NOT NULL,
                authority_routing TEXT NOT NULL,
                suggestions TEXT NOT NULL,
                media_files TEXT NOT NULL DEFAULT '[]',
                timestamp TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'Pending',
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_incident_reports_status ON incident_reports(status);
            CREATE INDEX IF NOT EXISTS idx_incident_reports_timestamp ON incident_reports(timestamp);
        "#,
    },
    Migration {
        version: 2,
        name: "report_feedback",
        sql: r#"
            CREATE TABLE IF NOT EXISTS report_feedback (
                id TEXT PRIMARY KEY,
                report_id TEXT NOT NULL REFERENCES incident_reports(report_id) ON DELETE CASCADE,
                feedback TEXT NOT NULL,
                revision TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_report_feedback_report ON report_feedback(report_id);
        "#,
    },
];

/// Bring the report schema up to the latest version.
///
/// Each pending step runs in its own transaction together with its
/// `_migrations` bookkeeping row, so a failed step leaves no partial schema.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("bookkeeping table: {e}")))?;

    let applied = applied_version(conn).await?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > applied).collect();
    if pending.is_empty() {
        tracing::debug!(version = applied, "Report schema up to date");
        return Ok(());
    }

    for migration in pending {
        apply(conn, migration).await?;
    }

    let to = applied_version(conn).await?;
    tracing::info!(from = applied, to, "Report schema migrated");
    Ok(())
}

async fn apply(conn: &Connection, migration: &Migration) -> Result<(), DatabaseError> {
    let failed = |e: libsql::Error| {
        DatabaseError::Migration(format!("V{} {}: {e}", migration.version, migration.name))
    };

    tracing::info!(version = migration.version, name = migration.name, "Applying migration");
    let tx = conn.transaction().await.map_err(failed)?;
    tx.execute_batch(migration.sql).await.map_err(failed)?;
    tx.execute(
        "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
        libsql::params![migration.version, migration.name],
    )
    .await
    .map_err(failed)?;
    tx.commit().await.map_err(failed)
}

/// Highest applied version, 0 on a fresh database.
async fn applied_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("reading schema version: {e}")))?;

    let Some(row) = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("reading schema version: {e}")))?
    else {
        return Ok(0);
    };
    row.get(0)
        .map_err(|e| DatabaseError::Migration(format!("reading schema version: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_conn() -> Connection {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap();
        db.connect().unwrap()
    }

    async fn table_exists(conn: &Connection, table: &str) -> bool {
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                libsql::params![table],
            )
            .await
            .unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        count == 1
    }

    #[tokio::test]
    async fn creates_report_tables() {
        let conn = memory_conn().await;
        run_migrations(&conn).await.unwrap();

        for table in ["incident_reports", "report_feedback", "_migrations"] {
            assert!(table_exists(&conn, table).await, "missing table {table}");
        }
    }

    #[tokio::test]
    async fn rerun_is_a_no_op() {
        let conn = memory_conn().await;
        run_migrations(&conn).await.unwrap();
        run_migrations(&conn).await.unwrap();

        assert_eq!(applied_version(&conn).await.unwrap(), 2);
        let mut rows = conn.query("SELECT COUNT(*) FROM _migrations", ()).await.unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn runs_on_a_spawned_task() {
        let conn = memory_conn().await;
        let migrated = tokio::spawn(async move { run_migrations(&conn).await });
        migrated.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn fresh_database_starts_at_zero() {
        let conn = memory_conn().await;
        conn.execute(
            "CREATE TABLE _migrations (version INTEGER PRIMARY KEY, name TEXT NOT NULL, applied_at TEXT)",
            (),
        )
        .await
        .unwrap();
        assert_eq!(applied_version(&conn).await.unwrap(), 0);
    }
}
