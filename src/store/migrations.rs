//! Version-tracked database migrations for the libSQL backend.
//!
//! Each migration has a version number and SQL. `run_migrations()` checks
//! the current version and applies only the new ones sequentially.

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
        name: "rules_and_templates",
        sql: r#"
            CREATE TABLE IF NOT EXISTS rules (
                code TEXT PRIMARY KEY,
                template_ref TEXT NOT NULL,
                channel TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS templates (
                rule_ref TEXT PRIMARY KEY,
                subject TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
        "#,
    },
    Migration {
        version: 2,
        name: "notification_logs",
        sql: r#"
            CREATE TABLE IF NOT EXISTS notification_logs (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                recipient TEXT NOT NULL,
                channel TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_notification_logs_created
                ON notification_logs(created_at);
        "#,
    },
];

/// Bring the schema up to the latest version.
///
/// Applied versions are recorded in `_migrations`; only newer ones run,
/// each as one batch followed by its version record.
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
    .map_err(|e| DatabaseError::Migration(format!("_migrations table: {e}")))?;

    let applied = schema_version(conn).await?;
    let pending = MIGRATIONS.iter().filter(|m| m.version > applied);

    for migration in pending {
        tracing::info!(
            version = migration.version,
            name = migration.name,
            "Applying schema migration"
        );
        conn.execute_batch(migration.sql)
            .await
            .map_err(|e| {
                DatabaseError::Migration(format!("V{} {}: {e}", migration.version, migration.name))
            })?;
        conn.execute(
            "INSERT OR IGNORE INTO _migrations (version, name) VALUES (?1, ?2)",
            libsql::params![migration.version, migration.name],
        )
        .await
        .map_err(|e| DatabaseError::Migration(format!("record V{}: {e}", migration.version)))?;
    }

    tracing::debug!(version = schema_version(conn).await?, "Notification schema ready");
    Ok(())
}

/// Highest applied version, 0 on a fresh database.
async fn schema_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("schema version: {e}")))?;

    match rows.next().await {
        Ok(Some(row)) => row
            .get(0)
            .map_err(|e| DatabaseError::Migration(format!("schema version: {e}"))),
        Ok(None) => Ok(0),
        Err(e) => Err(DatabaseError::Migration(format!("schema version: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn migrated() -> Connection {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap();
        let conn = db.connect().unwrap();
        run_migrations(&conn).await.unwrap();
        conn
    }

    const INSERT_WELCOME_RULE: &str =
        "INSERT INTO rules (code, template_ref, channel) VALUES ('WELCOME', 'WELCOME', 'EMAIL')";

    async fn count(conn: &Connection, sql: &str) -> i64 {
        let mut rows = conn.query(sql, ()).await.unwrap();
        rows.next().await.unwrap().unwrap().get(0).unwrap()
    }

    #[tokio::test]
    async fn fresh_database_reaches_latest_version() {
        let conn = migrated().await;
        let latest = MIGRATIONS.last().map(|m| m.version).unwrap();
        assert_eq!(schema_version(&conn).await.unwrap(), latest);
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM _migrations").await,
            MIGRATIONS.len() as i64
        );
    }

    #[tokio::test]
    async fn rerun_applies_nothing_new() {
        let conn = migrated().await;
        conn.execute(INSERT_WELCOME_RULE, ()).await.unwrap();

        run_migrations(&conn).await.unwrap();

        assert_eq!(count(&conn, "SELECT COUNT(*) FROM rules").await, 1);
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM _migrations").await,
            MIGRATIONS.len() as i64
        );
    }

    #[tokio::test]
    async fn rule_codes_and_template_refs_are_unique() {
        let conn = migrated().await;
        conn.execute(INSERT_WELCOME_RULE, ()).await.unwrap();
        assert!(conn.execute(INSERT_WELCOME_RULE, ()).await.is_err());

        let insert_template =
            "INSERT INTO templates (rule_ref, subject, body) VALUES ('WELCOME', 's', 'b')";
        conn.execute(insert_template, ()).await.unwrap();
        assert!(conn.execute(insert_template, ()).await.is_err());
    }

    #[tokio::test]
    async fn notification_logs_require_recipient_and_timestamp() {
        let conn = migrated().await;
        assert!(
            conn.execute(
                "INSERT INTO notification_logs (id, status, channel) VALUES ('l-1', 'OK', 'EMAIL')",
                (),
            )
            .await
            .is_err()
        );
        assert_eq!(
            count(
                &conn,
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'index' AND name = 'idx_notification_logs_created'"
            )
            .await,
            1
        );
    }
}
