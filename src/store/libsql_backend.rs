//! libSQL backend: async repository implementations.
//!
//! Supports local file and in-memory databases. One connection is opened
//! at startup and reused for every operation.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::model::{Channel, LogStatus, NotificationLog, Rule, Template};
use crate::store::migrations;
use crate::store::traits::{NotificationLogRepository, RuleRepository, TemplateRepository};

/// libSQL database backend.
///
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

        let backend = Self::from_database(db)?;
        migrations::run_migrations(backend.conn()).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests and dry runs).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        migrations::run_migrations(backend.conn()).await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Insert or replace a rule, keyed by code.
    pub async fn save_rule(&self, rule: &Rule) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO rules (code, template_ref, channel) VALUES (?1, ?2, ?3)
                 ON CONFLICT(code) DO UPDATE SET
                    template_ref = excluded.template_ref,
                    channel = excluded.channel,
                    updated_at = datetime('now')",
                params![
                    rule.code.as_str(),
                    rule.template_ref.as_str(),
                    rule.channel.as_str()
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_rule: {e}")))?;

        debug!(code = %rule.code, "Rule saved");
        Ok(())
    }

    /// Insert or replace a template, keyed by rule reference.
    pub async fn save_template(&self, template: &Template) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO templates (rule_ref, subject, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT(rule_ref) DO UPDATE SET
                    subject = excluded.subject,
                    body = excluded.body,
                    updated_at = datetime('now')",
                params![
                    template.rule_ref.as_str(),
                    template.subject.as_str(),
                    template.body.as_str()
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_template: {e}")))?;

        debug!(rule_ref = %template.rule_ref, "Template saved");
        Ok(())
    }
}

// ── Row mapping ─────────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| DatabaseError::Serialization(format!("bad timestamp '{s}': {e}")))
}

fn parse_channel(s: &str) -> Result<Channel, DatabaseError> {
    s.parse().map_err(DatabaseError::Serialization)
}

fn row_err(context: &str) -> impl Fn(libsql::Error) -> DatabaseError + '_ {
    move |e| DatabaseError::Query(format!("{context}: {e}"))
}

/// Column order: 0:code, 1:template_ref, 2:channel
fn row_to_rule(row: &libsql::Row) -> Result<Rule, DatabaseError> {
    let channel: String = row.get(2).map_err(row_err("rule row"))?;
    Ok(Rule {
        code: row.get(0).map_err(row_err("rule row"))?,
        template_ref: row.get(1).map_err(row_err("rule row"))?,
        channel: parse_channel(&channel)?,
    })
}

/// Column order: 0:rule_ref, 1:subject, 2:body
fn row_to_template(row: &libsql::Row) -> Result<Template, DatabaseError> {
    Ok(Template {
        rule_ref: row.get(0).map_err(row_err("template row"))?,
        subject: row.get(1).map_err(row_err("template row"))?,
        body: row.get(2).map_err(row_err("template row"))?,
    })
}

/// Column order: 0:id, 1:status, 2:recipient, 3:channel, 4:created_at
fn row_to_log(row: &libsql::Row) -> Result<NotificationLog, DatabaseError> {
    let status: String = row.get(1).map_err(row_err("log row"))?;
    let channel: String = row.get(3).map_err(row_err("log row"))?;
    let created_at: String = row.get(4).map_err(row_err("log row"))?;
    Ok(NotificationLog {
        id: row.get(0).map_err(row_err("log row"))?,
        status: status.parse().map_err(DatabaseError::Serialization)?,
        to: row.get(2).map_err(row_err("log row"))?,
        channel: parse_channel(&channel)?,
        created_at: parse_datetime(&created_at)?,
    })
}

// ── Trait implementations ───────────────────────────────────────────

#[async_trait]
impl RuleRepository for LibSqlBackend {
    async fn find_by_code(&self, code: &str) -> Result<Option<Rule>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT code, template_ref, channel FROM rules WHERE code = ?1",
                params![code],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("find_by_code: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_rule(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("find_by_code: {e}"))),
        }
    }
}

#[async_trait]
impl TemplateRepository for LibSqlBackend {
    async fn find_by_rule_ref(&self, rule_ref: &str) -> Result<Option<Template>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT rule_ref, subject, body FROM templates WHERE rule_ref = ?1",
                params![rule_ref],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("find_by_rule_ref: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_template(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("find_by_rule_ref: {e}"))),
        }
    }
}

#[async_trait]
impl NotificationLogRepository for LibSqlBackend {
    async fn save(&self, record: NotificationLog) -> Result<NotificationLog, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO notification_logs (id, status, recipient, channel, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id.as_str(),
                    record.status.as_str(),
                    record.to.as_str(),
                    record.channel.as_str(),
                    record.created_at.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_log: {e}")))?;

        debug!(id = %record.id, to = %record.to, "Notification log inserted");
        Ok(record)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<NotificationLog>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, status, recipient, channel, created_at
                 FROM notification_logs WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("find_log: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_log(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("find_log: {e}"))),
        }
    }
}
