//! Repository traits consumed by the pipeline.
//!
//! Each trait is backend-agnostic; `LibSqlBackend` implements all three.
//! Implementations must be safe for concurrent use from many requests.

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::model::{NotificationLog, Rule, Template};

/// Read access to rules, keyed by exact code.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Look up a rule by its code. `Ok(None)` when no rule matches.
    async fn find_by_code(&self, code: &str) -> Result<Option<Rule>, DatabaseError>;
}

/// Read access to templates, keyed by the rule reference.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Look up the template a rule points at.
    async fn find_by_rule_ref(&self, rule_ref: &str) -> Result<Option<Template>, DatabaseError>;
}

/// Durable audit log of sent notifications.
#[async_trait]
pub trait NotificationLogRepository: Send + Sync {
    /// Persist a log record and return it as stored.
    async fn save(&self, record: NotificationLog) -> Result<NotificationLog, DatabaseError>;

    /// Fetch a log record by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<NotificationLog>, DatabaseError>;
}
