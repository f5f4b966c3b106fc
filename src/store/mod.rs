//! Persistence layer for rules, templates and notification logs, backed by libSQL.

pub mod libsql_backend;
pub mod migrations;
pub mod seed;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use seed::SeedData;
pub use traits::{NotificationLogRepository, RuleRepository, TemplateRepository};
