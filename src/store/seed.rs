//! Startup provisioning of rules and templates from a JSON file.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{ConfigError, DatabaseError, Error};
use crate::model::{Rule, Template};
use crate::store::LibSqlBackend;

/// Rules and templates to upsert at startup.
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub templates: Vec<Template>,
}

impl SeedData {
    /// Parse seed data from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::ParseError(format!("seed file: {e}")))
    }

    /// Read and parse a seed file.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(ConfigError::Io)?;
        Ok(Self::from_json(&raw)?)
    }

    /// Upsert every rule and template. Returns (rules, templates) written.
    pub async fn apply(&self, db: &LibSqlBackend) -> Result<(usize, usize), DatabaseError> {
        for rule in &self.rules {
            db.save_rule(rule).await?;
        }
        for template in &self.templates {
            db.save_template(template).await?;
        }
        info!(
            rules = self.rules.len(),
            templates = self.templates.len(),
            "Seed data applied"
        );
        Ok((self.rules.len(), self.templates.len()))
    }
}
