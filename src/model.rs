//! Domain records shared by the pipeline, the stores and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller-supplied recipient reference. Never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRef {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl ClientRef {
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
        }
    }
}

/// Delivery channel. Email is the only channel this service dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    Email,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EMAIL" => Ok(Self::Email),
            other => Err(format!("unknown channel: {other}")),
        }
    }
}

/// A rule selects which template and channel apply to a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub code: String,
    pub template_ref: String,
    pub channel: Channel,
}

/// A placeholder-bearing subject/body pair, keyed by the rule reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub rule_ref: String,
    pub subject: String,
    pub body: String,
}

/// Outcome recorded for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogStatus {
    #[serde(rename = "OK")]
    Ok,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
        }
    }
}

impl std::str::FromStr for LogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(Self::Ok),
            other => Err(format!("unknown log status: {other}")),
        }
    }
}

/// Audit record written after a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationLog {
    pub id: String,
    pub status: LogStatus,
    pub to: String,
    pub channel: Channel,
    pub created_at: DateTime<Utc>,
}
