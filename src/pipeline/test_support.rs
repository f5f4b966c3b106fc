//! In-memory collaborators for pipeline unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::channels::EmailSender;
use crate::error::{ChannelError, DatabaseError};
use crate::model::{Channel, ClientRef, NotificationLog, Rule, Template};
use crate::pipeline::PipelineContext;
use crate::store::{NotificationLogRepository, RuleRepository, TemplateRepository};

/// Rule/template/log store that counts lookups.
#[derive(Default)]
pub struct MemoryStore {
    pub rules: Mutex<HashMap<String, Rule>>,
    pub templates: Mutex<HashMap<String, Template>>,
    pub logs: Mutex<HashMap<String, NotificationLog>>,
    pub rule_lookups: AtomicUsize,
    pub template_lookups: AtomicUsize,
    pub fail_lookups: bool,
    pub fail_saves: bool,
}

impl MemoryStore {
    /// Store holding rule WELCOME → template "Hello {{name}}".
    pub fn welcome() -> Self {
        let store = Self::default();
        store.add_rule("WELCOME", "WELCOME");
        store.add_template("WELCOME", "Welcome {{name}}", "Hello {{name}}");
        store
    }

    pub fn add_rule(&self, code: &str, template_ref: &str) {
        self.rules.lock().unwrap().insert(
            code.into(),
            Rule {
                code: code.into(),
                template_ref: template_ref.into(),
                channel: Channel::Email,
            },
        );
    }

    pub fn add_template(&self, rule_ref: &str, subject: &str, body: &str) {
        self.templates.lock().unwrap().insert(
            rule_ref.into(),
            Template {
                rule_ref: rule_ref.into(),
                subject: subject.into(),
                body: body.into(),
            },
        );
    }

    pub fn lookups(&self) -> usize {
        self.rule_lookups.load(Ordering::SeqCst) + self.template_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuleRepository for MemoryStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Rule>, DatabaseError> {
        self.rule_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups {
            return Err(DatabaseError::Query("store offline".into()));
        }
        Ok(self.rules.lock().unwrap().get(code).cloned())
    }
}

#[async_trait]
impl TemplateRepository for MemoryStore {
    async fn find_by_rule_ref(&self, rule_ref: &str) -> Result<Option<Template>, DatabaseError> {
        self.template_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.templates.lock().unwrap().get(rule_ref).cloned())
    }
}

#[async_trait]
impl NotificationLogRepository for MemoryStore {
    async fn save(&self, record: NotificationLog) -> Result<NotificationLog, DatabaseError> {
        if self.fail_saves {
            return Err(DatabaseError::Query("disk full".into()));
        }
        self.logs
            .lock()
            .unwrap()
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<NotificationLog>, DatabaseError> {
        Ok(self.logs.lock().unwrap().get(id).cloned())
    }
}

/// One message handed to the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub channel: Channel,
}

/// Sender that records instead of delivering.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<SentEmail>>,
    pub fail: bool,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        channel: Channel,
    ) -> Result<(), ChannelError> {
        if self.fail {
            return Err(ChannelError::SendFailed {
                name: "email".into(),
                reason: "connection refused".into(),
            });
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            channel,
        });
        Ok(())
    }
}

pub fn vars(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Context for client Ana with `name = "Ana"`.
pub fn ana_context(rule_code: &str) -> PipelineContext {
    PipelineContext::new(
        rule_code,
        ClientRef::new("c-1", "ana@example.com", "Ana"),
        Some(vars(&[("name", Value::String("Ana".into()))])),
    )
}
