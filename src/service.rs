//! Notification orchestration: preview, send and log lookup.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::channels::{EmailSender, WhitelistChecker};
use crate::error::NotificationError;
use crate::model::{Channel, ClientRef, LogStatus};
use crate::pipeline::{
    LoadRuleTemplateFilter, PersistLogFilter, Pipeline, PipelineContext, RenderTemplateFilter,
    SendEmailFilter, ValidateInputFilter,
};
use crate::store::{NotificationLogRepository, RuleRepository, TemplateRepository};

// ── Request / response shapes ───────────────────────────────────────

/// Client block of a notification request. Missing fields default to
/// empty so the validate stage can name them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientDto {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<ClientDto> for ClientRef {
    fn from(dto: ClientDto) -> Self {
        ClientRef::new(dto.id, dto.email, dto.name)
    }
}

/// Body of `preview` and `send`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationRequest {
    pub rule_code: String,
    pub client: ClientDto,
    pub variables: Option<Map<String, Value>>,
}

impl NotificationRequest {
    pub fn new(
        rule_code: impl Into<String>,
        client: ClientRef,
        variables: Map<String, Value>,
    ) -> Self {
        Self {
            rule_code: rule_code.into(),
            client: ClientDto {
                id: client.id,
                name: client.name,
                email: client.email,
            },
            variables: Some(variables),
        }
    }

    fn into_context(self) -> PipelineContext {
        PipelineContext::new(self.rule_code, self.client.into(), self.variables)
    }
}

/// What the recipient would receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub subject: String,
    pub body: String,
    pub channel: Channel,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub log_id: String,
    pub status: LogStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogView {
    pub id: String,
    pub status: LogStatus,
    pub to: String,
    pub channel: Channel,
    pub created_at: DateTime<Utc>,
}

// ── Service ─────────────────────────────────────────────────────────

/// Entry point for callers. Holds the two pipelines, built once.
#[derive(Clone)]
pub struct NotificationService {
    preview: Arc<Pipeline>,
    send: Arc<Pipeline>,
    logs: Arc<dyn NotificationLogRepository>,
}

impl NotificationService {
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        templates: Arc<dyn TemplateRepository>,
        sender: Arc<dyn EmailSender>,
        whitelist: Arc<dyn WhitelistChecker>,
        logs: Arc<dyn NotificationLogRepository>,
    ) -> Self {
        let load = LoadRuleTemplateFilter::new(rules, templates);

        let preview = Pipeline::builder("preview")
            .add(ValidateInputFilter::new())
            .add(load.clone())
            .add(RenderTemplateFilter::new())
            .build();

        let send = Pipeline::builder("send")
            .add(ValidateInputFilter::new())
            .add(load)
            .add(RenderTemplateFilter::new())
            .add(SendEmailFilter::new(sender, whitelist))
            .add(PersistLogFilter::new(logs.clone()))
            .build();

        Self {
            preview: Arc::new(preview),
            send: Arc::new(send),
            logs,
        }
    }

    pub fn preview_pipeline(&self) -> &Pipeline {
        &self.preview
    }

    pub fn send_pipeline(&self) -> &Pipeline {
        &self.send
    }

    /// Render without sending. No side effects beyond reads.
    pub async fn preview(
        &self,
        request: NotificationRequest,
    ) -> Result<PreviewResponse, NotificationError> {
        let ctx = self.preview.execute(request.into_context()).await?;
        let channel = ctx.resolution("preview")?.channel;
        let rendered = ctx.rendered("preview")?.clone();
        Ok(PreviewResponse {
            subject: rendered.subject,
            body: rendered.body,
            channel,
            to: rendered.to,
        })
    }

    /// Render, send and log.
    pub async fn send(
        &self,
        request: NotificationRequest,
    ) -> Result<SendResponse, NotificationError> {
        let ctx = self.send.execute(request.into_context()).await?;
        let log_id = ctx
            .log_id()
            .ok_or(NotificationError::StageOrder {
                stage: "send",
                field: "log_id",
            })?
            .to_string();
        info!(log_id = %log_id, rule_code = %ctx.rule_code(), "Notification sent");
        Ok(SendResponse {
            log_id,
            status: LogStatus::Ok,
        })
    }

    /// Look up one audit record. `Ok(None)` when the id is unknown.
    pub async fn find_log(&self, id: &str) -> Result<Option<LogView>, NotificationError> {
        let log = self.logs.find_by_id(id).await?;
        Ok(log.map(|l| LogView {
            id: l.id,
            status: l.status,
            to: l.to,
            channel: l.channel,
            created_at: l.created_at,
        }))
    }
}
