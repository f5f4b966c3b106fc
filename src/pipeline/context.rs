//! Per-request state threaded through the filter chain.
//!
//! Fields are grouped by the stage that writes them. A group is `None`
//! until its stage has run; reading it earlier is a stage-ordering bug and
//! surfaces as `NotificationError::StageOrder`.

use serde_json::{Map, Value};

use crate::error::NotificationError;
use crate::model::{Channel, ClientRef, Rule, Template};

/// Caller input, fixed at construction.
#[derive(Debug, Clone)]
struct RequestInput {
    rule_code: String,
    client: ClientRef,
    /// `None` when the caller sent no (or null) variables.
    vars: Option<Map<String, Value>>,
}

/// Written by `LoadRuleTemplateFilter`.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub rule: Rule,
    pub template: Template,
    pub channel: Channel,
}

/// Written by `RenderTemplateFilter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
    pub to: String,
}

/// Mutable state for exactly one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    input: RequestInput,
    resolution: Option<Resolution>,
    rendered: Option<RenderedMessage>,
    delivered: bool,
    log_id: Option<String>,
}

impl PipelineContext {
    pub fn new(
        rule_code: impl Into<String>,
        client: ClientRef,
        vars: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            input: RequestInput {
                rule_code: rule_code.into(),
                client,
                vars,
            },
            resolution: None,
            rendered: None,
            delivered: false,
            log_id: None,
        }
    }

    // ── Input ───────────────────────────────────────────────────────

    pub fn rule_code(&self) -> &str {
        &self.input.rule_code
    }

    pub fn client(&self) -> &ClientRef {
        &self.input.client
    }

    pub fn vars(&self) -> Option<&Map<String, Value>> {
        self.input.vars.as_ref()
    }

    // ── Derived ─────────────────────────────────────────────────────

    /// Resolved rule, template and channel. Requires `LoadRuleTemplateFilter` upstream.
    pub fn resolution(&self, reader: &'static str) -> Result<&Resolution, NotificationError> {
        self.resolution
            .as_ref()
            .ok_or(NotificationError::StageOrder {
                stage: reader,
                field: "resolution",
            })
    }

    pub(crate) fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = Some(resolution);
    }

    /// Rendered subject, body and recipient. Requires `RenderTemplateFilter` upstream.
    pub fn rendered(&self, reader: &'static str) -> Result<&RenderedMessage, NotificationError> {
        self.rendered.as_ref().ok_or(NotificationError::StageOrder {
            stage: reader,
            field: "rendered",
        })
    }

    pub(crate) fn set_rendered(&mut self, rendered: RenderedMessage) {
        self.rendered = Some(rendered);
    }

    pub fn delivered(&self) -> bool {
        self.delivered
    }

    pub(crate) fn mark_delivered(&mut self) {
        self.delivered = true;
    }

    pub fn log_id(&self) -> Option<&str> {
        self.log_id.as_deref()
    }

    pub(crate) fn set_log_id(&mut self, id: String) {
        self.log_id = Some(id);
    }

    /// Channel fixed by the resolved rule, if resolution has run.
    pub fn channel(&self) -> Option<Channel> {
        self.resolution.as_ref().map(|r| r.channel)
    }
}
