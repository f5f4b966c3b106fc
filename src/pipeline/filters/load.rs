//! Rule and template resolution.

use std::sync::Arc;

use tracing::debug;

use crate::error::{NotFoundKind, NotificationError};
use crate::pipeline::PipelineContext;
use crate::pipeline::context::Resolution;
use crate::store::{RuleRepository, TemplateRepository};

/// Resolves the rule for `rule_code`, then the template the rule points at.
///
/// Both lookups are read-only. Repository failures are surfaced as-is
/// (`NotificationError::Repository`); nothing is retried here.
#[derive(Clone)]
pub struct LoadRuleTemplateFilter {
    rules: Arc<dyn RuleRepository>,
    templates: Arc<dyn TemplateRepository>,
}

impl LoadRuleTemplateFilter {
    pub const NAME: &'static str = "LoadRuleTemplate";

    pub fn new(rules: Arc<dyn RuleRepository>, templates: Arc<dyn TemplateRepository>) -> Self {
        Self { rules, templates }
    }

    pub async fn run(&self, ctx: &mut PipelineContext) -> Result<(), NotificationError> {
        let code = ctx.rule_code();
        let rule = self
            .rules
            .find_by_code(code)
            .await?
            .ok_or_else(|| NotificationError::NotFound(NotFoundKind::Rule { code: code.into() }))?;

        let template = self
            .templates
            .find_by_rule_ref(&rule.template_ref)
            .await?
            .ok_or_else(|| {
                NotificationError::NotFound(NotFoundKind::Template {
                    rule_ref: rule.template_ref.clone(),
                })
            })?;

        debug!(
            rule_code = %rule.code,
            template_ref = %rule.template_ref,
            channel = %rule.channel,
            "Rule and template resolved"
        );

        ctx.set_resolution(Resolution {
            channel: rule.channel,
            rule,
            template,
        });
        Ok(())
    }
}
