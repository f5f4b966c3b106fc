//! Ordered, fail-fast execution of a filter chain.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::NotificationError;
use crate::pipeline::PipelineContext;
use crate::pipeline::filters::Filter;

/// An ordered list of filters run strictly in sequence.
///
/// The first failing filter ends the run; its error is returned unchanged
/// and later filters never see the context. Completed stages are not
/// rolled back.
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    filters: Vec<Filter>,
}

impl Pipeline {
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder {
            name: name.into(),
            filters: Vec::new(),
        }
    }

    /// Build from an already ordered list.
    pub fn new(name: impl Into<String>, filters: impl IntoIterator<Item = Filter>) -> Self {
        Self {
            name: name.into(),
            filters: filters.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.filters.iter().map(Filter::name).collect()
    }

    pub async fn execute(
        &self,
        mut ctx: PipelineContext,
    ) -> Result<PipelineContext, NotificationError> {
        let started = Instant::now();
        debug!(
            pipeline = %self.name,
            rule_code = %ctx.rule_code(),
            stages = self.filters.len(),
            "Pipeline started"
        );

        for filter in &self.filters {
            let stage_started = Instant::now();
            if let Err(e) = filter.apply(&mut ctx).await {
                warn!(
                    pipeline = %self.name,
                    stage = filter.name(),
                    code = e.code(),
                    error = %e,
                    "Pipeline halted"
                );
                return Err(e);
            }
            debug!(
                pipeline = %self.name,
                stage = filter.name(),
                elapsed_ms = stage_started.elapsed().as_millis() as u64,
                "Stage completed"
            );
        }

        info!(
            pipeline = %self.name,
            rule_code = %ctx.rule_code(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pipeline completed"
        );
        Ok(ctx)
    }
}

/// Collects filters in the order they will run.
pub struct PipelineBuilder {
    name: String,
    filters: Vec<Filter>,
}

impl PipelineBuilder {
    pub fn add(mut self, filter: impl Into<Filter>) -> Self {
        self.filters.push(filter.into());
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            name: self.name,
            filters: self.filters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::WhitelistConfig;
    use crate::pipeline::filters::{
        LoadRuleTemplateFilter, PersistLogFilter, RenderTemplateFilter, SendEmailFilter,
        ValidateInputFilter,
    };
    use crate::pipeline::test_support::{MemoryStore, RecordingSender, ana_context};
    use std::sync::Arc;

    fn full(store: &Arc<MemoryStore>, sender: &Arc<RecordingSender>) -> Pipeline {
        Pipeline::builder("send")
            .add(ValidateInputFilter::new())
            .add(LoadRuleTemplateFilter::new(store.clone(), store.clone()))
            .add(RenderTemplateFilter::new())
            .add(SendEmailFilter::new(
                sender.clone(),
                Arc::new(WhitelistConfig::disabled()),
            ))
            .add(PersistLogFilter::new(store.clone()))
            .build()
    }

    #[test]
    fn builder_keeps_insertion_order() {
        let store = Arc::new(MemoryStore::default());
        let sender = Arc::new(RecordingSender::default());
        let pipeline = full(&store, &sender);
        assert_eq!(pipeline.name(), "send");
        assert_eq!(
            pipeline.stage_names(),
            vec![
                "ValidateInput",
                "LoadRuleTemplate",
                "RenderTemplate",
                "SendEmail",
                "PersistLog"
            ]
        );
    }

    #[tokio::test]
    async fn runs_every_stage() {
        let store = Arc::new(MemoryStore::welcome());
        let sender = Arc::new(RecordingSender::default());

        let ctx = full(&store, &sender)
            .execute(ana_context("WELCOME"))
            .await
            .unwrap();

        assert!(ctx.delivered());
        assert!(ctx.log_id().is_some());
        assert_eq!(sender.sent().len(), 1);
        assert_eq!(store.logs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn halts_at_first_failure() {
        let store = Arc::new(MemoryStore::welcome());
        let sender = Arc::new(RecordingSender::default());

        let err = full(&store, &sender)
            .execute(ana_context("UNKNOWN"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "RULE_NOT_FOUND");
        assert!(sender.sent().is_empty());
        assert!(store.logs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn later_failure_does_not_undo_send() {
        let store = Arc::new(MemoryStore {
            fail_saves: true,
            ..MemoryStore::welcome()
        });
        let sender = Arc::new(RecordingSender::default());

        let err = full(&store, &sender)
            .execute(ana_context("WELCOME"))
            .await
            .unwrap_err();

        assert!(matches!(err, NotificationError::Persistence { .. }));
        assert_eq!(sender.sent().len(), 1);
    }

    #[test]
    fn new_from_list_matches_builder() {
        let pipeline = Pipeline::new(
            "preview",
            [
                Filter::from(ValidateInputFilter::new()),
                Filter::from(RenderTemplateFilter::new()),
            ],
        );
        assert_eq!(pipeline.stage_names(), vec!["ValidateInput", "RenderTemplate"]);
    }

    #[tokio::test]
    async fn empty_pipeline_returns_context_untouched() {
        let ctx = Pipeline::builder("noop")
            .build()
            .execute(ana_context("WELCOME"))
            .await
            .unwrap();
        assert_eq!(ctx.rule_code(), "WELCOME");
        assert!(ctx.channel().is_none());
    }
}
