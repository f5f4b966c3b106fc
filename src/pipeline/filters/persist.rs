//! Audit record for a delivered notification.

use std::sync::Arc;

use chrono::Utc;
use tracing::error;

use crate::error::NotificationError;
use crate::model::{LogStatus, NotificationLog};
use crate::pipeline::PipelineContext;
use crate::store::NotificationLogRepository;

/// Writes one `OK` log record after a successful send.
///
/// A failure here means the message already left; the error is reported as
/// `Persistence` and the send is not undone.
#[derive(Clone)]
pub struct PersistLogFilter {
    logs: Arc<dyn NotificationLogRepository>,
}

impl PersistLogFilter {
    pub const NAME: &'static str = "PersistLog";

    pub fn new(logs: Arc<dyn NotificationLogRepository>) -> Self {
        Self { logs }
    }

    pub async fn run(&self, ctx: &mut PipelineContext) -> Result<(), NotificationError> {
        if !ctx.delivered() {
            return Err(NotificationError::StageOrder {
                stage: Self::NAME,
                field: "delivered",
            });
        }
        let channel = ctx.resolution(Self::NAME)?.channel;
        let to = ctx.rendered(Self::NAME)?.to.clone();

        let record = NotificationLog {
            id: uuid::Uuid::new_v4().to_string(),
            status: LogStatus::Ok,
            to,
            channel,
            created_at: Utc::now(),
        };

        let saved = self.logs.save(record).await.map_err(|source| {
            error!(error = %source, "Notification delivered but log write failed");
            NotificationError::Persistence { source }
        })?;

        ctx.set_log_id(saved.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::WhitelistConfig;
    use crate::model::Channel;
    use crate::pipeline::filters::{LoadRuleTemplateFilter, RenderTemplateFilter, SendEmailFilter};
    use crate::pipeline::test_support::{MemoryStore, RecordingSender, ana_context};

    async fn delivered_context(store: &Arc<MemoryStore>) -> PipelineContext {
        let mut ctx = ana_context("WELCOME");
        LoadRuleTemplateFilter::new(store.clone(), store.clone())
            .run(&mut ctx)
            .await
            .unwrap();
        RenderTemplateFilter::new().run(&mut ctx).unwrap();
        SendEmailFilter::new(
            Arc::new(RecordingSender::default()),
            Arc::new(WhitelistConfig::disabled()),
        )
        .run(&mut ctx)
        .await
        .unwrap();
        ctx
    }

    #[tokio::test]
    async fn writes_ok_record_and_sets_log_id() {
        let store = Arc::new(MemoryStore::welcome());
        let mut ctx = delivered_context(&store).await;

        PersistLogFilter::new(store.clone()).run(&mut ctx).await.unwrap();

        let id = ctx.log_id().unwrap().to_string();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        let saved = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(saved.status, LogStatus::Ok);
        assert_eq!(saved.to, "ana@example.com");
        assert_eq!(saved.channel, Channel::Email);
    }

    #[tokio::test]
    async fn save_failure_is_persistence_error() {
        let store = Arc::new(MemoryStore {
            fail_saves: true,
            ..MemoryStore::welcome()
        });
        let mut ctx = delivered_context(&store).await;

        let err = PersistLogFilter::new(store.clone()).run(&mut ctx).await.unwrap_err();
        assert!(matches!(err, NotificationError::Persistence { .. }));
        assert!(ctx.log_id().is_none());
        assert!(ctx.delivered());
    }

    #[tokio::test]
    async fn refuses_to_log_undelivered_message() {
        let store = Arc::new(MemoryStore::welcome());
        let mut ctx = ana_context("WELCOME");

        let err = PersistLogFilter::new(store.clone()).run(&mut ctx).await.unwrap_err();
        assert!(matches!(
            err,
            NotificationError::StageOrder { stage: "PersistLog", field: "delivered" }
        ));
        assert!(store.logs.lock().unwrap().is_empty());
    }
}
