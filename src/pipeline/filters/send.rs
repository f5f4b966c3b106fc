//! Whitelist gate plus delivery.

use std::sync::Arc;

use tracing::{info, warn};

use crate::channels::{EmailSender, WhitelistChecker};
use crate::error::{ForbiddenKind, NotificationError};
use crate::pipeline::PipelineContext;

/// Checks the recipient against the whitelist, then hands the rendered
/// message to the sender. A refused recipient never reaches the sender.
#[derive(Clone)]
pub struct SendEmailFilter {
    sender: Arc<dyn EmailSender>,
    whitelist: Arc<dyn WhitelistChecker>,
}

impl SendEmailFilter {
    pub const NAME: &'static str = "SendEmail";

    pub fn new(sender: Arc<dyn EmailSender>, whitelist: Arc<dyn WhitelistChecker>) -> Self {
        Self { sender, whitelist }
    }

    pub async fn run(&self, ctx: &mut PipelineContext) -> Result<(), NotificationError> {
        let channel = ctx.resolution(Self::NAME)?.channel;
        let message = ctx.rendered(Self::NAME)?;

        if !self.whitelist.is_allowed(&message.to) {
            warn!(to = %message.to, "Recipient not whitelisted, not sending");
            return Err(NotificationError::Forbidden(
                ForbiddenKind::RecipientNotWhitelisted {
                    recipient: message.to.clone(),
                },
            ));
        }

        self.sender
            .send(&message.to, &message.subject, &message.body, channel)
            .await
            .map_err(|e| NotificationError::Delivery {
                reason: e.to_string(),
            })?;

        info!(to = %message.to, channel = %channel, "Notification delivered");
        ctx.mark_delivered();
        Ok(())
    }
}
