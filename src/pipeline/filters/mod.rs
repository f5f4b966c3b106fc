//! The five notification stages and the closed `Filter` set.

mod load;
mod persist;
mod render;
mod send;
mod validate;

pub use load::LoadRuleTemplateFilter;
pub use persist::PersistLogFilter;
pub use render::{RenderTemplateFilter, render_text};
pub use send::SendEmailFilter;
pub use validate::ValidateInputFilter;

use crate::error::NotificationError;
use crate::pipeline::PipelineContext;

/// One pipeline stage.
///
/// The set is closed: a pipeline is assembled from these and nothing else.
#[derive(Clone)]
pub enum Filter {
    ValidateInput(ValidateInputFilter),
    LoadRuleTemplate(LoadRuleTemplateFilter),
    RenderTemplate(RenderTemplateFilter),
    SendEmail(SendEmailFilter),
    PersistLog(PersistLogFilter),
}

impl Filter {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ValidateInput(_) => ValidateInputFilter::NAME,
            Self::LoadRuleTemplate(_) => LoadRuleTemplateFilter::NAME,
            Self::RenderTemplate(_) => RenderTemplateFilter::NAME,
            Self::SendEmail(_) => SendEmailFilter::NAME,
            Self::PersistLog(_) => PersistLogFilter::NAME,
        }
    }

    /// Run this stage against `ctx`. On error the context is left as the
    /// stage found it, except for groups an earlier step already wrote.
    pub async fn apply(&self, ctx: &mut PipelineContext) -> Result<(), NotificationError> {
        match self {
            Self::ValidateInput(f) => f.run(ctx),
            Self::LoadRuleTemplate(f) => f.run(ctx).await,
            Self::RenderTemplate(f) => f.run(ctx),
            Self::SendEmail(f) => f.run(ctx).await,
            Self::PersistLog(f) => f.run(ctx).await,
        }
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ValidateInputFilter> for Filter {
    fn from(f: ValidateInputFilter) -> Self {
        Self::ValidateInput(f)
    }
}

impl From<LoadRuleTemplateFilter> for Filter {
    fn from(f: LoadRuleTemplateFilter) -> Self {
        Self::LoadRuleTemplate(f)
    }
}

impl From<RenderTemplateFilter> for Filter {
    fn from(f: RenderTemplateFilter) -> Self {
        Self::RenderTemplate(f)
    }
}

impl From<SendEmailFilter> for Filter {
    fn from(f: SendEmailFilter) -> Self {
        Self::SendEmail(f)
    }
}

impl From<PersistLogFilter> for Filter {
    fn from(f: PersistLogFilter) -> Self {
        Self::PersistLog(f)
    }
}
