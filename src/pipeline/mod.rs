//! Notification pipeline.
//!
//! Every request flows through an ordered chain of filters sharing one
//! `PipelineContext`:
//! 1. `ValidateInput`: request shape, no I/O
//! 2. `LoadRuleTemplate`: rule and template lookup
//! 3. `RenderTemplate`: placeholder substitution
//! 4. `SendEmail`: whitelist gate, then delivery
//! 5. `PersistLog`: audit record
//!
//! Preview runs the first three; send runs all five.

pub mod context;
pub mod executor;
pub mod filters;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::{PipelineContext, RenderedMessage, Resolution};
pub use executor::{Pipeline, PipelineBuilder};
pub use filters::{
    Filter, LoadRuleTemplateFilter, PersistLogFilter, RenderTemplateFilter, SendEmailFilter,
    ValidateInputFilter, render_text,
};
