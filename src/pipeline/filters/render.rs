//! Placeholder substitution for subject and body.
//!
//! Placeholders look like `{{name}}` or `{{ name }}`; the name is whatever
//! sits between the braces, trimmed, so `{{año}}` and `{{first name}}`
//! are placeholders too. Substitution is a single pass: text inserted from
//! a variable is never scanned again, so a value containing `{{x}}` is
//! emitted literally.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::error::{NotificationError, RenderError};
use crate::pipeline::PipelineContext;
use crate::pipeline::context::RenderedMessage;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("valid regex"));

/// Renders the resolved template against the request variables.
#[derive(Debug, Clone, Default)]
pub struct RenderTemplateFilter;

impl RenderTemplateFilter {
    pub const NAME: &'static str = "RenderTemplate";

    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, ctx: &mut PipelineContext) -> Result<(), NotificationError> {
        let template = &ctx.resolution(Self::NAME)?.template;
        let empty = Map::new();
        let vars = ctx.vars().unwrap_or(&empty);

        let subject = render_text(&template.subject, vars)?;
        let body = render_text(&template.body, vars)?;
        let to = ctx.client().email.trim().to_string();

        ctx.set_rendered(RenderedMessage { subject, body, to });
        Ok(())
    }
}

/// Substitute every placeholder in `text`.
///
/// Fails on the first placeholder (in document order) whose name is absent
/// from `vars` or bound to `null`.
pub fn render_text(text: &str, vars: &Map<String, Value>) -> Result<String, RenderError> {
    if let Some(name) = first_missing(text, vars) {
        return Err(RenderError::MissingVariable { name });
    }

    let rendered = PLACEHOLDER.replace_all(text, |caps: &Captures| {
        vars.get(&caps[1]).map(value_text).unwrap_or_default()
    });
    Ok(rendered.into_owned())
}

fn first_missing(text: &str, vars: &Map<String, Value>) -> Option<String> {
    PLACEHOLDER
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .find(|name| matches!(vars.get(name), None | Some(Value::Null)))
}

/// Strings verbatim; everything else as compact JSON text.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
