//! Input shape checks that run before any lookup.

use lettre::Address;

use crate::error::{NotificationError, ValidationError};
use crate::pipeline::PipelineContext;

/// Rejects malformed requests before any repository is touched.
#[derive(Debug, Clone, Default)]
pub struct ValidateInputFilter;

impl ValidateInputFilter {
    pub const NAME: &'static str = "ValidateInput";

    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, ctx: &PipelineContext) -> Result<(), NotificationError> {
        if ctx.rule_code().trim().is_empty() {
            return Err(ValidationError::MissingField { field: "ruleCode" }.into());
        }

        let email = ctx.client().email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingField {
                field: "client.email",
            }
            .into());
        }
        if email.parse::<Address>().is_err() {
            return Err(ValidationError::InvalidEmail {
                field: "client.email",
                value: email.to_string(),
            }
            .into());
        }

        if ctx.vars().is_none() {
            return Err(ValidationError::MissingField { field: "variables" }.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClientRef;
    use serde_json::Map;

    fn check(
        rule_code: &str,
        email: &str,
        vars: Option<Map<String, serde_json::Value>>,
    ) -> Result<(), NotificationError> {
        let ctx = PipelineContext::new(rule_code, ClientRef::new("c-1", email, "Ana"), vars);
        ValidateInputFilter::new().run(&ctx)
    }

    fn field_of(result: Result<(), NotificationError>) -> &'static str {
        match result {
            Err(NotificationError::Validation(e)) => e.field(),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn accepts_well_formed_input() {
        assert!(check("WELCOME", "ana@example.com", Some(Map::new())).is_ok());
    }

    #[test]
    fn empty_or_blank_rule_code() {
        assert_eq!(field_of(check("", "ana@example.com", Some(Map::new()))), "ruleCode");
        assert_eq!(field_of(check("   ", "ana@example.com", Some(Map::new()))), "ruleCode");
    }

    #[test]
    fn missing_email() {
        let result = check("WELCOME", " ", Some(Map::new()));
        assert!(matches!(
            result,
            Err(NotificationError::Validation(ValidationError::MissingField {
                field: "client.email"
            }))
        ));
    }

    #[test]
    fn invalid_email() {
        for bad in ["ana", "ana@", "@example.com", "ana example@x.com"] {
            let result = check("WELCOME", bad, Some(Map::new()));
            assert!(
                matches!(
                    result,
                    Err(NotificationError::Validation(ValidationError::InvalidEmail { .. }))
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn null_variables() {
        assert_eq!(field_of(check("WELCOME", "ana@example.com", None)), "variables");
    }

    #[test]
    fn rule_code_checked_first() {
        assert_eq!(field_of(check("", "bad", None)), "ruleCode");
    }
}
