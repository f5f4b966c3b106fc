//! Error types for the notification orchestrator.

/// Top-level error type for wiring and startup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
}

/// Input shape problems caught before any lookup happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid email address in {field}: {value}")]
    InvalidEmail { field: &'static str, value: String },
}

impl ValidationError {
    /// Name of the offending request field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field } | Self::InvalidEmail { field, .. } => field,
        }
    }
}

/// Which lookup came back empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundKind {
    Rule { code: String },
    Template { rule_ref: String },
}

impl std::fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rule { code } => write!(f, "rule '{code}'"),
            Self::Template { rule_ref } => write!(f, "template for rule '{rule_ref}'"),
        }
    }
}

/// Template/variable mismatch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("Template variable '{name}' has no value")]
    MissingVariable { name: String },
}

/// Why a recipient was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForbiddenKind {
    RecipientNotWhitelisted { recipient: String },
}

impl std::fmt::Display for ForbiddenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RecipientNotWhitelisted { recipient } => {
                write!(f, "recipient {recipient} is not whitelisted")
            }
        }
    }
}

/// Errors that terminate a pipeline run.
///
/// Every variant is terminal; nothing here is retried by the pipeline.
/// `Delivery` means the message was not sent, `Persistence` means it was
/// sent but the audit record is missing.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(NotFoundKind),

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("Forbidden: {0}")]
    Forbidden(ForbiddenKind),

    #[error("Delivery failed: {reason}")]
    Delivery { reason: String },

    #[error("Notification sent but log not persisted: {source}")]
    Persistence { source: DatabaseError },

    #[error("Repository lookup failed: {0}")]
    Repository(#[from] DatabaseError),

    #[error("Stage {stage} read '{field}' before it was written")]
    StageOrder {
        stage: &'static str,
        field: &'static str,
    },
}

impl NotificationError {
    /// Stable machine-readable code for logs and API bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::MissingField { .. }) => "MISSING_FIELD",
            Self::Validation(ValidationError::InvalidEmail { .. }) => "INVALID_EMAIL",
            Self::NotFound(NotFoundKind::Rule { .. }) => "RULE_NOT_FOUND",
            Self::NotFound(NotFoundKind::Template { .. }) => "TEMPLATE_NOT_FOUND",
            Self::Render(RenderError::MissingVariable { .. }) => "MISSING_VARIABLE",
            Self::Forbidden(ForbiddenKind::RecipientNotWhitelisted { .. }) => {
                "RECIPIENT_NOT_WHITELISTED"
            }
            Self::Delivery { .. } => "DELIVERY_ERROR",
            Self::Persistence { .. } => "PERSISTENCE_ERROR",
            Self::Repository(_) => "REPOSITORY_UNAVAILABLE",
            Self::StageOrder { .. } => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias for startup and wiring code.
pub type Result<T> = std::result::Result<T, Error>;
