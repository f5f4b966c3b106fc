//! Outbound delivery and recipient eligibility.

pub mod email;
pub mod whitelist;

pub use email::{EmailSender, SmtpConfig, SmtpSender};
pub use whitelist::{WhitelistChecker, WhitelistConfig};
