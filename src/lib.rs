//! Notify Orchestrator: rule-driven notification dispatch.

pub mod api;
pub mod channels;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod service;
pub mod store;
