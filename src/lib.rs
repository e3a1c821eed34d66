//! Suraksha Setu: incident triage service.

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod reports;
pub mod store;
