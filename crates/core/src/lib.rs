//! Core types and shared functionality for pagecheck.
//!
//! This crate provides:
//! - Record cache with SQLite backend, keyed by identity fingerprint
//! - Atomic per-run call budget
//! - Bounded retry policy
//! - Unified error types
//! - Configuration structures

pub mod budget;
pub mod cache;
pub mod config;
pub mod error;
pub mod record;
pub mod retry;

pub use budget::CallBudget;
pub use cache::{CacheDb, fingerprint};
pub use config::{AnalysisConfig, AppConfig, ConfigError};
pub use error::Error;
pub use record::{CategoryScores, PageRecord, RuleReport, RuleScores, ToneAnalysis};
pub use retry::RetryPolicy;
