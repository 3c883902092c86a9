//! Client code for pagecheck.
//!
//! This crate provides the HTTP fetch pipeline, HTML text extraction,
//! deterministic rule checks, and the tone-analysis gateway consumed by
//! the batch pipeline.

pub mod extract;
pub mod fetch;
pub mod gateway;
pub mod rules;

pub use extract::extract_text;
pub use fetch::{FetchClient, FetchConfig, FetchResponse, PageFetcher, canonicalize};
pub use gateway::{AnalysisGateway, GatewayError, ToneClient, ToneConfig};
pub use rules::{check_a11y, check_seo};
