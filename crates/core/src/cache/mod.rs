//! SQLite-backed cache for page audit records.
//!
//! This module provides a persistent, fingerprint-addressed cache using
//! SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Identity-addressed storage using SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Write-once records with an explicit wholesale clear

pub mod connection;
pub mod fingerprint;
pub mod migrations;
pub mod records;

pub use crate::Error;

pub use connection::CacheDb;
pub use fingerprint::fingerprint;
