//! Linkforge - short-code allocation and click-ledger engine
//!
//! This library provides the core of a URL shortener: allocating unique
//! short codes under concurrent creation, resolving them without waiting
//! on click durability, and keeping an append-only click ledger for
//! statistics.
//!
//! # Architecture
//! - `storage`: SeaORM-backed link store and click ledger
//! - `analytics`: buffered click recording and data retention
//! - `services`: shortener and statistics service layers
//! - `config`: configuration management
//! - `system`: logging and process-level utilities

pub mod analytics;
pub mod config;
pub mod errors;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
