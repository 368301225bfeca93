//! Shared utilities for finagent-rs
//!
//! This crate provides common functionality used across the finagent-rs
//! workspace, including logging setup and runtime configuration.

pub mod config;
pub mod logging;

pub use config::RuntimeConfig;
pub use logging::{init_tracing, init_tracing_with};
