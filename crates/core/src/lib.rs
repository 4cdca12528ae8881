//! Citegate Core Library
//!
//! This crate provides the foundational utilities for the Citegate gateway:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - Telemetry (request counters, latency histograms, token gauges)

pub mod config;
pub mod error;
pub mod logging;
pub mod telemetry;

// Re-export commonly used types
pub use config::GatewayConfig;
pub use error::{AppError, AppResult};
pub use telemetry::{LatencyTimer, Telemetry};
