//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the stream bridge:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the codec, the services and
//! the session layer depend on. It establishes the logging conventions and the
//! host-build parameters (format layout, size limits) shared by every session.

pub mod config;
pub mod error;
pub mod logging;

pub use config::BridgeConfig;
pub use error::{Error, Result};
