//! # Bridge Configuration Module
//!
//! Provides configuration management for the remote stream bridge.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `BridgeConfig`. It enforces fail-fast validation so that a session never
//! starts with a layout that disagrees with the host ABI or with limits that
//! would reject every request.
//!
//! ## Required Settings
//!
//! - `FormatLayout` - The host's compiled format header layout. There is no
//!   sensible default: the header size is a property of the host build.
//!
//! ## Optional Settings (with defaults)
//!
//! - `max_frame_bytes` - Largest request frame accepted (16 MiB)
//! - `max_read_bytes` - Largest single access read (1 MiB)
//!
//! ## Usage
//!
//! ```
//! use bridge_traits::{FieldSpan, FormatLayout};
//! use core_runtime::config::BridgeConfig;
//!
//! let layout = FormatLayout {
//!     header_size: 64,
//!     extra_len: FieldSpan::new(16, 4),
//!     extra_ptr: FieldSpan::new(24, 8),
//!     extra_languages_len: FieldSpan::new(32, 4),
//!     extra_languages_ptr: FieldSpan::new(40, 8),
//! };
//!
//! let config = BridgeConfig::builder()
//!     .format_layout(layout)
//!     .max_frame_bytes(4 * 1024 * 1024)
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.max_read_bytes, 1024 * 1024);
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::BridgeConfig;
//!
//! // This will panic: the host layout is mandatory
//! let config = BridgeConfig::builder()
//!     .build()
//!     .expect("Should fail - missing format layout");
//! ```

use crate::error::{Error, Result};
use bridge_traits::FormatLayout;
use serde::{Deserialize, Serialize};

/// Default upper bound for a single request frame.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Default upper bound for a single access read.
pub const DEFAULT_MAX_READ_BYTES: u64 = 1024 * 1024;

/// Bridge configuration.
///
/// Shared by every session created for the same host build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Host format header layout
    pub format_layout: FormatLayout,

    /// Largest request frame accepted, in bytes
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    /// Largest access read serviced, in bytes
    #[serde(default = "default_max_read_bytes")]
    pub max_read_bytes: u64,
}

fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}

fn default_max_read_bytes() -> u64 {
    DEFAULT_MAX_READ_BYTES
}

impl BridgeConfig {
    /// Creates a new builder for constructing a `BridgeConfig`.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Load a configuration from JSON and validate it.
    ///
    /// ```
    /// use core_runtime::config::BridgeConfig;
    ///
    /// let json = r#"{
    ///     "format_layout": {
    ///         "header_size": 64,
    ///         "extra_len": { "offset": 16, "width": 4 },
    ///         "extra_ptr": { "offset": 24, "width": 8 },
    ///         "extra_languages_len": { "offset": 32, "width": 4 },
    ///         "extra_languages_ptr": { "offset": 40, "width": 8 }
    ///     }
    /// }"#;
    ///
    /// let config = BridgeConfig::from_json(json).unwrap();
    /// assert_eq!(config.format_layout.header_size, 64);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BridgeConfig = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid bridge config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The format layout fits inside its header and fields do not overlap
    /// - Frame and read limits are non-zero
    /// - A frame can hold at least one full format header
    pub fn validate(&self) -> Result<()> {
        self.format_layout
            .validate()
            .map_err(|e| Error::Config(format!("Invalid format layout: {}", e)))?;

        if self.max_frame_bytes == 0 {
            return Err(Error::Config(
                "max_frame_bytes must be greater than 0".to_string(),
            ));
        }

        if self.max_frame_bytes < self.format_layout.header_size {
            return Err(Error::Config(format!(
                "max_frame_bytes ({}) cannot hold a {}-byte format header",
                self.max_frame_bytes, self.format_layout.header_size
            )));
        }

        if self.max_read_bytes == 0 {
            return Err(Error::Config(
                "max_read_bytes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for constructing [`BridgeConfig`] instances.
#[derive(Debug, Default)]
pub struct BridgeConfigBuilder {
    format_layout: Option<FormatLayout>,
    max_frame_bytes: Option<usize>,
    max_read_bytes: Option<u64>,
}

impl BridgeConfigBuilder {
    /// Sets the host format header layout (required).
    pub fn format_layout(mut self, layout: FormatLayout) -> Self {
        self.format_layout = Some(layout);
        self
    }

    /// Sets the largest request frame accepted.
    ///
    /// Default: 16 MiB
    pub fn max_frame_bytes(mut self, bytes: usize) -> Self {
        self.max_frame_bytes = Some(bytes);
        self
    }

    /// Sets the largest access read serviced.
    ///
    /// Default: 1 MiB
    pub fn max_read_bytes(mut self, bytes: u64) -> Self {
        self.max_read_bytes = Some(bytes);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] when no format layout was given,
    /// and [`Error::Config`] when validation fails.
    pub fn build(self) -> Result<BridgeConfig> {
        let format_layout = self.format_layout.ok_or_else(|| Error::CapabilityMissing {
            capability: "FormatLayout".to_string(),
            message: "The host format header layout is required to validate format \
                     descriptors. Provide the compiled structure size and the offsets \
                     of the extra/extra-languages fields."
                .to_string(),
        })?;

        let config = BridgeConfig {
            format_layout,
            max_frame_bytes: self.max_frame_bytes.unwrap_or(DEFAULT_MAX_FRAME_BYTES),
            max_read_bytes: self.max_read_bytes.unwrap_or(DEFAULT_MAX_READ_BYTES),
        };

        config.validate()?;
        Ok(config)
    }
}
