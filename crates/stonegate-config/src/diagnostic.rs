// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration error diagnostics.
//!
//! Bridges Figment extraction failures and post-deserialization
//! validation failures into miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

/// A configuration error with diagnostic metadata.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A semantic validation failure for a config value.
    #[error("validation error: {message}")]
    #[diagnostic(code(stonegate::config::validation))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// A Figment extraction failure (unknown key, wrong type, bad TOML).
    #[error("configuration error: {message}")]
    #[diagnostic(
        code(stonegate::config::extract),
        help("check stonegate.toml and STONEGATE_* environment overrides")
    )]
    Extract {
        /// The underlying Figment error, rendered.
        message: String,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Extract {
            message: err.to_string(),
        }
    }
}
