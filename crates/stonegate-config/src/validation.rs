// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects every failure instead of failing fast.

use crate::diagnostic::ConfigError;
use crate::model::StonegateConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with all collected validation errors.
pub fn validate_config(config: &StonegateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let prefix = &config.chat.ref_code_prefix;
    if prefix.len() != 3 || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "chat.ref_code_prefix must be exactly 3 uppercase letters, got `{prefix}`"
            ),
        });
    }

    if config.chat.poll_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "chat.poll_interval_secs must be at least 1".to_string(),
        });
    }

    if config.chat.history_cap == 0 {
        errors.push(ConfigError::Validation {
            message: "chat.history_cap must be at least 1".to_string(),
        });
    }

    if config.chat.code_mint_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "chat.code_mint_attempts must be at least 1".to_string(),
        });
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.chat.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "chat.log_level must be one of {valid_levels:?}, got `{}`",
                config.chat.log_level
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.media.root_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "media.root_dir must not be empty".to_string(),
        });
    }

    if config.media.public_base_url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "media.public_base_url must not be empty".to_string(),
        });
    }

    if config.media.max_upload_bytes == 0 {
        errors.push(ConfigError::Validation {
            message: "media.max_upload_bytes must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
