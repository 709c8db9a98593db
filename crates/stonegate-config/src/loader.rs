// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./stonegate.toml` > `~/.config/stonegate/stonegate.toml`
//! > `/etc/stonegate/stonegate.toml` with environment variable overrides
//! via the `STONEGATE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::StonegateConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/stonegate/stonegate.toml` (system-wide)
/// 3. `~/.config/stonegate/stonegate.toml` (user XDG config)
/// 4. `./stonegate.toml` (local directory)
/// 5. `STONEGATE_*` environment variables
pub fn load_config() -> Result<StonegateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StonegateConfig::default()))
        .merge(Toml::file("/etc/stonegate/stonegate.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("stonegate/stonegate.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("stonegate.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<StonegateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StonegateConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<StonegateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StonegateConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `STONEGATE_CHAT_POLL_INTERVAL_SECS`
/// must map to `chat.poll_interval_secs`, not `chat.poll.interval.secs`.
fn env_provider() -> Env {
    Env::prefixed("STONEGATE_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("chat_", "chat.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("media_", "media.", 1);
        mapped.into()
    })
}
