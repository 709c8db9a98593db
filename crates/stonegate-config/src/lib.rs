// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Stonegate support chat.
//!
//! Layered TOML configuration via Figment (XDG hierarchy + `STONEGATE_*`
//! env overrides), with post-deserialization validation and miette
//! diagnostics.

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::ConfigError;
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{ChatConfig, DeliveryMode, MediaConfig, StonegateConfig, StorageConfig};
pub use validation::validate_config;
