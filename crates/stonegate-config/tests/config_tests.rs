// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for config loading and validation.

use stonegate_config::{
    load_config_from_str, validate_config, ConfigError, DeliveryMode, StonegateConfig,
};

#[test]
fn defaults_are_sensible() {
    let config = StonegateConfig::default();
    assert_eq!(config.chat.ref_code_prefix, "SPG");
    assert_eq!(config.chat.delivery_mode, DeliveryMode::Poll);
    assert_eq!(config.chat.poll_interval_secs, 4);
    assert_eq!(config.chat.history_cap, 20);
    assert!(config.chat.notification_sound);
    assert_eq!(config.chat.code_mint_attempts, 4);
    assert_eq!(config.storage.database_path, "stonegate.db");
    assert!(validate_config(&config).is_ok());
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").unwrap();
    assert_eq!(config.chat.ref_code_prefix, "SPG");
    assert_eq!(config.media.max_upload_bytes, 25 * 1024 * 1024);
}

#[test]
fn toml_overrides_defaults() {
    let config = load_config_from_str(
        r#"
        [chat]
        delivery_mode = "push"
        poll_interval_secs = 10
        history_cap = 5
        notification_sound = false

        [storage]
        database_path = "/var/lib/stonegate/chat.db"

        [media]
        public_base_url = "https://cdn.example.com/chat"
        "#,
    )
    .unwrap();

    assert_eq!(config.chat.delivery_mode, DeliveryMode::Push);
    assert_eq!(config.chat.poll_interval_secs, 10);
    assert_eq!(config.chat.history_cap, 5);
    assert!(!config.chat.notification_sound);
    assert_eq!(config.storage.database_path, "/var/lib/stonegate/chat.db");
    assert_eq!(config.media.public_base_url, "https://cdn.example.com/chat");
    // Untouched sections keep their defaults.
    assert_eq!(config.chat.ref_code_prefix, "SPG");
    assert!(validate_config(&config).is_ok());
}

#[test]
fn unknown_keys_are_rejected() {
    let result = load_config_from_str(
        r#"
        [chat]
        pol_interval_secs = 10
        "#,
    );
    assert!(result.is_err(), "typo'd key must not be silently ignored");
}

#[test]
fn unknown_delivery_mode_is_rejected() {
    let result = load_config_from_str(
        r#"
        [chat]
        delivery_mode = "carrier-pigeon"
        "#,
    );
    assert!(result.is_err());
}

#[test]
fn validation_collects_all_errors() {
    let mut config = StonegateConfig::default();
    config.chat.ref_code_prefix = "spg".to_string();
    config.chat.poll_interval_secs = 0;
    config.chat.history_cap = 0;
    config.storage.database_path = "  ".to_string();

    let errors = validate_config(&config).unwrap_err();
    assert_eq!(errors.len(), 4);
    assert!(errors
        .iter()
        .all(|e| matches!(e, ConfigError::Validation { .. })));
}

#[test]
fn validation_rejects_long_prefix() {
    let mut config = StonegateConfig::default();
    config.chat.ref_code_prefix = "SPGX".to_string();
    assert!(validate_config(&config).is_err());
}

#[test]
fn validation_rejects_bad_log_level() {
    let mut config = StonegateConfig::default();
    config.chat.log_level = "verbose".to_string();
    assert!(validate_config(&config).is_err());
}
