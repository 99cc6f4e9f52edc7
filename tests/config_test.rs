// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use rust_tanklevel::config::{CacheConfig, Config, RegistryConfig, VisualizationConfig};
use tempfile::tempdir;

#[test]
fn test_config_load_and_save() -> Result<()> {
    // Create a temporary directory
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    // Create a custom config
    let config = Config {
        visualization: VisualizationConfig {
            port: 8081,
            address: "192.168.1.1".to_string(),
            name: "TestServer".to_string(),
            ..VisualizationConfig::default()
        },
        cache: CacheConfig {
            url: "redis://10.0.0.2:6379/1".to_string(),
            confirmation_timeout_ms: 5000,
            ..CacheConfig::default()
        },
        registry: RegistryConfig {
            database_url: "sqlite:///tmp/iot.db".to_string(),
        },
    };

    // Save config to file
    config.save_to_file(&config_path)?;

    // Load config from file
    let loaded_config = Config::from_file(&config_path)?;

    // Verify loaded config matches original
    assert_eq!(loaded_config.visualization.port, 8081);
    assert_eq!(loaded_config.visualization.address, "192.168.1.1");
    assert_eq!(loaded_config.visualization.name, "TestServer");
    assert_eq!(loaded_config.cache.url, "redis://10.0.0.2:6379/1");
    assert_eq!(loaded_config.cache.confirmation_timeout_ms, 5000);
    assert_eq!(loaded_config.cache.poll_interval_ms, 100);
    assert_eq!(loaded_config.registry.database_url, "sqlite:///tmp/iot.db");

    // Test loading default config for non-existent file
    let non_existent_path = temp_dir.path().join("non_existent.yaml");
    let default_config = Config::from_file(&non_existent_path)?;

    // Verify default config was created
    assert!(non_existent_path.exists());
    assert_eq!(default_config.visualization.port, 8080);
    assert_eq!(default_config.visualization.address, "127.0.0.1");
    assert_eq!(default_config.cache.url, "redis://redis:6379");
    assert_eq!(default_config.cache.health_check_key, "health_check_key");

    Ok(())
}

#[test]
fn test_partial_file_uses_defaults() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    std::fs::write(
        &config_path,
        "cache:\n  url: \"memory://\"\n  poll_interval_ms: 50\n",
    )?;

    let config = Config::from_file(&config_path)?;
    assert_eq!(config.cache.url, "memory://");
    assert_eq!(config.cache.poll_interval_ms, 50);
    assert_eq!(config.cache.confirmation_timeout_ms, 15_000);
    assert_eq!(config.visualization.port, 8080);
    assert!(config.visualization.enabled);
    assert_eq!(config.registry.database_url, "sqlite:///data/iot.db");
    Ok(())
}

#[test]
fn test_apply_args() {
    let mut config = Config::default();
    assert_eq!(config.visualization.port, 8080);
    assert_eq!(config.visualization.address, "127.0.0.1");

    // Apply command-line arguments
    config.apply_args(
        Some(9000),
        Some("192.168.0.1".to_string()),
        Some("memory://".to_string()),
    );

    // Verify values were overridden
    assert_eq!(config.visualization.port, 9000);
    assert_eq!(config.visualization.address, "192.168.0.1");
    assert_eq!(config.cache.url, "memory://");

    // Absent arguments keep the current values
    config.apply_args(None, None, None);
    assert_eq!(config.visualization.port, 9000);
    assert_eq!(config.cache.url, "memory://");
}

#[test]
fn test_config_validation() -> Result<()> {
    // Valid config
    let valid_config = Config::default();
    assert!(valid_config.validate().is_ok());

    // Invalid port (outside allowed range)
    let mut invalid_port_config = Config::default();
    invalid_port_config.visualization.port = 65535;
    assert!(invalid_port_config.validate().is_err());

    // Invalid certificate configuration (cert without key)
    let mut invalid_cert_config = Config::default();
    invalid_cert_config.visualization.cert = Some("SGVsbG8gV29ybGQ=".to_string()); // Base64 "Hello World"
    assert!(invalid_cert_config.validate().is_err());

    // Unsupported cache backend
    let mut invalid_cache_config = Config::default();
    invalid_cache_config.cache.url = "http://redis:6379".to_string();
    assert!(invalid_cache_config.validate().is_err());

    // Poll interval of zero would spin
    let mut invalid_interval_config = Config::default();
    invalid_interval_config.cache.poll_interval_ms = 0;
    assert!(invalid_interval_config.validate().is_err());

    Ok(())
}
