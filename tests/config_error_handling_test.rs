// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use rust_tanklevel::config::Config;
use std::fs;
use std::path::Path;
use std::sync::Once;
use tempfile::tempdir;

static INIT: Once = Once::new();

// Setup logger for tests
fn setup() {
    INIT.call_once(|| {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .init();
    });
}

fn assert_sample_created(config_path: &Path) -> Result<()> {
    let sample_path = config_path.with_extension("sample.yaml");
    assert!(sample_path.exists(), "Sample config file was not created");

    // Load and verify the sample file is valid
    let sample_config = Config::from_file(&sample_path)?;
    assert_eq!(sample_config.visualization.port, 8080); // Default value
    assert_eq!(sample_config.cache.url, "redis://redis:6379");
    Ok(())
}

#[test]
fn test_config_type_error_creates_sample_file() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    // Valid YAML but wrong structure
    let invalid_yaml = r#"
visualization:
  port: "not-an-integer"  # Integer field with string value
  address: 12345          # String field with number value
  enabled: "true"         # Boolean field with string value
cache:
  timeout_ms: []          # Array instead of integer
"#;
    fs::write(&config_path, invalid_yaml)?;

    let result = Config::from_file(&config_path);
    assert!(result.is_err(), "Config loading should have failed");
    assert_sample_created(&config_path)
}

#[test]
fn test_config_validation_error_creates_sample_file() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    // Valid YAML but port out of range
    let invalid_config = r#"
visualization:
  port: 99999  # Port out of range (valid range is 1-65534)
  address: "127.0.0.1"
  enabled: true
"#;
    fs::write(&config_path, invalid_config)?;

    let result = Config::from_file(&config_path);
    assert!(result.is_err(), "Config loading should have failed");
    assert_sample_created(&config_path)
}

#[test]
fn test_unknown_section_is_rejected() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    fs::write(&config_path, "acquisition:\n  enabled: true\n")?;

    assert!(Config::from_file(&config_path).is_err());
    assert_sample_created(&config_path)
}

#[test]
fn test_specific_rule_error_creates_sample_file() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    // Passes the schema, fails the interval rule
    let invalid_config = r#"
cache:
  url: "memory://"
  poll_interval_ms: 5000
  confirmation_timeout_ms: 1000
"#;
    fs::write(&config_path, invalid_config)?;

    let error = Config::from_file(&config_path).unwrap_err();
    assert!(error.to_string().contains("poll_interval_ms"));
    assert_sample_created(&config_path)
}
