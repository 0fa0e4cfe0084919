/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use dualsub::app_config::{Config, LogLevel};
use dualsub::merge::MergeMode;
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.merge.mode, "all");
    assert_eq!(config.merge.tolerance_ms, 700);
    assert!(config.merge.use_positioning);
    assert!(config.merge.primary_color.is_none());
    assert_eq!(config.offsets.primary_ms, 0);
    assert_eq!(config.offsets.secondary_ms, 0);
    assert_eq!(config.extraction.ffmpeg_path, "ffmpeg");
    assert_eq!(config.extraction.ffprobe_path, "ffprobe");
    assert_eq!(config.extraction.output_suffix, "dual");
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    config.merge.tolerance_ms = -5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.extraction.timeout_secs = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.extraction.output_suffix = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.extraction.ffprobe_path = String::new();
    assert!(config.validate().is_err());

    // Unknown mode names are tolerated
    let mut config = Config::default();
    config.merge.mode = "sideways".to_string();
    assert!(config.validate().is_ok());
    assert_eq!(config.merge.resolved_mode(), MergeMode::AllCues);
}

/// Test building merge options from the config section
#[test]
fn test_to_merge_options_withCustomValues_shouldCarryThemOver() -> Result<()> {
    let mut config = Config::default();
    config.merge.mode = "primary".to_string();
    config.merge.tolerance_ms = 250;
    config.merge.primary_color = Some("#ffff00".to_string());
    config.merge.secondary_color = Some(String::new());
    config.merge.use_positioning = false;

    let options = config.merge.to_merge_options()?;
    assert_eq!(options.mode(), MergeMode::PrimaryPriority);
    assert_eq!(options.tolerance_ms(), 250);
    assert_eq!(options.primary_color(), Some("#ffff00"));
    assert_eq!(options.secondary_color(), None);
    assert!(!options.use_positioning());
    Ok(())
}

/// Test save and reload
#[test]
fn test_save_then_from_file_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("dualsub.json");

    let mut config = Config::default();
    config.merge.mode = "overlapping".to_string();
    config.offsets.secondary_ms = -1500;
    config.log_level = LogLevel::Debug;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded.merge.mode, "overlapping");
    assert_eq!(loaded.offsets.secondary_ms, -1500);
    assert_eq!(loaded.log_level, LogLevel::Debug);
    Ok(())
}

/// Test that missing sections fall back to defaults
#[test]
fn test_from_file_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "partial.json",
        r#"{ "merge": { "tolerance_ms": 300 }, "log_level": "warn" }"#,
    )?;

    let config = Config::from_file(&path)?;
    assert_eq!(config.merge.tolerance_ms, 300);
    assert_eq!(config.merge.mode, "all");
    assert!(config.merge.use_positioning);
    assert_eq!(config.extraction.timeout_secs, 120);
    assert_eq!(config.log_level, LogLevel::Warn);
    assert_eq!(config.log_level.to_level_filter(), log::LevelFilter::Warn);
    Ok(())
}

/// Test malformed and missing files
#[test]
fn test_from_file_withInvalidInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json", "{ not json")?;

    assert!(Config::from_file(&path).is_err());
    assert!(Config::from_file(temp_dir.path().join("missing.json")).is_err());
    Ok(())
}
