use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use crate::merge::{MergeMode, MergeOptions, DEFAULT_TOLERANCE_MS};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Merge policy settings
    #[serde(default)]
    pub merge: MergeConfig,

    /// Per-track time offsets applied before merging
    #[serde(default)]
    pub offsets: OffsetConfig,

    /// External extraction tool settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Merge settings as written in the configuration file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MergeConfig {
    /// Mode name: "all", "overlapping" or "primary". Unknown names fall back
    /// to "all".
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Tolerance window in milliseconds
    #[serde(default = "default_tolerance_ms")]
    pub tolerance_ms: i64,

    /// Font color for the primary (top) track
    #[serde(default)]
    pub primary_color: Option<String>,

    /// Font color for the secondary (bottom) track
    #[serde(default)]
    pub secondary_color: Option<String>,

    /// Prefix primary text with the upper-screen position marker
    #[serde(default = "default_true")]
    pub use_positioning: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            tolerance_ms: default_tolerance_ms(),
            primary_color: None,
            secondary_color: None,
            use_positioning: true,
        }
    }
}

impl MergeConfig {
    // @returns: Mode resolved leniently from the configured name
    pub fn resolved_mode(&self) -> MergeMode {
        MergeMode::from_name_lenient(&self.mode)
    }

    /// Build validated merge options from these settings
    pub fn to_merge_options(&self) -> Result<MergeOptions> {
        let options = MergeOptions::new(self.resolved_mode(), self.tolerance_ms)?
            .with_primary_color(self.primary_color.as_deref())
            .with_secondary_color(self.secondary_color.as_deref())
            .with_positioning(self.use_positioning);
        Ok(options)
    }
}

/// Time offsets in milliseconds; positive values delay a track
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct OffsetConfig {
    // @field: Offset of the primary track
    #[serde(default)]
    pub primary_ms: i64,

    // @field: Offset of the secondary track
    #[serde(default)]
    pub secondary_ms: i64,
}

/// Settings for the ffmpeg/ffprobe collaborator
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffprobe executable
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Timeout for a single tool invocation in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Suffix inserted before the extension of merged output files
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_timeout_secs(),
            output_suffix: default_output_suffix(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_mode() -> String {
    MergeMode::AllCues.name().to_string()
}

fn default_tolerance_ms() -> i64 {
    DEFAULT_TOLERANCE_MS
}

fn default_true() -> bool {
    true
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_timeout_secs() -> u64 {
    120 // ffmpeg can be slow on large remote files
}

fn default_output_suffix() -> String {
    "dual".to_string()
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| anyhow!("Failed to open config file {:?}: {}", path, e))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| anyhow!("Failed to parse config file {:?}: {}", path, e))?;
        Ok(config)
    }

    /// Write this configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)
            .map_err(|e| anyhow!("Failed to write config file {:?}: {}", path.as_ref(), e))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Surfaces tolerance errors before any file is touched
        self.merge.to_merge_options()?;

        if self.extraction.timeout_secs == 0 {
            return Err(anyhow!("Extraction timeout must be greater than zero"));
        }

        if self.extraction.output_suffix.trim().is_empty() {
            return Err(anyhow!("Output suffix must not be empty"));
        }

        if self.extraction.ffmpeg_path.trim().is_empty() || self.extraction.ffprobe_path.trim().is_empty() {
            return Err(anyhow!("ffmpeg and ffprobe paths must not be empty"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            merge: MergeConfig::default(),
            offsets: OffsetConfig::default(),
            extraction: ExtractionConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
