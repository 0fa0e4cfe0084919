use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::str::FromStr;
use std::time::Duration;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::process::Command;
use crate::app_config::ExtractionConfig;
use crate::errors::ExtractionError;
use crate::language_utils;

// @module: Subtitle stream extraction through ffprobe/ffmpeg

/// Information about a subtitle stream inside a video container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    /// Absolute stream index in the container
    pub index: usize,

    /// Codec name reported by ffprobe
    pub codec_name: String,

    /// Language tag (ISO 639-1 or ISO 639-2)
    pub language: Option<String>,

    /// Track title if available
    pub title: Option<String>,
}

impl SubtitleTrack {
    /// Image-based tracks cannot be turned into SRT without OCR
    pub fn is_bitmap(&self) -> bool {
        is_bitmap_codec(&self.codec_name)
    }
}

impl fmt::Display for SubtitleTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "track {} ({}, {}){}",
            self.index,
            self.language.as_deref().unwrap_or("?"),
            self.codec_name,
            self.title.as_deref().map(|t| format!(" \"{}\"", t)).unwrap_or_default()
        )
    }
}

/// How a track is chosen: absolute stream index, language code, or an
/// external SRT file used instead of an embedded stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSelector {
    Index(usize),
    Language(String),
    File(PathBuf),
}

impl TrackSelector {
    /// External file backing this side, if any
    pub fn external_file(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            _ => None,
        }
    }
}

impl FromStr for TrackSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(index) = s.parse::<usize>() {
            return Ok(Self::Index(index));
        }

        let looks_like_path = s.contains(['/', '\\'])
            || Path::new(s).extension().is_some_and(|ext| ext.eq_ignore_ascii_case("srt"));
        Ok(if looks_like_path {
            Self::File(PathBuf::from(s))
        } else {
            Self::Language(s.to_lowercase())
        })
    }
}

impl fmt::Display for TrackSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "stream index {}", index),
            Self::Language(lang) => write!(f, "language '{}'", lang),
            Self::File(path) => write!(f, "file {:?}", path),
        }
    }
}

/// Check if a subtitle codec is bitmap-based (cannot be converted to text SRT)
pub fn is_bitmap_codec(codec_name: &str) -> bool {
    matches!(
        codec_name,
        "hdmv_pgs_subtitle" | "dvd_subtitle" | "dvb_subtitle" | "xsub"
    )
}

/// Parse the JSON printed by `ffprobe -print_format json -show_streams`
pub fn parse_probe_output(json: &str) -> Result<Vec<SubtitleTrack>, ExtractionError> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(json)
        .map_err(|e| ExtractionError::InvalidProbeOutput(e.to_string()))?;

    let Some(streams) = value.get("streams").and_then(|s| s.as_array()) else {
        return Ok(Vec::new());
    };

    let tracks = streams
        .iter()
        .map(|stream| {
            let tag = |name: &str| {
                stream.get("tags")
                    .and_then(|t| t.get(name))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
            };

            SubtitleTrack {
                index: stream.get("index")
                    .and_then(|v| v.as_u64())
                    .map(|v| v as usize)
                    .unwrap_or(0),
                codec_name: stream.get("codec_name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string(),
                language: tag("language"),
                title: tag("title"),
            }
        })
        .collect();

    Ok(tracks)
}

/// Pick a text track for `selector`. Index selectors must name an existing
/// text track; language selectors match the language tag first, then a
/// mention of the language name or code in the title.
pub fn select_track<'a>(tracks: &'a [SubtitleTrack], selector: &TrackSelector) -> Result<&'a SubtitleTrack, ExtractionError> {
    let found = match selector {
        TrackSelector::Index(index) => tracks.iter().find(|t| t.index == *index),
        TrackSelector::Language(code) => tracks
            .iter()
            .filter(|t| !t.is_bitmap())
            .find(|t| t.language.as_deref().is_some_and(|lang| language_utils::language_codes_match(lang, code)))
            .or_else(|| {
                let name = language_utils::get_language_name(code).ok().map(|n| n.to_lowercase());
                tracks.iter().filter(|t| !t.is_bitmap()).find(|t| {
                    t.title.as_deref().is_some_and(|title| {
                        let title = title.to_lowercase();
                        name.as_deref().is_some_and(|n| title.contains(n)) || title.contains(code.as_str())
                    })
                })
            }),
        // external files never name an embedded stream
        TrackSelector::File(_) => None,
    };

    let track = found.ok_or_else(|| ExtractionError::TrackNotFound(selector.to_string()))?;
    if track.is_bitmap() {
        return Err(ExtractionError::BitmapTrack {
            index: track.index,
            codec: track.codec_name.clone(),
        });
    }
    Ok(track)
}

/// Keep only the ffmpeg stderr lines that explain a failure; banner and
/// stream metadata lines are dropped.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Chapter",
        "Stream #",
        "title",
        "BPS",
        "DURATION",
        "NUMBER_OF",
        "_STATISTICS",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (no diagnostic output)".to_string()
    } else {
        meaningful.join("\n")
    }
}

/// Runs ffprobe and ffmpeg as subprocesses
#[derive(Debug, Clone)]
pub struct Extractor {
    ffmpeg_path: String,
    ffprobe_path: String,
    timeout: Duration,
}

impl Extractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    async fn run(&self, tool: &str, args: &[&str]) -> Result<Output, ExtractionError> {
        let mut command = Command::new(tool);
        command.args(args).kill_on_drop(true);
        let future = command.output();

        tokio::select! {
            result = future => result.map_err(|e| ExtractionError::ToolUnavailable {
                tool: tool.to_string(),
                message: e.to_string(),
            }),
            _ = tokio::time::sleep(self.timeout) => Err(ExtractionError::Timeout {
                tool: tool.to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }

    /// Whether ffmpeg can be started
    pub async fn is_available(&self) -> bool {
        match self.run(&self.ffmpeg_path, &["-version"]).await {
            Ok(output) => output.status.success(),
            Err(e) => {
                debug!("ffmpeg not available: {}", e);
                false
            }
        }
    }

    /// List subtitle tracks in a video file
    pub async fn list_subtitle_tracks<P: AsRef<Path>>(&self, video_path: P) -> Result<Vec<SubtitleTrack>, ExtractionError> {
        let video_path = video_path.as_ref();
        if !video_path.exists() {
            return Err(ExtractionError::VideoNotFound(video_path.to_path_buf()));
        }

        let video = video_path.to_string_lossy();
        let output = self.run(&self.ffprobe_path, &[
            "-v", "quiet",
            "-print_format", "json",
            "-show_streams",
            "-select_streams", "s",
            &*video,
        ]).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("ffprobe failed: {}", stderr);
            return Err(ExtractionError::ToolFailed {
                tool: self.ffprobe_path.clone(),
                message: stderr.trim().to_string(),
            });
        }

        let tracks = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
        let bitmap_count = tracks.iter().filter(|t| t.is_bitmap()).count();
        if bitmap_count > 0 {
            warn!("{} bitmap subtitle track(s) (PGS/VobSub) cannot be merged without OCR", bitmap_count);
        }
        Ok(tracks)
    }

    /// Extract one subtitle stream to an SRT file
    pub async fn extract_track<P1: AsRef<Path>, P2: AsRef<Path>>(&self, video_path: P1, track: &SubtitleTrack, output_path: P2) -> Result<(), ExtractionError> {
        let video_path = video_path.as_ref();
        let output_path = output_path.as_ref();

        if !video_path.exists() {
            return Err(ExtractionError::VideoNotFound(video_path.to_path_buf()));
        }
        if track.is_bitmap() {
            return Err(ExtractionError::BitmapTrack {
                index: track.index,
                codec: track.codec_name.clone(),
            });
        }

        debug!("Extracting {} to {:?}", track, output_path);

        let video = video_path.to_string_lossy();
        let output = output_path.to_string_lossy();
        let map = format!("0:{}", track.index);
        let result = self.run(&self.ffmpeg_path, &[
            "-y",
            "-i", &*video,
            "-map", map.as_str(),
            "-c:s", "srt",
            &*output,
        ]).await?;

        if !result.status.success() {
            let filtered = filter_ffmpeg_stderr(&String::from_utf8_lossy(&result.stderr));
            error!("Subtitle extraction failed: {}", filtered);
            return Err(ExtractionError::ToolFailed {
                tool: self.ffmpeg_path.clone(),
                message: filtered,
            });
        }

        if std::fs::metadata(output_path)?.len() == 0 {
            return Err(ExtractionError::EmptyOutput(track.index));
        }

        Ok(())
    }
}
