/*!
 * Error types for the dualsub application.
 *
 * Parsing and merging never fail on malformed subtitle data; the errors below
 * cover the cases that do surface to callers: file access, invalid merge
 * options and failures of the external extraction tools.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading or writing subtitle files
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The subtitle file could not be read
    #[error("Failed to read subtitle file {path:?}: {source}")]
    Read {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The subtitle file could not be written
    #[error("Failed to write subtitle file {path:?}: {source}")]
    Write {
        /// File that was being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised when building merge options
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MergeOptionsError {
    /// Tolerance must not be negative
    #[error("Tolerance must be non-negative, got {0} ms")]
    NegativeTolerance(i64),

    /// Tolerance larger than the supported window
    #[error("Tolerance of {value} ms exceeds the maximum of {max} ms")]
    ToleranceTooLarge {
        /// Requested tolerance
        value: i64,
        /// Largest accepted tolerance
        max: i64,
    },
}

/// Errors from the ffmpeg/ffprobe subtitle extraction collaborator
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Input video does not exist
    #[error("Video file does not exist: {0:?}")]
    VideoNotFound(PathBuf),

    /// The external tool could not be started
    #[error("Failed to execute {tool}: {message}")]
    ToolUnavailable {
        /// Tool name (ffmpeg or ffprobe)
        tool: String,
        /// Spawn error message
        message: String,
    },

    /// The external tool ran but reported a failure
    #[error("{tool} failed: {message}")]
    ToolFailed {
        /// Tool name
        tool: String,
        /// Filtered stderr output
        message: String,
    },

    /// The external tool did not finish in time
    #[error("{tool} timed out after {secs} seconds")]
    Timeout {
        /// Tool name
        tool: String,
        /// Timeout that elapsed
        secs: u64,
    },

    /// ffprobe returned output that is not the expected JSON
    #[error("Failed to parse ffprobe output: {0}")]
    InvalidProbeOutput(String),

    /// Track uses an image codec that cannot be converted to text
    #[error("Track {index} uses bitmap codec '{codec}' and cannot be converted to SRT without OCR")]
    BitmapTrack {
        /// Absolute stream index
        index: usize,
        /// Codec reported by ffprobe
        codec: String,
    },

    /// No track matches the requested selector
    #[error("No subtitle track found for {0}")]
    TrackNotFound(String),

    /// ffmpeg produced an empty file
    #[error("Extracted file is empty, no subtitles found in track {0}")]
    EmptyOutput(usize),

    /// Filesystem error around the extraction
    #[error("I/O error during extraction: {0}")]
    Io(#[from] std::io::Error),
}
