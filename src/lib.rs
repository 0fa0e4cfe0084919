/*!
 * # dualsub - bilingual subtitle merging
 *
 * A Rust library that combines two subtitle tracks of the same video (for
 * example two languages) into a single, time-synchronized bilingual track.
 *
 * ## Features
 *
 * - SRT parsing that tolerates missing or broken index lines, `.` or `,`
 *   millisecond separators and stray malformed blocks
 * - Encoding detection (UTF-8 with/without BOM, UTF-16 LE/BE, Windows-1252)
 * - Three merge policies over a configurable tolerance window:
 *   - `all`: sweep-line union of both tracks
 *   - `overlapping`: only cues present in both tracks
 *   - `primary`: every primary cue, secondary cues fill the gaps
 * - Optional font colors and upper-screen positioning of the primary track
 * - Per-track time offsets
 * - Extraction of embedded text subtitle streams through ffmpeg
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `cue`: The timed text cue value type
 * - `encoding`: Character encoding detection and decoding
 * - `srt`: SRT parser and writer
 * - `merge`: The merge engine and its options
 * - `app_config`: Configuration management
 * - `app_controller`: Orchestration of file I/O, offsets and merging
 * - `extractor`: ffprobe/ffmpeg subprocess integration
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod cue;
pub mod encoding;
pub mod errors;
pub mod extractor;
pub mod file_utils;
pub mod language_utils;
pub mod merge;
pub mod srt;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, MergeReport};
pub use cue::{Cue, shift_cues};
pub use encoding::{EncodingKind, detect_encoding};
pub use errors::{ExtractionError, MergeOptionsError, SubtitleError};
pub use merge::{MergeMode, MergeOptions, merge, overlaps};
pub use srt::{parse, parse_file};
