use std::fs;
use std::path::Path;
use regex::Regex;
use once_cell::sync::Lazy;
use log::{debug, warn};
use crate::cue::Cue;
use crate::encoding::{self, EncodingKind};
use crate::errors::SubtitleError;

// @module: SRT parsing and serialization

// @const: SRT timecode line, one or two hour digits, ',' or '.' before millis
static TIMECODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}:\d{2}:\d{2}[,.]\d{3})\s*-->\s*(\d{1,2}:\d{2}:\d{2}[,.]\d{3})").unwrap()
});

// @const: One or more blank (whitespace-only) lines between blocks
static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\s*\n").unwrap()
});

/// Parse SRT content into cues, in block order.
///
/// Malformed blocks (too few lines, no recognizable timecode, no text) are
/// skipped; the parse as a whole never fails.
pub fn parse(content: &str) -> Vec<Cue> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let normalized = normalized.strip_prefix('\u{FEFF}').unwrap_or(&normalized);

    let mut cues = Vec::new();
    let mut skipped = 0;

    for block in BLOCK_SEPARATOR.split(normalized.trim()) {
        match parse_block(block.trim(), cues.len() + 1) {
            Some(cue) => cues.push(cue),
            None => {
                if !block.trim().is_empty() {
                    skipped += 1;
                }
            }
        }
    }

    if skipped > 0 {
        debug!("Skipped {} malformed subtitle block(s), kept {}", skipped, cues.len());
    }

    cues
}

/// Detect the encoding of `bytes`, decode and parse
pub fn parse_bytes(bytes: &[u8]) -> Vec<Cue> {
    let (content, kind) = encoding::decode_auto(bytes);
    debug!("Decoding subtitle content as {}", kind);
    parse(&content)
}

/// Read and parse a subtitle file, detecting its encoding.
/// Only file access can fail.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<Cue>, SubtitleError> {
    let bytes = read_bytes(path.as_ref())?;
    Ok(parse_bytes(&bytes))
}

/// Read and parse a subtitle file with a caller-chosen encoding
pub fn parse_file_with_encoding<P: AsRef<Path>>(path: P, kind: EncodingKind) -> Result<Vec<Cue>, SubtitleError> {
    let bytes = read_bytes(path.as_ref())?;
    Ok(parse(&encoding::decode(&bytes, kind)))
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, SubtitleError> {
    fs::read(path).map_err(|source| SubtitleError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_block(block: &str, fallback_seq_num: usize) -> Option<Cue> {
    let lines: Vec<&str> = block.split('\n').collect();
    if lines.iter().filter(|line| !line.trim().is_empty()).count() < 2 {
        return None;
    }

    // Index line is optional; a non-numeric first line is either the
    // timecode itself or an unusable index in front of it
    let (seq_num, caps, text_start) = match lines[0].trim().parse::<usize>() {
        Ok(index) => match TIMECODE_REGEX.captures(lines[1]) {
            Some(caps) => (index, caps, 2),
            None => (fallback_seq_num, TIMECODE_REGEX.captures(lines[0])?, 1),
        },
        Err(_) => match TIMECODE_REGEX.captures(lines[0]) {
            Some(caps) => (fallback_seq_num, caps, 1),
            None => (fallback_seq_num, TIMECODE_REGEX.captures(lines[1])?, 2),
        },
    };

    // a timecode with out-of-range components drops the block
    let start_ms = Cue::parse_timestamp(&caps[1]).ok()?;
    let end_ms = Cue::parse_timestamp(&caps[2]).ok()?;
    if end_ms < start_ms {
        warn!("Cue {} ends before it starts ({} < {}), treating as zero-length", seq_num, end_ms, start_ms);
    }

    let text = lines[text_start..]
        .iter()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join("\n");
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    Some(Cue::new(seq_num, start_ms, end_ms, text))
}

/// Serialize cues as SRT text, renumbering from 1
pub fn to_srt_string(cues: &[Cue]) -> String {
    let mut out = String::with_capacity(cues.len() * 64);
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&cue.with_seq_num(i + 1).to_string());
    }
    out
}

/// Serialize cues to bytes in the given encoding
pub fn write(cues: &[Cue], kind: EncodingKind) -> Vec<u8> {
    encoding::encode(&to_srt_string(cues), kind)
}

/// Write cues to `path`, creating parent directories as needed
pub fn write_file<P: AsRef<Path>>(path: P, cues: &[Cue], kind: EncodingKind) -> Result<(), SubtitleError> {
    let path = path.as_ref();
    let write_err = |source| SubtitleError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    fs::write(path, write(cues, kind)).map_err(write_err)
}
