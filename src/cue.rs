use std::fmt;
use anyhow::{Result, Context, anyhow};

// @module: Timed text cue model

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cue {
    // @field: Sequence number, only meaningful for serialization
    seq_num: usize,

    // @field: Start time in ms
    start_ms: u64,

    // @field: End time in ms, never before start_ms
    end_ms: u64,

    // @field: Text lines joined with '\n'
    text: String,
}

impl Cue {
    /// Creates a cue. An end time before the start time is clamped to the
    /// start, so a malformed cue becomes zero-length instead of inverted.
    pub fn new(seq_num: usize, start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Cue {
            seq_num,
            start_ms,
            end_ms: end_ms.max(start_ms),
            text: text.into(),
        }
    }

    pub fn seq_num(&self) -> usize {
        self.seq_num
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> u64 {
        self.end_ms
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_zero_length(&self) -> bool {
        self.end_ms == self.start_ms
    }

    /// Same cue under a different sequence number
    pub fn with_seq_num(&self, seq_num: usize) -> Self {
        Cue {
            seq_num,
            ..self.clone()
        }
    }

    /// Copy of this cue moved by `offset_ms`. Times that would become
    /// negative saturate at zero.
    pub fn shifted(&self, offset_ms: i64) -> Self {
        let shift = |ms: u64| -> u64 {
            if offset_ms >= 0 {
                ms.saturating_add(offset_ms.unsigned_abs())
            } else {
                ms.saturating_sub(offset_ms.unsigned_abs())
            }
        };
        Cue::new(self.seq_num, shift(self.start_ms), shift(self.end_ms), self.text.clone())
    }

    /// Parse an SRT timestamp (`H:MM:SS,mmm`, `.` also accepted) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        hours
            .checked_mul(3_600_000)
            .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1_000 + millis))
            .ok_or_else(|| anyhow!("Timestamp out of range: {}", timestamp))
    }

    /// Format milliseconds as an SRT timestamp (HH:MM:SS,mmm). Hours widen
    /// past two digits when needed.
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_ms)
    }

    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_ms)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Shift every cue of a sequence by `offset_ms`, producing a new sequence
pub fn shift_cues(cues: &[Cue], offset_ms: i64) -> Vec<Cue> {
    if offset_ms == 0 {
        return cues.to_vec();
    }
    cues.iter().map(|cue| cue.shifted(offset_ms)).collect()
}
