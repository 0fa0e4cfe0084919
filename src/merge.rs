/*!
 * Merge engine combining two cue tracks into one bilingual track.
 *
 * The primary track is rendered on top, the secondary track at the default
 * bottom position. Three policies are available:
 *
 * - `AllCues`: sweep-line union of both tracks over the timeline
 * - `OverlappingOnly`: only primary cues that have a secondary partner
 * - `PrimaryPriority`: every primary cue, plus unmatched secondary cues
 *
 * Every policy uses the same overlap predicate, where the first cue's
 * interval is dilated by the tolerance on both sides and tested against the
 * second cue's untouched interval.
 */

use std::fmt;
use std::str::FromStr;
use anyhow::{anyhow, Result};
use log::{debug, warn};
use crate::cue::Cue;
use crate::errors::MergeOptionsError;

/// Default tolerance window in milliseconds
pub const DEFAULT_TOLERANCE_MS: i64 = 700;

/// Largest accepted tolerance (one hour)
pub const MAX_TOLERANCE_MS: i64 = 3_600_000;

/// Marker asking the renderer to place the text at the top of the screen
pub const UPPER_POSITION_TAG: &str = "{\\an8}";

/// Merge policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MergeMode {
    /// Union of both tracks, split at every cue boundary
    #[default]
    AllCues,
    /// Primary cues that overlap a secondary cue, others dropped
    OverlappingOnly,
    /// Every primary cue, secondary cues fill the gaps
    PrimaryPriority,
}

impl MergeMode {
    /// Short name used on the command line and in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            Self::AllCues => "all",
            Self::OverlappingOnly => "overlapping",
            Self::PrimaryPriority => "primary",
        }
    }

    /// Resolve a user-supplied mode name, falling back to `AllCues` for
    /// empty or unknown names.
    pub fn from_name_lenient(name: &str) -> Self {
        if name.trim().is_empty() {
            return Self::AllCues;
        }
        name.parse().unwrap_or_else(|_| {
            warn!("Unknown merge mode '{}', using '{}'", name, Self::AllCues);
            Self::AllCues
        })
    }

    /// Run this policy over the two tracks
    pub fn merge(&self, primary: &[Cue], secondary: &[Cue], options: &MergeOptions) -> Vec<Cue> {
        match self {
            Self::AllCues => merge_all_cues(primary, secondary, options),
            Self::OverlappingOnly => merge_overlapping_only(primary, secondary, options),
            Self::PrimaryPriority => merge_primary_priority(primary, secondary, options),
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for MergeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" | "allcues" => Ok(Self::AllCues),
            "overlapping" | "overlappingonly" => Ok(Self::OverlappingOnly),
            "primary" | "primarypriority" => Ok(Self::PrimaryPriority),
            _ => Err(anyhow!("Invalid merge mode: {} (expected all, overlapping or primary)", s)),
        }
    }
}

/// Immutable merge configuration. Construct with [`MergeOptions::new`],
/// which validates the tolerance, then refine with the `with_*` methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    mode: MergeMode,
    tolerance_ms: u64,
    primary_color: Option<String>,
    secondary_color: Option<String>,
    use_positioning: bool,
}

impl MergeOptions {
    pub fn new(mode: MergeMode, tolerance_ms: i64) -> Result<Self, MergeOptionsError> {
        if tolerance_ms < 0 {
            return Err(MergeOptionsError::NegativeTolerance(tolerance_ms));
        }
        if tolerance_ms > MAX_TOLERANCE_MS {
            return Err(MergeOptionsError::ToleranceTooLarge {
                value: tolerance_ms,
                max: MAX_TOLERANCE_MS,
            });
        }

        Ok(Self {
            mode,
            tolerance_ms: tolerance_ms.unsigned_abs(),
            ..Self::default()
        })
    }

    /// Color for the primary text; blank values mean no color
    pub fn with_primary_color(self, color: Option<&str>) -> Self {
        Self {
            primary_color: normalize_color(color),
            ..self
        }
    }

    /// Color for the secondary text; blank values mean no color
    pub fn with_secondary_color(self, color: Option<&str>) -> Self {
        Self {
            secondary_color: normalize_color(color),
            ..self
        }
    }

    pub fn with_positioning(self, use_positioning: bool) -> Self {
        Self {
            use_positioning,
            ..self
        }
    }

    pub fn mode(&self) -> MergeMode {
        self.mode
    }

    pub fn tolerance_ms(&self) -> u64 {
        self.tolerance_ms
    }

    pub fn primary_color(&self) -> Option<&str> {
        self.primary_color.as_deref()
    }

    pub fn secondary_color(&self) -> Option<&str> {
        self.secondary_color.as_deref()
    }

    pub fn use_positioning(&self) -> bool {
        self.use_positioning
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            mode: MergeMode::AllCues,
            tolerance_ms: DEFAULT_TOLERANCE_MS.unsigned_abs(),
            primary_color: None,
            secondary_color: None,
            use_positioning: true,
        }
    }
}

fn normalize_color(color: Option<&str>) -> Option<String> {
    color
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Merge two tracks under `options.mode()`. Inputs are not modified; the
/// result is numbered 1..N in time order.
pub fn merge(primary: &[Cue], secondary: &[Cue], options: &MergeOptions) -> Vec<Cue> {
    let merged = options.mode().merge(primary, secondary, options);
    debug!(
        "Merged {} primary and {} secondary cues into {} ({} mode, {} ms tolerance)",
        primary.len(), secondary.len(), merged.len(), options.mode(), options.tolerance_ms()
    );
    merged
}

/// `a` and `b` overlap once `a` is widened by `tolerance_ms` on both sides
pub fn overlaps(a: &Cue, b: &Cue, tolerance_ms: u64) -> bool {
    let tolerance = tolerance_ms as i128;
    let a_start = a.start_ms() as i128 - tolerance;
    let a_end = a.end_ms() as i128 + tolerance;
    let b_start = b.start_ms() as i128;
    let b_end = b.end_ms() as i128;

    a_start < b_end && b_start < a_end
}

// Output cue under construction, numbered once the result is sorted
#[derive(Debug, Clone)]
struct Segment {
    start_ms: u64,
    end_ms: u64,
    text: String,
}

fn finalize(mut segments: Vec<Segment>) -> Vec<Cue> {
    segments.sort_by_key(|s| s.start_ms);
    segments
        .into_iter()
        .enumerate()
        .map(|(i, s)| Cue::new(i + 1, s.start_ms, s.end_ms, s.text))
        .collect()
}

/// Build the two-line text for a pair of cues. `None` when there is nothing
/// to show.
fn compose_text(primary: Option<&Cue>, secondary: Option<&Cue>, options: &MergeOptions) -> Option<String> {
    let primary_text = primary.map(|c| c.text().trim()).filter(|t| !t.is_empty());
    let secondary_text = secondary.map(|c| c.text().trim()).filter(|t| !t.is_empty());

    let mut text = String::new();

    if let Some(p) = primary_text {
        if options.use_positioning() {
            text.push_str(UPPER_POSITION_TAG);
        }
        push_colored(&mut text, p, options.primary_color());
    }

    if primary_text.is_some() && secondary_text.is_some() {
        text.push('\n');
    }

    if let Some(s) = secondary_text {
        push_colored(&mut text, s, options.secondary_color());
    }

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn push_colored(out: &mut String, text: &str, color: Option<&str>) {
    match color {
        Some(color) => {
            out.push_str("<font color=\"");
            out.push_str(color);
            out.push_str("\">");
            out.push_str(text);
            out.push_str("</font>");
        }
        None => out.push_str(text),
    }
}

fn compose(start_ms: u64, end_ms: u64, primary: Option<&Cue>, secondary: Option<&Cue>, options: &MergeOptions) -> Option<Segment> {
    compose_text(primary, secondary, options).map(|text| Segment { start_ms, end_ms, text })
}

// ---------------------------------------------------------------------------
// AllCues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Track {
    Primary,
    Secondary,
}

// Ends sort before starts at the same instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    End,
    Start,
}

#[derive(Debug, Clone, Copy)]
struct Active<'a> {
    id: usize,
    cue: &'a Cue,
}

#[derive(Debug, Clone, Copy)]
struct Event<'a> {
    time_ms: u64,
    kind: EventKind,
    track: Track,
    active: Active<'a>,
}

/// Which cue of each track is on screen during the sweep. A track holds at
/// most one cue; a newer start replaces the older cue.
#[derive(Debug, Clone, Copy)]
enum SweepState<'a> {
    Idle,
    Primary(Active<'a>),
    Secondary(Active<'a>),
    Both(Active<'a>, Active<'a>),
}

impl<'a> SweepState<'a> {
    fn from_parts(primary: Option<Active<'a>>, secondary: Option<Active<'a>>) -> Self {
        match (primary, secondary) {
            (None, None) => Self::Idle,
            (Some(p), None) => Self::Primary(p),
            (None, Some(s)) => Self::Secondary(s),
            (Some(p), Some(s)) => Self::Both(p, s),
        }
    }

    fn primary(&self) -> Option<Active<'a>> {
        match *self {
            Self::Primary(p) | Self::Both(p, _) => Some(p),
            Self::Idle | Self::Secondary(_) => None,
        }
    }

    fn secondary(&self) -> Option<Active<'a>> {
        match *self {
            Self::Secondary(s) | Self::Both(_, s) => Some(s),
            Self::Idle | Self::Primary(_) => None,
        }
    }

    fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    fn apply(self, event: &Event<'a>) -> Self {
        let (mut primary, mut secondary) = (self.primary(), self.secondary());
        let slot = match event.track {
            Track::Primary => &mut primary,
            Track::Secondary => &mut secondary,
        };

        match event.kind {
            EventKind::Start => *slot = Some(event.active),
            // an end only clears the track if that very cue is still shown
            EventKind::End => {
                if slot.is_some_and(|current| current.id == event.active.id) {
                    *slot = None;
                }
            }
        }

        Self::from_parts(primary, secondary)
    }
}

/// Snap near-simultaneous secondary cues onto the primary cue they best
/// match, so that such pairs produce one segment instead of short fringes.
///
/// The partner is the overlapping primary cue whose boundaries are closest
/// to the secondary cue's. Each boundary within the tolerance of the
/// partner's moves onto it; the cue keeps its own times when no partner
/// exists or when snapping would leave it empty.
fn align_secondary(primary: &[Cue], secondary: &[Cue], tolerance_ms: u64) -> Vec<Cue> {
    secondary
        .iter()
        .map(|s| {
            let aligned = best_partner(primary, s, tolerance_ms)
                .map(|p| (
                    snap(s.start_ms(), p.start_ms(), tolerance_ms),
                    snap(s.end_ms(), p.end_ms(), tolerance_ms),
                ))
                .filter(|(start_ms, end_ms)| end_ms > start_ms);

            match aligned {
                Some((start_ms, end_ms)) => Cue::new(s.seq_num(), start_ms, end_ms, s.text()),
                None => s.clone(),
            }
        })
        .collect()
}

fn best_partner<'a>(primary: &'a [Cue], secondary: &Cue, tolerance_ms: u64) -> Option<&'a Cue> {
    primary
        .iter()
        .filter(|p| !p.is_zero_length() && overlaps(p, secondary, tolerance_ms))
        .min_by_key(|p| {
            p.start_ms().abs_diff(secondary.start_ms()) + p.end_ms().abs_diff(secondary.end_ms())
        })
}

fn snap(own_ms: u64, partner_ms: u64, tolerance_ms: u64) -> u64 {
    if own_ms.abs_diff(partner_ms) <= tolerance_ms {
        partner_ms
    } else {
        own_ms
    }
}

fn track_events<'a>(cues: &'a [Cue], track: Track, events: &mut Vec<Event<'a>>) {
    // zero-length cues are never on screen
    for (id, cue) in cues.iter().enumerate().filter(|(_, c)| !c.is_zero_length()) {
        let active = Active { id, cue };
        events.push(Event { time_ms: cue.start_ms(), kind: EventKind::Start, track, active });
        events.push(Event { time_ms: cue.end_ms(), kind: EventKind::End, track, active });
    }
}

fn merge_all_cues(primary: &[Cue], secondary: &[Cue], options: &MergeOptions) -> Vec<Cue> {
    let tolerance_ms = options.tolerance_ms();
    let secondary = align_secondary(primary, secondary, tolerance_ms);

    let mut events = Vec::with_capacity((primary.len() + secondary.len()) * 2);
    track_events(primary, Track::Primary, &mut events);
    track_events(&secondary, Track::Secondary, &mut events);
    events.sort_by_key(|e| (e.time_ms, e.kind));

    let mut segments = Vec::new();
    let mut state = SweepState::Idle;
    let mut segment_start: Option<u64> = None;

    for event in &events {
        if let Some(start_ms) = segment_start {
            if !state.is_idle() && event.time_ms > start_ms {
                let p = state.primary().map(|a| a.cue);
                let s = state.secondary().map(|a| a.cue);
                segments.extend(compose(start_ms, event.time_ms, p, s, options));
            }
        }

        state = state.apply(event);
        segment_start = Some(event.time_ms);
    }

    let before = segments.len();
    let segments = coalesce_adjacent(segments, tolerance_ms);
    debug!("Sweep produced {} segments, {} after coalescing", before, segments.len());

    finalize(segments)
}

/// Join neighbouring segments with identical text whose gap is within the
/// tolerance. Text comparison is exact.
fn coalesce_adjacent(segments: Vec<Segment>, tolerance_ms: u64) -> Vec<Segment> {
    let mut result: Vec<Segment> = Vec::with_capacity(segments.len());

    for next in segments {
        if let Some(current) = result.last_mut() {
            if current.text == next.text && current.end_ms.abs_diff(next.start_ms) <= tolerance_ms {
                current.end_ms = current.end_ms.max(next.end_ms);
                continue;
            }
        }
        result.push(next);
    }

    result
}

// ---------------------------------------------------------------------------
// OverlappingOnly / PrimaryPriority
// ---------------------------------------------------------------------------

fn first_overlapping<'a>(cue: &Cue, others: &'a [Cue], tolerance_ms: u64) -> Option<&'a Cue> {
    others.iter().find(|other| overlaps(cue, other, tolerance_ms))
}

fn merge_overlapping_only(primary: &[Cue], secondary: &[Cue], options: &MergeOptions) -> Vec<Cue> {
    let segments = primary
        .iter()
        .filter_map(|p| {
            let s = first_overlapping(p, secondary, options.tolerance_ms())?;
            let start_ms = p.start_ms().min(s.start_ms());
            let end_ms = p.end_ms().max(s.end_ms());
            compose(start_ms, end_ms, Some(p), Some(s), options)
        })
        .collect();

    finalize(segments)
}

fn merge_primary_priority(primary: &[Cue], secondary: &[Cue], options: &MergeOptions) -> Vec<Cue> {
    let tolerance_ms = options.tolerance_ms();
    let mut segments = Vec::with_capacity(primary.len() + secondary.len());

    for p in primary {
        match first_overlapping(p, secondary, tolerance_ms) {
            Some(s) => segments.extend(compose(p.start_ms(), p.end_ms(), Some(p), Some(s), options)),
            None => {
                let text = p.text().trim();
                if text.is_empty() {
                    continue;
                }
                let text = if options.use_positioning() {
                    format!("{}{}", UPPER_POSITION_TAG, text)
                } else {
                    text.to_string()
                };
                segments.push(Segment { start_ms: p.start_ms(), end_ms: p.end_ms(), text });
            }
        }
    }

    // unmatched secondary cues are shown as they are, blank ones not at all
    let unmatched = secondary
        .iter()
        .filter(|s| !s.text().trim().is_empty())
        .filter(|s| !primary.iter().any(|p| overlaps(p, s, tolerance_ms)));
    for s in unmatched {
        segments.push(Segment {
            start_ms: s.start_ms(),
            end_ms: s.end_ms(),
            text: s.text().trim().to_string(),
        });
    }

    finalize(segments)
}
