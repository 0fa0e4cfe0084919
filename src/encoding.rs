/*!
 * Character encoding detection for subtitle files.
 *
 * Subtitle files in the wild come in UTF-8 (with or without BOM), UTF-16 and
 * legacy Western code pages. Detection checks byte order marks first, then
 * validates the whole buffer as UTF-8, and otherwise falls back to
 * Windows-1252, which maps every byte and therefore always succeeds.
 */

use std::fmt;
use log::debug;
use encoding_rs::{UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Text encoding selected for a subtitle buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncodingKind {
    /// UTF-8 prefixed with EF BB BF
    #[default]
    Utf8Bom,
    /// UTF-16 little-endian (FF FE)
    Utf16Le,
    /// UTF-16 big-endian (FE FF)
    Utf16Be,
    /// UTF-8 without byte order mark
    Utf8,
    /// Windows-1252 (ANSI Western), the fallback
    Windows1252,
}

impl EncodingKind {
    /// Byte order mark written for this encoding, empty when there is none
    pub const fn bom(self) -> &'static [u8] {
        match self {
            Self::Utf8Bom => UTF8_BOM,
            Self::Utf16Le => UTF16_LE_BOM,
            Self::Utf16Be => UTF16_BE_BOM,
            Self::Utf8 | Self::Windows1252 => &[],
        }
    }

    /// Canonical encoding name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8Bom => "UTF-8 (BOM)",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf8 => "UTF-8",
            Self::Windows1252 => "Windows-1252",
        }
    }
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Select the decoding for a raw subtitle buffer. Never fails.
pub fn detect_encoding(bytes: &[u8]) -> EncodingKind {
    // BOMs are checked in priority order
    if bytes.starts_with(UTF8_BOM) {
        return EncodingKind::Utf8Bom;
    }
    if bytes.starts_with(UTF16_LE_BOM) {
        return EncodingKind::Utf16Le;
    }
    if bytes.starts_with(UTF16_BE_BOM) {
        return EncodingKind::Utf16Be;
    }

    if is_valid_utf8(bytes) {
        EncodingKind::Utf8
    } else {
        EncodingKind::Windows1252
    }
}

/// Full-buffer UTF-8 validation. Overlong forms, surrogates and sequences
/// truncated at the end of the buffer are rejected.
pub fn is_valid_utf8(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes).is_ok()
}

/// Decode `bytes` as `kind`. A leading BOM matching the encoding is removed;
/// invalid sequences become U+FFFD rather than failing.
pub fn decode(bytes: &[u8], kind: EncodingKind) -> String {
    let body = match kind {
        EncodingKind::Utf8Bom | EncodingKind::Utf8 => bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes),
        EncodingKind::Utf16Le => bytes.strip_prefix(UTF16_LE_BOM).unwrap_or(bytes),
        EncodingKind::Utf16Be => bytes.strip_prefix(UTF16_BE_BOM).unwrap_or(bytes),
        EncodingKind::Windows1252 => bytes,
    };

    let encoding = match kind {
        EncodingKind::Utf8Bom | EncodingKind::Utf8 => UTF_8,
        EncodingKind::Utf16Le => UTF_16LE,
        EncodingKind::Utf16Be => UTF_16BE,
        EncodingKind::Windows1252 => WINDOWS_1252,
    };

    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        debug!("Replaced malformed {} sequences while decoding", kind);
    }
    text.into_owned()
}

/// Detect and decode in one step
pub fn decode_auto(bytes: &[u8]) -> (String, EncodingKind) {
    let kind = detect_encoding(bytes);
    (decode(bytes, kind), kind)
}

/// Encode `text` as `kind`, prefixed with the encoding's BOM if it has one.
/// Characters that Windows-1252 cannot represent become numeric character
/// references.
pub fn encode(text: &str, kind: EncodingKind) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 3);
    out.extend_from_slice(kind.bom());

    match kind {
        EncodingKind::Utf8Bom | EncodingKind::Utf8 => out.extend_from_slice(text.as_bytes()),
        EncodingKind::Utf16Le => {
            for unit in text.encode_utf16() {
                out.extend_from_slice(&unit.to_le_bytes());
            }
        }
        EncodingKind::Utf16Be => {
            for unit in text.encode_utf16() {
                out.extend_from_slice(&unit.to_be_bytes());
            }
        }
        EncodingKind::Windows1252 => {
            let (bytes, _, _) = WINDOWS_1252.encode(text);
            out.extend_from_slice(&bytes);
        }
    }

    out
}
