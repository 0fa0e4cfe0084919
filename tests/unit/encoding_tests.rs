/*!
 * Tests for character encoding detection and decoding
 */

use dualsub::encoding::{self, EncodingKind};

/// Test BOM-based detection
#[test]
fn test_detect_encoding_withBoms_shouldUseBom() {
    assert_eq!(encoding::detect_encoding(b"\xEF\xBB\xBFhello"), EncodingKind::Utf8Bom);
    assert_eq!(encoding::detect_encoding(b"\xFF\xFEh\x00"), EncodingKind::Utf16Le);
    assert_eq!(encoding::detect_encoding(b"\xFE\xFF\x00h"), EncodingKind::Utf16Be);
}

/// Test that a UTF-8 BOM wins even if the rest is not valid UTF-8
#[test]
fn test_detect_encoding_withUtf8BomAndInvalidBody_shouldStillBeUtf8() {
    assert_eq!(encoding::detect_encoding(b"\xEF\xBB\xBF\xE9t\xE9"), EncodingKind::Utf8Bom);
}

/// Test that plain ASCII is UTF-8
#[test]
fn test_detect_encoding_withAscii_shouldBeUtf8() {
    assert_eq!(encoding::detect_encoding(b"1\n00:00:01,000 --> 00:00:02,000\nHi\n"), EncodingKind::Utf8);
    assert_eq!(encoding::detect_encoding(b""), EncodingKind::Utf8);
}

/// Test that valid multi-byte UTF-8 without BOM is detected
#[test]
fn test_detect_encoding_withMultibyteUtf8_shouldBeUtf8() {
    assert_eq!(encoding::detect_encoding("Ça va, déjà vu".as_bytes()), EncodingKind::Utf8);
}

/// Test the legacy fallback on Latin-1 style bytes
#[test]
fn test_detect_encoding_withLatin1Bytes_shouldFallBackToWindows1252() {
    let bytes = b"Caf\xE9 cr\xE8me";
    assert_eq!(encoding::detect_encoding(bytes), EncodingKind::Windows1252);

    let (text, kind) = encoding::decode_auto(bytes);
    assert_eq!(kind, EncodingKind::Windows1252);
    assert_eq!(text, "Café crème");
}

/// Test that detection never panics on arbitrary bytes
#[test]
fn test_detect_encoding_withEveryByteValue_shouldAlwaysDecode() {
    let bytes: Vec<u8> = (0..=255u8).collect();
    let (text, _) = encoding::decode_auto(&bytes);
    assert!(!text.is_empty());

    for b in 0..=255u8 {
        let _ = encoding::decode_auto(&[b, b, 0x80]);
    }
}

/// Test that a Windows-1252 specific character (euro sign) decodes correctly
#[test]
fn test_decode_windows1252_withEuroSign_shouldMapToUnicode() {
    assert_eq!(encoding::decode(b"5 \x80", EncodingKind::Windows1252), "5 €");
}

/// Test encoding round trips through each supported encoding
#[test]
fn test_encode_then_decode_auto_shouldPreserveText() {
    let text = "Bonjour, ça va ?";
    for kind in [EncodingKind::Utf8Bom, EncodingKind::Utf16Le, EncodingKind::Utf16Be, EncodingKind::Utf8, EncodingKind::Windows1252] {
        let bytes = encoding::encode(text, kind);
        let (decoded, detected) = encoding::decode_auto(&bytes);
        assert_eq!(decoded, text, "encoding {}", kind);
        assert_eq!(detected, kind);
    }
}

/// Test that the default output encoding is UTF-8 with BOM
#[test]
fn test_default_encoding_shouldBeUtf8Bom() {
    assert_eq!(EncodingKind::default(), EncodingKind::Utf8Bom);
    assert_eq!(EncodingKind::default().bom(), &[0xEF, 0xBB, 0xBF]);
}
