/*!
 * Tests for ffprobe output parsing and track selection
 */

use std::path::{Path, PathBuf};
use dualsub::app_config::ExtractionConfig;
use dualsub::errors::ExtractionError;
use dualsub::extractor::{self, Extractor, SubtitleTrack, TrackSelector};

const PROBE_OUTPUT: &str = r#"{
    "streams": [
        { "index": 2, "codec_name": "subrip", "tags": { "language": "eng", "title": "English" } },
        { "index": 3, "codec_name": "hdmv_pgs_subtitle", "tags": { "language": "fre" } },
        { "index": 4, "codec_name": "ass", "tags": { "language": "fre", "title": "Français" } },
        { "index": 5, "codec_name": "mov_text", "tags": { "title": "Spanish (forced)" } }
    ]
}"#;

fn tracks() -> Vec<SubtitleTrack> {
    extractor::parse_probe_output(PROBE_OUTPUT).unwrap()
}

/// Test parsing of ffprobe JSON
#[test]
fn test_parse_probe_output_withStreams_shouldReadTags() {
    let tracks = tracks();
    assert_eq!(tracks.len(), 4);
    assert_eq!(tracks[0].index, 2);
    assert_eq!(tracks[0].codec_name, "subrip");
    assert_eq!(tracks[0].language.as_deref(), Some("eng"));
    assert_eq!(tracks[0].title.as_deref(), Some("English"));
    assert!(tracks[1].is_bitmap());
    assert!(tracks[3].language.is_none());
}

/// Test empty and invalid ffprobe output
#[test]
fn test_parse_probe_output_withEmptyOrInvalidJson_shouldHandleGracefully() {
    assert!(extractor::parse_probe_output("").unwrap().is_empty());
    assert!(extractor::parse_probe_output("{}").unwrap().is_empty());
    assert!(matches!(
        extractor::parse_probe_output("not json"),
        Err(ExtractionError::InvalidProbeOutput(_))
    ));
}

/// Test selector parsing
#[test]
fn test_track_selector_from_str_shouldDistinguishIndexLanguageAndFile() {
    assert_eq!("4".parse::<TrackSelector>().unwrap(), TrackSelector::Index(4));
    assert_eq!("FR".parse::<TrackSelector>().unwrap(), TrackSelector::Language("fr".to_string()));
    assert_eq!("movie.fr.SRT".parse::<TrackSelector>().unwrap(), TrackSelector::File(PathBuf::from("movie.fr.SRT")));
    assert_eq!("subs/fr".parse::<TrackSelector>().unwrap(), TrackSelector::File(PathBuf::from("subs/fr")));
}

/// Test that an external file never resolves to an embedded stream
#[test]
fn test_select_track_withFileSelector_shouldNotMatch() {
    let selector = TrackSelector::File(PathBuf::from("movie.en.srt"));
    assert_eq!(selector.external_file(), Some(Path::new("movie.en.srt")));
    assert!(matches!(
        extractor::select_track(&tracks(), &selector),
        Err(ExtractionError::TrackNotFound(_))
    ));
}

/// Test selection by language across ISO code flavors
#[test]
fn test_select_track_byLanguage_shouldSkipBitmapTracks() {
    let tracks = tracks();

    let en = extractor::select_track(&tracks, &TrackSelector::Language("en".to_string())).unwrap();
    assert_eq!(en.index, 2);

    // "fr" matches both 3 (bitmap) and 4; the text track wins
    let fr = extractor::select_track(&tracks, &TrackSelector::Language("fr".to_string())).unwrap();
    assert_eq!(fr.index, 4);
}

/// Test the title fallback for untagged tracks
#[test]
fn test_select_track_byLanguage_withTitleOnly_shouldMatchLanguageName() {
    let tracks = tracks();
    let es = extractor::select_track(&tracks, &TrackSelector::Language("es".to_string())).unwrap();
    assert_eq!(es.index, 5);
}

/// Test selection by index
#[test]
fn test_select_track_byIndex_shouldValidateTrack() {
    let tracks = tracks();

    assert_eq!(extractor::select_track(&tracks, &TrackSelector::Index(4)).unwrap().index, 4);
    assert!(matches!(
        extractor::select_track(&tracks, &TrackSelector::Index(3)),
        Err(ExtractionError::BitmapTrack { index: 3, .. })
    ));
    assert!(matches!(
        extractor::select_track(&tracks, &TrackSelector::Index(9)),
        Err(ExtractionError::TrackNotFound(_))
    ));
    assert!(matches!(
        extractor::select_track(&tracks, &TrackSelector::Language("de".to_string())),
        Err(ExtractionError::TrackNotFound(_))
    ));
}

/// Test track display used in listings
#[test]
fn test_subtitle_track_display_shouldShowIndexLanguageAndTitle() {
    let tracks = tracks();
    assert_eq!(tracks[0].to_string(), "track 2 (eng, subrip) \"English\"");
    assert_eq!(tracks[1].to_string(), "track 3 (fre, hdmv_pgs_subtitle)");
}

/// Test that listing tracks of a missing video fails before running ffprobe
#[test]
fn test_list_subtitle_tracks_withMissingVideo_shouldFail() {
    let extractor = Extractor::new(&ExtractionConfig::default());
    let result = tokio_test::block_on(extractor.list_subtitle_tracks("no/such/video.mkv"));
    assert!(matches!(result, Err(ExtractionError::VideoNotFound(_))));
}

/// Test that a missing ffmpeg binary is reported as unavailable
#[tokio::test]
async fn test_is_available_withMissingBinary_shouldReturnFalse() {
    let config = ExtractionConfig {
        ffmpeg_path: "dualsub-test-no-such-ffmpeg".to_string(),
        ..ExtractionConfig::default()
    };
    assert!(!Extractor::new(&config).is_available().await);
}
