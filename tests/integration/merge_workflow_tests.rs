/*!
 * Integration tests for the subtitle merging workflow
 */

use std::fs;
use anyhow::Result;

use dualsub::cue::shift_cues;
use dualsub::encoding::{self, EncodingKind};
use dualsub::merge::{self, MergeMode, MergeOptions};
use dualsub::srt;
use crate::common;

/// Test that we can load two files, merge them and read the result back
#[test]
fn test_merge_workflow_withTwoFiles_shouldProduceBilingualFile() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let english = common::create_test_subtitle(temp_dir.path(), "movie.en.srt")?;
    let french = common::create_test_translation(temp_dir.path(), "movie.fr.srt")?;

    let primary = srt::parse_file(&english)?;
    let secondary = srt::parse_file(&french)?;
    assert_eq!(primary.len(), 3);
    assert_eq!(secondary.len(), 3);

    let merged = merge::merge(&primary, &secondary, &MergeOptions::default());
    let output = temp_dir.path().join("movie.dual.srt");
    srt::write_file(&output, &merged, EncodingKind::Utf8Bom)?;

    let bytes = fs::read(&output)?;
    assert_eq!(encoding::detect_encoding(&bytes), EncodingKind::Utf8Bom);

    let reread = srt::parse_file(&output)?;
    assert_eq!(reread.len(), 3);
    assert_eq!(reread[0].text(), "{\\an8}This is a test subtitle.\nCeci est un sous-titre de test.");
    assert_eq!(reread[1].text(), "{\\an8}It contains multiple entries.\nIl contient plusieurs entrées.");
    assert_eq!((reread[1].start_ms(), reread[1].end_ms()), (5000, 9000));
    assert_eq!(reread[2].text(), "{\\an8}For testing purposes.\nPour les tests.");

    Ok(())
}

/// Test that the restricted modes keep their count guarantees on real files
#[test]
fn test_merge_workflow_withEachMode_shouldRespectModeGuarantees() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let english = common::create_test_subtitle(temp_dir.path(), "en.srt")?;
    let french = common::create_test_translation(temp_dir.path(), "fr.srt")?;
    let primary = srt::parse_file(&english)?;
    // push the last French cue away from any English cue
    let mut secondary = srt::parse_file(&french)?;
    let last = secondary.pop().unwrap();
    secondary.push(last.shifted(60_000));

    let overlapping = merge::merge(&primary, &secondary, &MergeOptions::new(MergeMode::OverlappingOnly, 700)?);
    let priority = merge::merge(&primary, &secondary, &MergeOptions::new(MergeMode::PrimaryPriority, 700)?);
    let all = merge::merge(&primary, &secondary, &MergeOptions::new(MergeMode::AllCues, 700)?);

    assert_eq!(overlapping.len(), 2);
    assert_eq!(priority.len(), 4);
    assert_eq!(all.len(), 4);
    Ok(())
}

/// Test that an offset brings an out-of-sync track back in line
#[test]
fn test_merge_workflow_withOffset_shouldRealignTracks() -> Result<()> {
    let primary = srt::parse("1\n00:00:10,000 --> 00:00:12,000\nHello\n");
    let late = srt::parse("1\n00:00:15,000 --> 00:00:17,000\nBonjour\n");
    let options = MergeOptions::new(MergeMode::OverlappingOnly, 700)?.with_positioning(false);

    assert!(merge::merge(&primary, &late, &options).is_empty());

    let fixed = shift_cues(&late, -5000);
    let merged = merge::merge(&primary, &fixed, &options);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].text(), "Hello\nBonjour");
    Ok(())
}

/// Test a legacy encoded secondary file next to a UTF-16 primary
#[test]
fn test_merge_workflow_withMixedEncodings_shouldDecodeBoth() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let primary_path = temp_dir.path().join("primary.srt");
    let secondary_path = temp_dir.path().join("secondary.srt");
    fs::write(&primary_path, encoding::encode("1\n00:00:01,000 --> 00:00:02,000\nÜber\n", EncodingKind::Utf16Be))?;
    fs::write(&secondary_path, b"1\n00:00:01,000 --> 00:00:02,000\nD\xE9j\xE0\n")?;

    let merged = merge::merge(
        &srt::parse_file(&primary_path)?,
        &srt::parse_file(&secondary_path)?,
        &MergeOptions::default().with_positioning(false),
    );

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].text(), "Über\nDéjà");
    Ok(())
}
