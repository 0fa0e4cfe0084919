/*!
 * Tests for file utility functions
 */

use std::fs;
use std::path::Path;
use anyhow::Result;
use dualsub::file_utils::FileManager;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "test_file_exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    // directories are not files
    assert!(!FileManager::file_exists(temp_dir.path()));

    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that generate_output_path creates the correct path
#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let output_path = FileManager::generate_output_path(
        Path::new("/tmp/input/movie.en.srt"),
        Path::new("/tmp/output"),
        "dual",
        "srt",
    );

    assert_eq!(output_path, Path::new("/tmp/output/movie.en.dual.srt"));
}

/// Test directory creation
#[test]
fn test_ensure_dir_withNestedPath_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&nested)?;
    assert!(nested.is_dir());
    // idempotent
    FileManager::ensure_dir(&nested)?;

    Ok(())
}

/// Test video discovery
#[test]
fn test_find_video_files_withMixedFiles_shouldReturnSortedVideos() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let sub_dir = temp_dir.path().join("season1");
    fs::create_dir(&sub_dir)?;

    common::create_test_file(temp_dir.path(), "b.mkv", "")?;
    common::create_test_file(temp_dir.path(), "a.MP4", "")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "")?;
    common::create_test_subtitle(temp_dir.path(), "a.srt")?;
    common::create_test_file(&sub_dir, "e01.avi", "")?;

    let videos = FileManager::find_video_files(temp_dir.path())?;
    let names: Vec<String> = videos
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["a.MP4", "b.mkv", "e01.avi"]);
    Ok(())
}
