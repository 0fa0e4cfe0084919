use anyhow::{Result, Context, anyhow};
use log::{error, warn, info, debug};
use std::path::{Path, PathBuf};
use crate::app_config::Config;
use crate::cue::{self, Cue};
use crate::encoding::EncodingKind;
use crate::extractor::{self, Extractor, SubtitleTrack, TrackSelector};
use crate::file_utils::FileManager;
use crate::merge;
use crate::srt;

// @module: Application controller for subtitle merging

/// Outcome of a completed merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// File the merged track was written to
    pub output_path: PathBuf,
    /// Number of cues in the merged track
    pub cue_count: usize,
    /// Cues parsed from the primary input
    pub primary_cues: usize,
    /// Cues parsed from the secondary input
    pub secondary_cues: usize,
}

/// Main application controller: wires file I/O, offsets and options around
/// the merge engine
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: ffmpeg/ffprobe runner
    extractor: Extractor,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        let extractor = Extractor::new(&config.extraction);

        Ok(Self {
            config,
            extractor,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Apply the configured offsets and merge two in-memory tracks
    pub fn merge_cues(&self, primary: &[Cue], secondary: &[Cue]) -> Result<Vec<Cue>> {
        let options = self.config.merge.to_merge_options()?;
        let primary = cue::shift_cues(primary, self.config.offsets.primary_ms);
        let secondary = cue::shift_cues(secondary, self.config.offsets.secondary_ms);

        Ok(merge::merge(&primary, &secondary, &options))
    }

    /// Merge two subtitle files into `output_path`.
    ///
    /// Returns `None` when the output already exists and `force_overwrite`
    /// is not set.
    pub fn merge_files<P1, P2, P3>(&self, primary_path: P1, secondary_path: P2, output_path: P3, force_overwrite: bool) -> Result<Option<MergeReport>>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        P3: AsRef<Path>,
    {
        let output_path = output_path.as_ref();
        if output_path.exists() && !force_overwrite {
            warn!("Skipping, output already exists: {:?} (use -f to force overwrite)", output_path);
            return Ok(None);
        }

        let primary = srt::parse_file(primary_path.as_ref())?;
        let secondary = srt::parse_file(secondary_path.as_ref())?;
        debug!("Parsed {} primary and {} secondary cues", primary.len(), secondary.len());

        if primary.is_empty() && secondary.is_empty() {
            warn!("Neither input contains any subtitle cue");
        }

        let merged = self.merge_cues(&primary, &secondary)?;
        srt::write_file(output_path, &merged, EncodingKind::Utf8Bom)?;

        info!("Merged {} cues into {:?}", merged.len(), output_path);

        Ok(Some(MergeReport {
            output_path: output_path.to_path_buf(),
            cue_count: merged.len(),
            primary_cues: primary.len(),
            secondary_cues: secondary.len(),
        }))
    }

    /// List subtitle tracks of a video
    pub async fn list_tracks<P: AsRef<Path>>(&self, video_path: P) -> Result<Vec<SubtitleTrack>> {
        let tracks = self.extractor.list_subtitle_tracks(video_path.as_ref()).await?;
        Ok(tracks)
    }

    /// Output path for a merged track next to (or below `output_dir`) a video
    pub fn output_path_for(&self, video_path: &Path, output_dir: Option<&Path>) -> PathBuf {
        let dir = output_dir
            .map(Path::to_path_buf)
            .or_else(|| video_path.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        FileManager::generate_output_path(video_path, dir, &self.config.extraction.output_suffix, "srt")
    }

    /// Merge two subtitle tracks of a video. Each side is an embedded stream
    /// or an external SRT file.
    pub async fn merge_video<P: AsRef<Path>>(
        &self,
        video_path: P,
        primary: &TrackSelector,
        secondary: &TrackSelector,
        output_dir: Option<&Path>,
        force_overwrite: bool,
    ) -> Result<Option<MergeReport>> {
        let video_path = video_path.as_ref();
        if !video_path.is_file() {
            return Err(anyhow!("Video file does not exist: {:?}", video_path));
        }

        let output_path = self.output_path_for(video_path, output_dir);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, merged subtitle already exists (use -f to force overwrite)", video_path);
            return Ok(None);
        }

        for path in [primary.external_file(), secondary.external_file()].into_iter().flatten() {
            if !path.is_file() {
                return Err(anyhow!("Subtitle file does not exist: {:?}", path));
            }
        }

        // ffmpeg is only needed when one side comes from the container
        let tracks = if primary.external_file().is_none() || secondary.external_file().is_none() {
            if !self.extractor.is_available().await {
                return Err(anyhow!(
                    "ffmpeg is not available at '{}'. Install it or set extraction.ffmpeg_path",
                    self.config.extraction.ffmpeg_path
                ));
            }
            let tracks = self.list_tracks(video_path).await?;
            if tracks.is_empty() {
                return Err(anyhow!("No subtitle tracks found in {:?}", video_path));
            }
            tracks
        } else {
            Vec::new()
        };

        let primary_track = Self::embedded_track(&tracks, primary, "primary")?;
        let secondary_track = Self::embedded_track(&tracks, secondary, "secondary")?;
        info!(
            "Merging {} (top) with {} (bottom)",
            primary_track.map_or_else(|| primary.to_string(), ToString::to_string),
            secondary_track.map_or_else(|| secondary.to_string(), ToString::to_string),
        );

        // Extracted tracks live only as long as this directory; external
        // files are read in place
        let temp_dir = tempfile::Builder::new()
            .prefix("dualsub")
            .tempdir()
            .context("Failed to create temporary directory")?;
        let primary_path = self.track_file(video_path, primary, primary_track, temp_dir.path()).await
            .context("Failed to extract primary track")?;
        let secondary_path = self.track_file(video_path, secondary, secondary_track, temp_dir.path()).await
            .context("Failed to extract secondary track")?;

        if let Some(dir) = output_dir {
            FileManager::ensure_dir(dir)?;
        }

        self.merge_files(&primary_path, &secondary_path, &output_path, true)
    }

    /// Embedded stream chosen by `selector`; `None` for an external file
    fn embedded_track<'a>(tracks: &'a [SubtitleTrack], selector: &TrackSelector, role: &str) -> Result<Option<&'a SubtitleTrack>> {
        if selector.external_file().is_some() {
            return Ok(None);
        }
        let track = extractor::select_track(tracks, selector)
            .with_context(|| format!("Cannot use {} {}", role, selector))?;
        Ok(Some(track))
    }

    /// SRT file holding one side of a video merge
    async fn track_file(&self, video_path: &Path, selector: &TrackSelector, track: Option<&SubtitleTrack>, work_dir: &Path) -> Result<PathBuf> {
        let Some(track) = track else {
            return selector.external_file()
                .map(Path::to_path_buf)
                .ok_or_else(|| anyhow!("No source for {}", selector));
        };

        let path = work_dir.join(format!("track{}.srt", track.index));
        // both sides may name the same stream
        if !path.exists() {
            self.extractor.extract_track(video_path, track, &path).await?;
        }
        Ok(path)
    }

    /// Run [`Controller::merge_video`] on every video below `input_dir`.
    /// Failures are logged and do not stop the batch; returns the number of
    /// merged files.
    pub async fn merge_video_folder<P: AsRef<Path>>(
        &self,
        input_dir: P,
        primary: &TrackSelector,
        secondary: &TrackSelector,
        output_dir: Option<&Path>,
        force_overwrite: bool,
    ) -> Result<usize> {
        let input_dir = input_dir.as_ref();
        info!("Starting subtitle merge for directory: {:?}", input_dir);

        let videos = FileManager::find_video_files(input_dir)?;
        let mut merged_count = 0;

        for video in &videos {
            info!("Processing video: {:?}", video);
            match self.merge_video(video, primary, secondary, output_dir, force_overwrite).await {
                Ok(Some(report)) => {
                    debug!("{:?}: {} cues", report.output_path, report.cue_count);
                    merged_count += 1;
                }
                Ok(None) => {}
                Err(e) => error!("Error processing {:?}: {:#}", video, e),
            }
        }

        info!("Finished processing {} of {} videos", merged_count, videos.len());

        Ok(merged_count)
    }
}
