// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use log::{info, warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Args, Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use dualsub::app_config::{self, Config};
use dualsub::app_controller::Controller;
use dualsub::extractor::TrackSelector;
use dualsub::file_utils::FileManager;
use dualsub::merge::MergeMode;

/// CLI Wrapper for MergeMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliMergeMode {
    All,
    Overlapping,
    Primary,
}

impl From<CliMergeMode> for MergeMode {
    fn from(cli_mode: CliMergeMode) -> Self {
        match cli_mode {
            CliMergeMode::All => MergeMode::AllCues,
            CliMergeMode::Overlapping => MergeMode::OverlappingOnly,
            CliMergeMode::Primary => MergeMode::PrimaryPriority,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Options shared by every command that reads the configuration
#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "dualsub.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Merge policy overrides
#[derive(Args, Debug, Clone)]
struct MergeArgs {
    /// Merge mode
    #[arg(short, long, value_enum)]
    mode: Option<CliMergeMode>,

    /// Tolerance window in milliseconds
    #[arg(short, long, allow_negative_numbers = true)]
    tolerance_ms: Option<i64>,

    /// Font color of the primary (top) track, e.g. '#ffff00'
    #[arg(long)]
    primary_color: Option<String>,

    /// Font color of the secondary (bottom) track
    #[arg(long)]
    secondary_color: Option<String>,

    /// Do not move the primary track to the top of the screen
    #[arg(long)]
    no_position: bool,

    /// Shift the primary track by this many milliseconds
    #[arg(long, allow_negative_numbers = true)]
    primary_offset_ms: Option<i64>,

    /// Shift the secondary track by this many milliseconds
    #[arg(long, allow_negative_numbers = true)]
    secondary_offset_ms: Option<i64>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge two SRT files into one bilingual SRT file
    Merge {
        /// Subtitle shown at the top
        #[arg(value_name = "PRIMARY")]
        primary: PathBuf,

        /// Subtitle shown at the bottom
        #[arg(value_name = "SECONDARY")]
        secondary: PathBuf,

        /// Output file (default: <PRIMARY stem>.dual.srt next to PRIMARY)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        merge: MergeArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Merge two subtitle tracks of a video (or of every video in a
    /// directory); each side is an embedded track or an external SRT file
    Video {
        /// Input video file or directory to process
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// Primary track: stream index, language code or path to an .srt file
        #[arg(short, long)]
        primary: TrackSelector,

        /// Secondary track: stream index, language code or path to an .srt file
        #[arg(short, long)]
        secondary: TrackSelector,

        /// Output directory (default: next to each video)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        merge: MergeArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// List the subtitle tracks of a video
    Tracks {
        /// Video file to inspect
        #[arg(value_name = "VIDEO")]
        video: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate shell completions for dualsub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// dualsub - bilingual subtitle merger
///
/// Combines two subtitle tracks of the same video into a single
/// time-synchronized track, one language on top and one at the bottom.
#[derive(Parser, Debug)]
#[command(name = "dualsub")]
#[command(version)]
#[command(about = "Merge two subtitle tracks into one bilingual subtitle")]
#[command(long_about = "dualsub merges two subtitle tracks into a single bilingual SRT file.

EXAMPLES:
    dualsub merge movie.en.srt movie.fr.srt                # Writes movie.en.dual.srt
    dualsub merge a.srt b.srt -o out.srt -m primary        # Keep every primary cue
    dualsub merge a.srt b.srt --secondary-offset-ms -1500  # Show b.srt 1.5s earlier
    dualsub video movie.mkv -p en -s fr                    # Merge embedded tracks
    dualsub video /movies/ -p 2 -s 3                       # Whole directory by stream index
    dualsub video movie.mkv -p en -s movie.fr.srt          # Embedded track with an external file
    dualsub tracks movie.mkv                               # List subtitle streams
    dualsub completions bash > dualsub.bash                # Generate bash completions

MERGE MODES:
    all         - Every cue of both tracks, split where either track changes (default)
    overlapping - Only primary cues that have a secondary cue at the same time
    primary     - Every primary cue; secondary cues fill the gaps

CONFIGURATION:
    Configuration is stored in dualsub.json by default. If the file doesn't
    exist, a default one is created. Command line flags override it.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger; the effective level is log::max_level()
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, tag) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                color, now, tag, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info by default; the level is updated once the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "dualsub", &mut std::io::stdout());
            Ok(())
        }
        Commands::Merge { primary, secondary, output, merge, common } => {
            let config = load_config(&common, Some(&merge))?;
            run_merge(config, &primary, &secondary, output, merge.force_overwrite)
        }
        Commands::Video { input_path, primary, secondary, output_dir, merge, common } => {
            let config = load_config(&common, Some(&merge))?;
            run_video(config, &input_path, &primary, &secondary, output_dir.as_deref(), merge.force_overwrite).await
        }
        Commands::Tracks { video, common } => {
            let config = load_config(&common, None)?;
            run_tracks(config, &video).await
        }
    }
}

/// Load (or create) the configuration and apply command line overrides
fn load_config(common: &CommonArgs, merge_args: Option<&MergeArgs>) -> Result<Config> {
    // A command line log level applies immediately
    if let Some(cmd_log_level) = &common.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config_path = Path::new(&common.config_path);
    let mut config = if config_path.exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", common.config_path);
        let config = Config::default();
        config.save(config_path)?;
        config
    };

    if let Some(args) = merge_args {
        if let Some(mode) = &args.mode {
            config.merge.mode = MergeMode::from(mode.clone()).name().to_string();
        }
        if let Some(tolerance_ms) = args.tolerance_ms {
            config.merge.tolerance_ms = tolerance_ms;
        }
        if args.primary_color.is_some() {
            config.merge.primary_color = args.primary_color.clone();
        }
        if args.secondary_color.is_some() {
            config.merge.secondary_color = args.secondary_color.clone();
        }
        if args.no_position {
            config.merge.use_positioning = false;
        }
        if let Some(offset) = args.primary_offset_ms {
            config.offsets.primary_ms = offset;
        }
        if let Some(offset) = args.secondary_offset_ms {
            config.offsets.secondary_ms = offset;
        }
    }

    if let Some(log_level) = &common.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(config.log_level.to_level_filter());
    }

    Ok(config)
}

fn run_merge(config: Config, primary: &Path, secondary: &Path, output: Option<PathBuf>, force_overwrite: bool) -> Result<()> {
    if !FileManager::file_exists(primary) {
        return Err(anyhow!("Primary subtitle does not exist: {:?}", primary));
    }
    if !FileManager::file_exists(secondary) {
        return Err(anyhow!("Secondary subtitle does not exist: {:?}", secondary));
    }

    let controller = Controller::with_config(config)?;
    let output = output.unwrap_or_else(|| {
        let dir = primary.parent().unwrap_or(Path::new("."));
        FileManager::generate_output_path(primary, dir, &controller.config().extraction.output_suffix, "srt")
    });

    if let Some(report) = controller.merge_files(primary, secondary, &output, force_overwrite)? {
        info!("Success: {:?} ({} cues)", report.output_path, report.cue_count);
    }

    Ok(())
}

async fn run_video(
    config: Config,
    input_path: &Path,
    primary: &TrackSelector,
    secondary: &TrackSelector,
    output_dir: Option<&Path>,
    force_overwrite: bool,
) -> Result<()> {
    let controller = Controller::with_config(config)?;

    if input_path.is_file() {
        if let Some(report) = controller.merge_video(input_path, primary, secondary, output_dir, force_overwrite).await? {
            info!("Success: {:?} ({} cues)", report.output_path, report.cue_count);
        }
    } else if input_path.is_dir() {
        controller.merge_video_folder(input_path, primary, secondary, output_dir, force_overwrite).await?;
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}

async fn run_tracks(config: Config, video: &Path) -> Result<()> {
    let controller = Controller::with_config(config)?;
    let tracks = controller.list_tracks(video).await?;

    if tracks.is_empty() {
        warn!("No subtitle tracks found in file: {:?}", video);
        return Ok(());
    }

    for track in &tracks {
        let note = if track.is_bitmap() { " [bitmap, cannot merge]" } else { "" };
        println!("{}{}", track, note);
    }

    Ok(())
}
