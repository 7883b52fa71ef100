//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_ARCHIVE_SUBDIR, DEFAULT_AUDIO_DIR, DEFAULT_CONFIG_DIR, DEFAULT_SEED, DEFAULT_SESSIONS,
    DEFAULT_SUBJECTS, MAX_SESSIONS, MAX_SUBJECTS,
};

/// CLI options for the localizer tooling. Validated values keep the ffmpeg subprocess safe.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "localizer",
    about = "Localizer task tooling: stimulus preparation, trial timing configs, BIDS sidecars",
    author,
    version
)]
pub struct AppConfig {
    /// FFmpeg binary location
    #[arg(
        long,
        env = "LOCALIZER_FFMPEG",
        default_value = defaults::DEFAULT_FFMPEG,
        global = true
    )]
    pub ffmpeg_cmd: String,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "LOCALIZER_LOGS", default_value_t = false, global = true)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(
        long = "no-logs",
        env = "LOCALIZER_NO_LOGS",
        default_value_t = false,
        global = true
    )]
    pub no_logs: bool,

    /// Log per-track conversion times (also enables file logging)
    #[arg(long, global = true)]
    pub log_timings: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Convert the music stimuli to wav, trimming intros and capping length
    PrepareAudio(AudioArgs),

    /// Generate per-subject/per-session trial timing configs
    Timing(TimingArgs),

    /// Write BIDS sidecar descriptions for the task
    Bids(BidsArgs),

    /// Print environment diagnostics and exit
    Doctor(DoctorArgs),

    /// Print the stimulus table with derived output names
    ListTracks,
}

/// Where the mp3 sources live and where converted files and originals go.
#[derive(Debug, Args, Clone)]
pub struct StimulusDirs {
    /// Directory holding the source mp3 files
    #[arg(long, default_value = DEFAULT_AUDIO_DIR, value_hint = ValueHint::DirPath)]
    pub input_dir: PathBuf,

    /// Directory for converted wav files (defaults to the input directory)
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// Directory that receives processed originals (defaults to <input-dir>/original)
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub archive_dir: Option<PathBuf>,
}

impl StimulusDirs {
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.input_dir.clone())
    }

    pub fn resolved_archive_dir(&self) -> PathBuf {
        self.archive_dir
            .clone()
            .unwrap_or_else(|| self.input_dir.join(DEFAULT_ARCHIVE_SUBDIR))
    }
}

#[derive(Debug, Args, Clone)]
pub struct AudioArgs {
    #[command(flatten)]
    pub dirs: StimulusDirs,

    /// Print the ffmpeg command for each track without running it
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Debug, Args, Clone)]
pub struct TimingArgs {
    /// Directory the TSV configs are written to
    #[arg(long, default_value = DEFAULT_CONFIG_DIR, value_hint = ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// Number of subjects (labelled 01..N)
    #[arg(long, default_value_t = DEFAULT_SUBJECTS)]
    pub subjects: u32,

    /// Number of sessions per subject (labelled 01..N)
    #[arg(long, default_value_t = DEFAULT_SESSIONS)]
    pub sessions: u32,

    /// Task design to generate (repeatable)
    #[arg(long = "design", value_enum, default_values_t = [TaskDesign::Detection])]
    pub designs: Vec<TaskDesign>,

    /// Starting seed; each run advances it so the whole set is reproducible
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

#[derive(Debug, Args, Clone)]
pub struct BidsArgs {
    /// Directory the JSON sidecars are written to
    #[arg(long, default_value = ".", value_hint = ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// Task design to describe (repeatable)
    #[arg(
        long = "design",
        value_enum,
        default_values_t = [TaskDesign::Estimation, TaskDesign::Detection]
    )]
    pub designs: Vec<TaskDesign>,
}

#[derive(Debug, Args, Clone)]
pub struct DoctorArgs {
    #[command(flatten)]
    pub dirs: StimulusDirs,
}

/// The two run types of the localizer paradigm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum TaskDesign {
    /// Blocked design for localizing M1/V1/A1
    Detection,
    /// Slow event-related design for HRF estimation
    Estimation,
}

impl TaskDesign {
    /// Name used inside BIDS task labels (`task-primaryDetection`).
    pub fn label(self) -> &'static str {
        match self {
            TaskDesign::Detection => "Detection",
            TaskDesign::Estimation => "Estimation",
        }
    }
}
