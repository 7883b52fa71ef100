use super::defaults::{DEFAULT_FFMPEG, MAX_SESSIONS, MAX_SUBJECTS};
use super::{AppConfig, BidsArgs, Command, StimulusDirs, TaskDesign, TimingArgs};
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::{
    fs,
    path::{Path, PathBuf},
};

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize the ffmpeg binary.
    pub fn validate(&mut self) -> Result<()> {
        self.ffmpeg_cmd = resolve_ffmpeg(&self.ffmpeg_cmd)?;

        match &mut self.command {
            Command::PrepareAudio(args) => validate_stimulus_dirs(&args.dirs)?,
            Command::Timing(args) => validate_timing_args(args)?,
            Command::Bids(args) => validate_bids_args(args)?,
            Command::Doctor(args) => validate_stimulus_dirs(&args.dirs)?,
            Command::ListTracks => {}
        }
        Ok(())
    }

    /// Whether file logging should be active for this invocation.
    pub fn logging_enabled(&self) -> bool {
        (self.logs || self.log_timings) && !self.no_logs
    }
}

fn validate_stimulus_dirs(args: &StimulusDirs) -> Result<()> {
    ensure_dir_arg(&args.input_dir, "--input-dir")?;
    if let Some(dir) = &args.output_dir {
        ensure_dir_arg(dir, "--output-dir")?;
    }
    if let Some(dir) = &args.archive_dir {
        ensure_dir_arg(dir, "--archive-dir")?;
    }
    // Archiving into the output directory would mix originals with converted files.
    if args.resolved_archive_dir() == args.resolved_output_dir() {
        bail!("--archive-dir must differ from the output directory");
    }
    // Archiving into the input directory would report every source as already archived.
    if args.resolved_archive_dir() == args.input_dir {
        bail!("--archive-dir must differ from --input-dir");
    }
    Ok(())
}

fn validate_timing_args(args: &mut TimingArgs) -> Result<()> {
    ensure_dir_arg(&args.output_dir, "--output-dir")?;
    if !(1..=MAX_SUBJECTS).contains(&args.subjects) {
        bail!(
            "--subjects must be between 1 and {MAX_SUBJECTS}, got {}",
            args.subjects
        );
    }
    if !(1..=MAX_SESSIONS).contains(&args.sessions) {
        bail!(
            "--sessions must be between 1 and {MAX_SESSIONS}, got {}",
            args.sessions
        );
    }
    normalize_designs(&mut args.designs)
}

fn validate_bids_args(args: &mut BidsArgs) -> Result<()> {
    ensure_dir_arg(&args.output_dir, "--output-dir")?;
    normalize_designs(&mut args.designs)
}

/// Drop repeated `--design` values; an empty list is an error.
pub(super) fn normalize_designs(designs: &mut Vec<TaskDesign>) -> Result<()> {
    if designs.is_empty() {
        bail!("at least one --design is required");
    }
    designs.sort();
    designs.dedup();
    Ok(())
}

pub(super) fn ensure_dir_arg(path: &Path, flag: &str) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("{flag} cannot be empty");
    }
    if path.is_file() {
        bail!("{flag} '{}' is a file, expected a directory", path.display());
    }
    Ok(())
}

/// Accept the bare tool name or a path to an existing executable.
pub(super) fn resolve_ffmpeg(value: &str) -> Result<String> {
    const FLAG: &str = "--ffmpeg-cmd";
    let requested = value.trim();
    if requested.is_empty() {
        bail!("{FLAG} cannot be empty");
    }
    if requested.eq_ignore_ascii_case(DEFAULT_FFMPEG) {
        return Ok(DEFAULT_FFMPEG.to_string());
    }
    let looks_like_path =
        Path::new(requested).is_absolute() || requested.contains(std::path::MAIN_SEPARATOR);
    if !looks_like_path {
        bail!(
            "{FLAG} must be `{DEFAULT_FFMPEG}` or a path to an ffmpeg executable, got '{requested}'"
        );
    }
    let resolved = executable_at(Path::new(requested))
        .with_context(|| format!("{FLAG} '{requested}' is unusable"))?;
    resolved
        .into_os_string()
        .into_string()
        .map_err(|_| anyhow!("{FLAG} must be valid UTF-8"))
}

fn executable_at(path: &Path) -> Result<PathBuf> {
    let resolved = path.canonicalize().context("path does not resolve")?;
    let meta = fs::metadata(&resolved).context("cannot read file metadata")?;
    if !meta.is_file() {
        bail!("{} is not a regular file", resolved.display());
    }
    if !is_executable(&meta) {
        bail!("{} is missing the execute bit", resolved.display());
    }
    Ok(resolved)
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    true
}
