use super::{render_command_line, run_transcoder, transcode_args, StimulusTrack};
use crate::config::{AppConfig, AudioArgs};
use crate::log_debug;
use anyhow::{bail, Context, Result};
use std::{
    fmt::Write as _,
    fs, io,
    path::{Path, PathBuf},
    time::Instant,
};

/// Resolved locations and tool for one preparation batch.
#[derive(Debug, Clone)]
pub struct PrepareOptions {
    pub ffmpeg_cmd: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub dry_run: bool,
    /// Record per-track wall time in the debug log and trace events.
    pub log_timings: bool,
}

impl PrepareOptions {
    pub fn from_config(config: &AppConfig, args: &AudioArgs) -> Self {
        Self {
            ffmpeg_cmd: config.ffmpeg_cmd.clone(),
            input_dir: args.dirs.input_dir.clone(),
            output_dir: args.dirs.resolved_output_dir(),
            archive_dir: args.dirs.resolved_archive_dir(),
            dry_run: args.dry_run,
            log_timings: config.log_timings,
        }
    }
}

#[derive(Debug)]
pub enum TrackOutcome {
    /// The wav was written and the mp3 moved to `archived`.
    Converted { output: PathBuf, archived: PathBuf },
    /// Dry run: the command that would have run.
    Planned { command: String },
    Failed(anyhow::Error),
}

#[derive(Debug)]
pub struct TrackReport {
    pub title: &'static str,
    pub outcome: TrackOutcome,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub tracks: Vec<TrackReport>,
}

impl BatchReport {
    pub fn failed_count(&self) -> usize {
        self.tracks
            .iter()
            .filter(|report| matches!(report.outcome, TrackOutcome::Failed(_)))
            .count()
    }

    pub fn converted_count(&self) -> usize {
        self.tracks
            .iter()
            .filter(|report| matches!(report.outcome, TrackOutcome::Converted { .. }))
            .count()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for report in &self.tracks {
            let _ = match &report.outcome {
                TrackOutcome::Converted { output, .. } => {
                    writeln!(out, "ok      {} -> {}", report.title, output.display())
                }
                TrackOutcome::Planned { command } => writeln!(out, "plan    {command}"),
                TrackOutcome::Failed(err) => writeln!(out, "FAILED  {}: {err:#}", report.title),
            };
        }
        let _ = write!(
            out,
            "{} converted, {} failed, {} total",
            self.converted_count(),
            self.failed_count(),
            self.tracks.len()
        );
        out
    }
}

/// Convert one track and archive its source. Nothing is moved unless ffmpeg succeeded.
pub fn prepare_track(opts: &PrepareOptions, track: &StimulusTrack) -> Result<TrackOutcome> {
    let source = opts.input_dir.join(track.source_file_name());
    let output = opts.output_dir.join(track.output_file_name());
    let archived = opts.archive_dir.join(track.source_file_name());
    let args = transcode_args(track, &source, &output);

    if opts.dry_run {
        return Ok(TrackOutcome::Planned {
            command: render_command_line(&opts.ffmpeg_cmd, &args),
        });
    }

    if !source.is_file() {
        bail!("source file '{}' not found", source.display());
    }
    if archived.exists() {
        bail!(
            "'{}' is already archived; refusing to overwrite it",
            archived.display()
        );
    }
    fs::create_dir_all(&opts.output_dir).with_context(|| {
        format!(
            "failed to create output directory '{}'",
            opts.output_dir.display()
        )
    })?;

    log_debug(&format!(
        "prepare-audio: {}",
        render_command_line(&opts.ffmpeg_cmd, &args)
    ));
    run_transcoder(&opts.ffmpeg_cmd, &args)?;

    fs::create_dir_all(&opts.archive_dir).with_context(|| {
        format!(
            "failed to create archive directory '{}'",
            opts.archive_dir.display()
        )
    })?;
    move_file(&source, &archived)?;

    Ok(TrackOutcome::Converted { output, archived })
}

/// Process every track in order, recording failures instead of stopping.
pub fn prepare_all(opts: &PrepareOptions, tracks: &[StimulusTrack]) -> BatchReport {
    let span = tracing::info_span!("prepare_audio", dry_run = opts.dry_run);
    let _entered = span.enter();

    let mut report = BatchReport::default();
    for track in tracks {
        let started = Instant::now();
        let outcome = match prepare_track(opts, track) {
            Ok(outcome) => outcome,
            Err(err) => TrackOutcome::Failed(err),
        };
        let elapsed_ms = opts
            .log_timings
            .then(|| started.elapsed().as_millis() as u64);
        match &outcome {
            TrackOutcome::Converted { output, .. } => {
                tracing::info!(track = track.title, elapsed_ms, output = %output.display(), "converted");
                log_debug(&converted_log_line(track.title, elapsed_ms));
            }
            TrackOutcome::Planned { .. } => {
                tracing::debug!(track = track.title, "planned");
            }
            TrackOutcome::Failed(err) => {
                tracing::warn!(track = track.title, error = %format!("{err:#}"), "conversion failed");
                log_debug(&format!("prepare-audio: {} failed: {err:#}", track.title));
            }
        }
        report.tracks.push(TrackReport {
            title: track.title,
            outcome,
        });
    }
    report
}

pub(super) fn converted_log_line(title: &str, elapsed_ms: Option<u64>) -> String {
    match elapsed_ms {
        Some(ms) => format!("prepare-audio: converted {title} in {ms}ms"),
        None => format!("prepare-audio: converted {title}"),
    }
}

/// Rename, falling back to copy + remove when the archive sits on another filesystem.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => copy_then_remove(from, to, rename_err, |path| fs::remove_file(path)),
    }
}

/// Copy `from` to `to`, then remove `from`. If the removal fails the copy is
/// deleted again so the source never exists in both places.
pub(super) fn copy_then_remove(
    from: &Path,
    to: &Path,
    rename_err: io::Error,
    remove: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<()> {
    if let Err(copy_err) = fs::copy(from, to) {
        bail!(
            "failed to move '{}' to '{}': {rename_err}; copy fallback failed: {copy_err}",
            from.display(),
            to.display()
        );
    }
    if let Err(remove_err) = remove(from) {
        let _ = fs::remove_file(to);
        bail!(
            "copied '{}' but could not remove it ({remove_err}); archive copy rolled back",
            from.display()
        );
    }
    Ok(())
}
