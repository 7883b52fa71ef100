use super::StimulusTrack;
use anyhow::{bail, Context, Result};
use std::{
    ffi::OsString,
    path::Path,
    process::{Command, Stdio},
};

/// Lines of ffmpeg stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 3;

/// Seconds as ffmpeg expects them (`2.5`, `120`).
pub fn format_seconds(seconds: f64) -> String {
    format!("{seconds}")
}

/// Build the ffmpeg argument list that converts one track.
pub fn transcode_args(track: &StimulusTrack, input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y"]
        .into_iter()
        .map(OsString::from)
        .collect();
    // Input-side seek so -t counts from the trimmed start.
    if track.trims_intro() {
        args.push("-ss".into());
        args.push(format_seconds(track.start_offset_s).into());
    }
    args.push("-i".into());
    args.push(input.as_os_str().to_owned());
    if let Some(length) = track.clip_length_s() {
        args.push("-t".into());
        args.push(format_seconds(length).into());
    }
    args.push(output.as_os_str().to_owned());
    args
}

/// Shell-quoted rendering of a command for dry runs and logs.
pub fn render_command_line(program: &str, args: &[OsString]) -> String {
    let mut words = Vec::with_capacity(args.len() + 1);
    words.push(program.to_string());
    words.extend(args.iter().map(|arg| arg.to_string_lossy().into_owned()));
    shell_words::join(words)
}

/// Run ffmpeg to completion; a non-zero exit becomes an error carrying its stderr.
pub fn run_transcoder(program: &str, args: &[OsString]) -> Result<()> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("failed to spawn {program}"))?;

    if output.status.success() {
        return Ok(());
    }

    let code = output
        .status
        .code()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unknown (terminated by signal)".to_string());
    bail!(
        "{program} exited with code {code}: {}",
        stderr_summary(&output.stderr)
    );
}

pub(super) fn stderr_summary(stderr: &[u8]) -> String {
    let cleaned = strip_ansi_escapes::strip(stderr);
    let text = String::from_utf8_lossy(&cleaned);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return "no error output".to_string();
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("; ")
}
