use crate::audio::{StimulusTrack, STIMULUS_TRACKS};
use crate::config::{AppConfig, StimulusDirs};
use crate::{crash_log_path, log_file_path};
use std::{
    env,
    fmt::Display,
    path::Path,
    process::{Command, Stdio},
};

pub struct DoctorReport {
    lines: Vec<String>,
}

impl DoctorReport {
    pub fn new(title: &str) -> Self {
        Self {
            lines: vec![title.to_string()],
        }
    }

    pub fn section(&mut self, title: &str) {
        self.lines.push(String::new());
        self.lines.push(format!("{title}:"));
    }

    pub fn push_kv(&mut self, key: &str, value: impl Display) {
        self.lines.push(format!("  {key}: {value}"));
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

pub fn base_doctor_report(config: &AppConfig, dirs: &StimulusDirs) -> DoctorReport {
    let mut report = DoctorReport::new("Localizer Doctor");
    report.push_kv("version", env!("CARGO_PKG_VERSION"));
    report.push_kv("os", format!("{}/{}", env::consts::OS, env::consts::ARCH));

    let mut validated = config.clone();
    let validation_result = validated.validate();
    let resolved = validation_result
        .as_ref()
        .map(|_| &validated)
        .unwrap_or(config);

    report.section("Config");
    match &validation_result {
        Ok(()) => report.push_kv("validation", "ok"),
        Err(err) => report.push_kv("validation", format!("error: {err}")),
    }
    report.push_kv(
        "logs",
        if resolved.logging_enabled() {
            "enabled"
        } else {
            "disabled"
        },
    );
    report.push_kv("log_file", log_file_path().display());
    report.push_kv("crash_log", crash_log_path().display());

    report.section("Media tool");
    report.push_kv("ffmpeg_cmd", &resolved.ffmpeg_cmd);
    match ffmpeg_version_line(&resolved.ffmpeg_cmd) {
        Ok(version) => report.push_kv("ffmpeg_version", version),
        Err(err) => report.push_kv("ffmpeg_version", format!("error: {err}")),
    }

    report.section("Stimuli");
    let output_dir = dirs.resolved_output_dir();
    let archive_dir = dirs.resolved_archive_dir();
    report.push_kv("input_dir", dirs.input_dir.display());
    report.push_kv("output_dir", output_dir.display());
    report.push_kv("archive_dir", archive_dir.display());
    let mut pending = 0usize;
    for track in STIMULUS_TRACKS {
        let status = track_status(track, &dirs.input_dir, &output_dir, &archive_dir);
        if status == "pending" {
            pending += 1;
        }
        report.push_line(format!("    - {}: {status}", track.title));
    }
    report.push_kv("pending", pending);

    report
}

/// Classify a track by which of its files exist on disk.
pub(crate) fn track_status(
    track: &StimulusTrack,
    input_dir: &Path,
    output_dir: &Path,
    archive_dir: &Path,
) -> &'static str {
    let source = input_dir.join(track.source_file_name()).is_file();
    let output = output_dir.join(track.output_file_name()).is_file();
    let archived = archive_dir.join(track.source_file_name()).is_file();
    match (source, output, archived) {
        (true, _, true) => "conflict (source and archived copy both present)",
        (true, _, false) => "pending",
        (false, true, true) => "converted",
        (false, true, false) => "converted (original not archived)",
        (false, false, true) => "archived but wav missing",
        (false, false, false) => "missing",
    }
}

/// First line of `<ffmpeg> -version`.
pub(crate) fn ffmpeg_version_line(program: &str) -> Result<String, String> {
    let output = Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .map_err(|err| format!("failed to spawn {program}: {err}"))?;
    if !output.status.success() {
        return Err(format!("{program} -version exited with {}", output.status));
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .ok_or_else(|| format!("{program} -version printed nothing"))
}
