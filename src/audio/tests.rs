use super::command::stderr_summary;
use super::prepare::{converted_log_line, copy_then_remove};
use super::{
    find_track, format_seconds, prepare_all, prepare_track, render_command_line, transcode_args,
    PrepareOptions, StimulusTrack, TrackOutcome, STIMULUS_TRACKS,
};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

fn track(title: &str) -> &'static StimulusTrack {
    find_track(title).unwrap_or_else(|| panic!("missing track {title}"))
}

fn args_as_strings(args: &[OsString]) -> Vec<String> {
    args.iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

fn options(root: &Path, ffmpeg_cmd: &str) -> PrepareOptions {
    PrepareOptions {
        ffmpeg_cmd: ffmpeg_cmd.to_string(),
        input_dir: root.to_path_buf(),
        output_dir: root.join("wav"),
        archive_dir: root.join("original"),
        dry_run: false,
        log_timings: false,
    }
}

const EXPECTED_TABLE: [(&str, f64, Option<f64>); 14] = [
    ("Ambush in Rattlesnake Gulch", 0.0, Some(120.0)),
    ("Bleu", 0.0, Some(120.0)),
    ("Bollywood Groove", 0.0, Some(120.0)),
    ("Breaking Bollywood", 0.0, Some(120.0)),
    ("Coy Koi", 0.0, None),
    ("Cumbish", 0.0, Some(120.0)),
    ("Desert Conflict", 0.0, Some(120.0)),
    ("Funshine", 0.0, Some(120.0)),
    ("Improv for Evil", 4.0, None),
    ("Jack The Lumberer", 2.5, Some(122.5)),
    ("Le Baguette", 1.0, None),
    ("Shenzhen Nightlife", 0.0, Some(120.0)),
    ("Stereotype News", 1.5, None),
    ("Ukulele Song", 0.0, Some(120.0)),
];

#[test]
fn table_matches_every_row_in_order() {
    let actual: Vec<(&str, f64, Option<f64>)> = STIMULUS_TRACKS
        .iter()
        .map(|t| (t.title, t.start_offset_s, t.max_duration_s))
        .collect();
    assert_eq!(actual, EXPECTED_TABLE.to_vec());
}

#[test]
fn table_titles_are_unique() {
    let mut titles: Vec<&str> = STIMULUS_TRACKS.iter().map(|t| t.title).collect();
    titles.sort_unstable();
    titles.dedup();
    assert_eq!(titles.len(), STIMULUS_TRACKS.len());
}

#[test]
fn every_row_builds_expected_ffmpeg_args() {
    let expected: [&str; 14] = [
        "-i i.mp3 -t 120 o.wav",
        "-i i.mp3 -t 120 o.wav",
        "-i i.mp3 -t 120 o.wav",
        "-i i.mp3 -t 120 o.wav",
        "-i i.mp3 o.wav",
        "-i i.mp3 -t 120 o.wav",
        "-i i.mp3 -t 120 o.wav",
        "-i i.mp3 -t 120 o.wav",
        "-ss 4 -i i.mp3 o.wav",
        "-ss 2.5 -i i.mp3 -t 120 o.wav",
        "-ss 1 -i i.mp3 o.wav",
        "-i i.mp3 -t 120 o.wav",
        "-ss 1.5 -i i.mp3 o.wav",
        "-i i.mp3 -t 120 o.wav",
    ];
    assert_eq!(STIMULUS_TRACKS.len(), expected.len());
    for (stimulus, tail) in STIMULUS_TRACKS.iter().zip(expected) {
        let args = transcode_args(stimulus, Path::new("i.mp3"), Path::new("o.wav"));
        let rendered = args_as_strings(&args).join(" ");
        assert_eq!(
            rendered,
            format!("-hide_banner -nostdin -loglevel error -y {tail}"),
            "{}",
            stimulus.title
        );
    }
}

#[test]
fn output_names_replace_spaces_with_underscores() {
    let gulch = track("Ambush in Rattlesnake Gulch");
    assert_eq!(gulch.source_file_name(), "Ambush in Rattlesnake Gulch.mp3");
    assert_eq!(gulch.output_file_name(), "Ambush_in_Rattlesnake_Gulch.wav");
    assert_eq!(track("Bleu").output_file_name(), "Bleu.wav");
}

#[test]
fn capped_tracks_play_two_minutes_after_trim() {
    for stimulus in STIMULUS_TRACKS {
        if let Some(length) = stimulus.clip_length_s() {
            assert!((length - 120.0).abs() < 1e-9, "{}", stimulus.title);
        }
    }
    assert_eq!(track("Jack The Lumberer").clip_length_s(), Some(120.0));
    assert_eq!(track("Coy Koi").clip_length_s(), None);
}

#[test]
fn find_track_accepts_normalized_names() {
    assert_eq!(track("jack_the_lumberer").title, "Jack The Lumberer");
    assert!(find_track("Not A Track").is_none());
}

#[test]
fn seconds_format_without_trailing_zeroes() {
    assert_eq!(format_seconds(120.0), "120");
    assert_eq!(format_seconds(2.5), "2.5");
    assert_eq!(format_seconds(1.5), "1.5");
}

#[test]
fn untrimmed_capped_track_args() {
    let args = transcode_args(track("Bleu"), Path::new("in/Bleu.mp3"), Path::new("out/Bleu.wav"));
    assert_eq!(
        args_as_strings(&args),
        vec![
            "-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i", "in/Bleu.mp3", "-t",
            "120", "out/Bleu.wav",
        ]
    );
}

#[test]
fn trimmed_uncapped_track_args() {
    let args = transcode_args(
        track("Improv for Evil"),
        Path::new("Improv for Evil.mp3"),
        Path::new("Improv_for_Evil.wav"),
    );
    let args = args_as_strings(&args);
    let seek = args.iter().position(|a| a == "-ss").expect("seek flag");
    let input = args.iter().position(|a| a == "-i").expect("input flag");
    assert_eq!(args[seek + 1], "4");
    assert!(seek < input, "seek must precede the input");
    assert!(!args.iter().any(|a| a == "-t"));
    assert_eq!(args.last().map(String::as_str), Some("Improv_for_Evil.wav"));
}

#[test]
fn trimmed_capped_track_args() {
    let args = transcode_args(
        track("Jack The Lumberer"),
        Path::new("a.mp3"),
        Path::new("b.wav"),
    );
    let rendered = args_as_strings(&args).join(" ");
    assert!(rendered.contains("-ss 2.5 -i a.mp3 -t 120 b.wav"));
}

#[test]
fn command_line_quotes_spaces() {
    let args = transcode_args(
        track("Coy Koi"),
        Path::new("audio/Coy Koi.mp3"),
        Path::new("audio/Coy_Koi.wav"),
    );
    let line = render_command_line("ffmpeg", &args);
    assert!(line.starts_with("ffmpeg -hide_banner"));
    assert!(line.contains("'audio/Coy Koi.mp3'"));
}

#[test]
fn stderr_summary_keeps_tail_without_ansi() {
    let stderr = b"\x1b[31mline one\x1b[0m\n\nline two\nline three\nline four\n";
    assert_eq!(stderr_summary(stderr), "line two; line three; line four");
    assert_eq!(stderr_summary(b"  \n"), "no error output");
}

#[test]
fn dry_run_plans_without_touching_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut opts = options(dir.path(), "ffmpeg");
    opts.dry_run = true;
    let report = prepare_all(&opts, STIMULUS_TRACKS);
    assert_eq!(report.tracks.len(), STIMULUS_TRACKS.len());
    assert_eq!(report.failed_count(), 0);
    assert!(report
        .tracks
        .iter()
        .all(|t| matches!(t.outcome, TrackOutcome::Planned { .. })));
    assert!(!dir.path().join("original").exists());
    assert!(!dir.path().join("wav").exists());
}

#[test]
fn missing_sources_fail_per_track_without_halting() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opts = options(dir.path(), "ffmpeg");
    let report = prepare_all(&opts, &STIMULUS_TRACKS[..3]);
    assert_eq!(report.tracks.len(), 3);
    assert_eq!(report.failed_count(), 3);
    let rendered = report.render();
    assert!(rendered.contains("not found"));
    assert!(rendered.ends_with("0 converted, 3 failed, 3 total"));
}

#[test]
fn existing_archive_entry_blocks_conversion() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opts = options(dir.path(), "ffmpeg");
    let bleu = track("Bleu");
    fs::write(dir.path().join(bleu.source_file_name()), b"mp3").expect("source");
    fs::create_dir_all(&opts.archive_dir).expect("archive dir");
    fs::write(opts.archive_dir.join(bleu.source_file_name()), b"old").expect("archived");

    let err = prepare_track(&opts, bleu).expect_err("archive collision");
    assert!(format!("{err:#}").contains("already archived"));
    assert!(dir.path().join(bleu.source_file_name()).exists());
}

#[test]
fn elapsed_time_logged_only_with_log_timings() {
    assert_eq!(
        converted_log_line("Bleu", None),
        "prepare-audio: converted Bleu"
    );
    assert_eq!(
        converted_log_line("Bleu", Some(42)),
        "prepare-audio: converted Bleu in 42ms"
    );
}

#[test]
fn log_timings_flag_reaches_prepare_options() {
    use crate::config::{AppConfig, Command};
    use clap::Parser;

    let with = AppConfig::parse_from(["localizer", "--log-timings", "prepare-audio"]);
    let without = AppConfig::parse_from(["localizer", "prepare-audio"]);
    for (config, expected) in [(with, true), (without, false)] {
        let Command::PrepareAudio(args) = &config.command else {
            panic!("expected prepare-audio command");
        };
        assert_eq!(PrepareOptions::from_config(&config, args).log_timings, expected);
    }
}

#[test]
fn failed_source_removal_rolls_back_archive_copy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("Bleu.mp3");
    let archived = dir.path().join("Bleu-archived.mp3");
    fs::write(&source, b"mp3").expect("source");

    let err = copy_then_remove(
        &source,
        &archived,
        std::io::Error::other("cross-device link"),
        |_| Err(std::io::Error::other("permission denied")),
    )
    .expect_err("removal failure");
    assert!(format!("{err:#}").contains("rolled back"));
    assert!(source.exists());
    assert!(!archived.exists());
}

#[test]
fn copy_fallback_moves_source() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("Funshine.mp3");
    let archived = dir.path().join("Funshine-archived.mp3");
    fs::write(&source, b"mp3").expect("source");

    copy_then_remove(
        &source,
        &archived,
        std::io::Error::other("cross-device link"),
        |path| fs::remove_file(path),
    )
    .expect("fallback move");
    assert!(!source.exists());
    assert_eq!(fs::read(&archived).expect("archived"), b"mp3");
}

#[cfg(unix)]
fn fake_ffmpeg(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-ffmpeg");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write fake ffmpeg");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

#[cfg(unix)]
#[test]
fn successful_conversion_archives_source() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bin = fake_ffmpeg(dir.path(), "for last; do :; done\ntouch \"$last\"");
    let opts = options(dir.path(), bin.to_str().expect("utf8"));
    let koi = track("Coy Koi");
    fs::write(dir.path().join(koi.source_file_name()), b"mp3").expect("source");

    let outcome = prepare_track(&opts, koi).expect("conversion");
    match outcome {
        TrackOutcome::Converted { output, archived } => {
            assert_eq!(output, dir.path().join("wav").join("Coy_Koi.wav"));
            assert!(output.exists());
            assert!(archived.exists());
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(!dir.path().join(koi.source_file_name()).exists());
}

#[cfg(unix)]
#[test]
fn failing_tool_keeps_source_and_continues() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bin = fake_ffmpeg(
        dir.path(),
        "echo 'Invalid data found when processing input' >&2\nexit 1",
    );
    let opts = options(dir.path(), bin.to_str().expect("utf8"));
    let tracks = [*track("Bleu"), *track("Funshine")];
    for stimulus in &tracks {
        fs::write(dir.path().join(stimulus.source_file_name()), b"mp3").expect("source");
    }

    let report = prepare_all(&opts, &tracks);
    assert_eq!(report.failed_count(), 2);
    for (stimulus, entry) in tracks.iter().zip(&report.tracks) {
        let TrackOutcome::Failed(err) = &entry.outcome else {
            panic!("expected failure for {}", stimulus.title);
        };
        let message = format!("{err:#}");
        assert!(message.contains("exited with code 1"));
        assert!(message.contains("Invalid data found"));
        assert!(dir.path().join(stimulus.source_file_name()).exists());
    }
    assert!(!opts.archive_dir.exists());
}
