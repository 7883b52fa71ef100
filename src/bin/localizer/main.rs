//! `localizer` entrypoint: stimulus preparation, timing configs, and BIDS sidecars.

use anyhow::{bail, Result};
use clap::Parser;
use localizer_tools::{
    audio::{self, PrepareOptions, STIMULUS_TRACKS},
    bids,
    config::{AppConfig, Command},
    doctor::base_doctor_report,
    init_logging, install_panic_hook, log_debug, log_file_path,
    timing::{self, TimingOptions},
};

#[cfg(not(test))]
fn main() -> Result<()> {
    run_with_args(std::env::args_os())
}

#[cfg_attr(test, allow(dead_code))]
fn run_with_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let mut config = AppConfig::parse_from(args);
    if let Command::Doctor(doctor) = &config.command {
        let report = base_doctor_report(&config, &doctor.dirs);
        println!("{}", report.render());
        return Ok(());
    }

    config.validate()?;
    init_logging(&config);
    install_panic_hook();
    log_debug("=== localizer started ===");
    log_debug(&format!("Log file: {:?}", log_file_path()));

    let result = run_command(&config);
    if let Err(ref e) = result {
        log_debug(&format!("Exit with error: {e:#}"));
    }
    log_debug("=== localizer exiting ===");
    result
}

fn run_command(config: &AppConfig) -> Result<()> {
    match &config.command {
        Command::PrepareAudio(args) => {
            let opts = PrepareOptions::from_config(config, args);
            let report = audio::prepare_all(&opts, STIMULUS_TRACKS);
            println!("{}", report.render());
            let failed = report.failed_count();
            if failed > 0 {
                bail!("{failed} of {} tracks failed", report.tracks.len());
            }
            Ok(())
        }
        Command::Timing(args) => {
            let written = timing::generate_all(&TimingOptions::from(args))?;
            println!(
                "Wrote {} timing configs to {}",
                written.len(),
                args.output_dir.display()
            );
            Ok(())
        }
        Command::Bids(args) => {
            for path in bids::write_sidecars(&args.output_dir, &args.designs)? {
                println!("Wrote {}", path.display());
            }
            Ok(())
        }
        Command::ListTracks => {
            print!("{}", list_tracks());
            Ok(())
        }
        // Handled before validation so a broken config can still be inspected.
        Command::Doctor(_) => Ok(()),
    }
}

fn list_tracks() -> String {
    let mut output = String::from("Stimulus tracks:\n");
    for track in STIMULUS_TRACKS {
        let start = audio::format_seconds(track.start_offset_s);
        let length = track
            .clip_length_s()
            .map(|len| format!("{}s", audio::format_seconds(len)))
            .unwrap_or_else(|| "full".to_string());
        output.push_str(&format!(
            "  - {} (start {start}s, length {length}) -> {}\n",
            track.source_file_name(),
            track.output_file_name()
        ));
    }
    output
}
