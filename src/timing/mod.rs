//! Trial timing configs for the localizer runs.
//!
//! A config is one TSV per subject, session and design listing each trial's
//! duration, the inter-trial interval (ITI) that follows it, the condition, and
//! for tone trials the tone file to play. The task shuffles nothing at run time
//! beyond what is written here, so configs are generated from a seed and the
//! same seed always reproduces the same files.

mod schedule;

use crate::config::{TaskDesign, TimingArgs};
use crate::log_debug;
use anyhow::{Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use std::{fmt::Write as _, fs, path::PathBuf};

pub use schedule::{assign_tones, detection_schedule, estimation_schedule};

/// 20 s sine tones played during `tone` trials.
pub const TONE_FILES: [&str; 5] = [
    "audio/250Hz_20s.wav",
    "audio/500Hz_20s.wav",
    "audio/600Hz_20s.wav",
    "audio/750Hz_20s.wav",
    "audio/850Hz_20s.wav",
];

/// Detection blocks per condition.
pub const N_BLOCKS: usize = 5;
/// Estimation trials per condition.
pub const N_TRIALS: usize = 14;
/// Estimation trial duration range (s), mean 3.
pub const DURATION_RANGE_S: (f64, f64) = (1.0, 5.0);
/// Estimation ITI range (s); the upper bound keeps the expected total near `TASK_TIME_S`.
pub const ITI_RANGE_S: (f64, f64) = (3.0, 11.84);
/// Time spent in trials; with 6 s fixation on each side a run lasts 450 s.
pub const TASK_TIME_S: f64 = 438.0;
pub const LEAD_IN_S: f64 = 6.0;
pub const LEAD_OUT_S: f64 = 6.0;
pub const DETECTION_BLOCK_S: f64 = 14.5;
pub const DETECTION_REST_S: f64 = 14.5;

const TSV_HEADER: &str = "duration\titi\ttrial_type\tstimulus";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrialType {
    Checkerboard,
    Tone,
    FingerTapping,
}

impl TrialType {
    pub const ALL: [TrialType; 3] = [
        TrialType::Checkerboard,
        TrialType::Tone,
        TrialType::FingerTapping,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TrialType::Checkerboard => "checkerboard",
            TrialType::Tone => "tone",
            TrialType::FingerTapping => "fingertapping",
        }
    }
}

pub const N_CONDITIONS: usize = TrialType::ALL.len();

#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub duration_s: f64,
    pub iti_s: f64,
    pub trial_type: TrialType,
    pub stimulus: Option<&'static str>,
}

/// One run's worth of trials plus the seed that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub design: TaskDesign,
    pub seed: u64,
    pub trials: Vec<Trial>,
}

impl RunConfig {
    /// Total seconds from the first trial onset to the end of the last ITI.
    pub fn trial_time_s(&self) -> f64 {
        self.trials.iter().map(|t| t.duration_s + t.iti_s).sum()
    }

    /// Scan time including the fixation before and after the trials.
    pub fn run_length_s(&self) -> f64 {
        LEAD_IN_S + self.trial_time_s() + LEAD_OUT_S
    }

    pub fn to_tsv(&self) -> String {
        let mut out = String::with_capacity(64 * (self.trials.len() + 1));
        out.push_str(TSV_HEADER);
        out.push('\n');
        for trial in &self.trials {
            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}",
                trial.duration_s,
                trial.iti_s,
                trial.trial_type.label(),
                trial.stimulus.unwrap_or("")
            );
        }
        out
    }
}

/// `sub-01_ses-02_task-primaryDetection_run-01_config.tsv`
pub fn config_file_name(subject: u32, session: u32, design: TaskDesign) -> String {
    format!(
        "sub-{subject:02}_ses-{session:02}_task-primary{}_run-01_config.tsv",
        design.label()
    )
}

/// Build one run from `seed`; returns the config and the seed for the next run.
pub fn generate_run(design: TaskDesign, seed: u64) -> Result<(RunConfig, u64)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let (mut trials, draws) = match design {
        TaskDesign::Detection => (detection_schedule(&mut rng), 1),
        TaskDesign::Estimation => estimation_schedule(&mut rng)?,
    };
    assign_tones(&mut trials, &mut rng)?;
    let next_seed = seed.wrapping_add(draws.max(1));
    Ok((
        RunConfig {
            design,
            seed,
            trials,
        },
        next_seed,
    ))
}

#[derive(Debug, Clone)]
pub struct TimingOptions {
    pub output_dir: PathBuf,
    pub subjects: u32,
    pub sessions: u32,
    pub designs: Vec<TaskDesign>,
    pub seed: u64,
}

impl From<&TimingArgs> for TimingOptions {
    fn from(args: &TimingArgs) -> Self {
        Self {
            output_dir: args.output_dir.clone(),
            subjects: args.subjects,
            sessions: args.sessions,
            designs: args.designs.clone(),
            seed: args.seed,
        }
    }
}

/// Write a config for every subject, session and design; returns the written paths.
pub fn generate_all(opts: &TimingOptions) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&opts.output_dir).with_context(|| {
        format!(
            "failed to create config directory '{}'",
            opts.output_dir.display()
        )
    })?;

    let mut seed = opts.seed;
    let mut written = Vec::new();
    for subject in 1..=opts.subjects {
        for session in 1..=opts.sessions {
            for &design in &opts.designs {
                let (run, next_seed) = generate_run(design, seed)
                    .with_context(|| format!("sub-{subject:02} ses-{session:02}"))?;
                let path = opts
                    .output_dir
                    .join(config_file_name(subject, session, design));
                fs::write(&path, run.to_tsv())
                    .with_context(|| format!("failed to write '{}'", path.display()))?;
                tracing::debug!(
                    subject,
                    session,
                    design = design.label(),
                    seed,
                    next_seed,
                    "wrote timing config"
                );
                log_debug(&format!(
                    "timing: sub-{subject:02} ses-{session:02} {} seed {seed} -> {}",
                    design.label(),
                    path.display()
                ));
                seed = next_seed;
                written.push(path);
            }
        }
    }
    Ok(written)
}
