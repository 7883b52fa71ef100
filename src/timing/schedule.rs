use super::{
    Trial, TrialType, DETECTION_BLOCK_S, DETECTION_REST_S, DURATION_RANGE_S, ITI_RANGE_S,
    N_BLOCKS, N_CONDITIONS, N_TRIALS, TASK_TIME_S, TONE_FILES,
};
use anyhow::{bail, Result};
use rand::{seq::SliceRandom, Rng};

/// Largest per-condition shortfall accepted before the last ITI absorbs it.
const SHORTFALL_TOLERANCE_S: f64 = 0.5;
/// Largest gap allowed between the expected design length and `TASK_TIME_S`.
const DESIGN_TOLERANCE_S: f64 = 1.0;
const MAX_DRAWS: u64 = 1_000_000;

fn midpoint((low, high): (f64, f64)) -> f64 {
    (low + high) / 2.0
}

/// Blocked design: every condition `N_BLOCKS` times in shuffled order.
pub fn detection_schedule<R: Rng>(rng: &mut R) -> Vec<Trial> {
    let mut order: Vec<TrialType> = (0..N_BLOCKS).flat_map(|_| TrialType::ALL).collect();
    order.shuffle(rng);
    order
        .into_iter()
        .map(|trial_type| Trial {
            duration_s: DETECTION_BLOCK_S,
            iti_s: DETECTION_REST_S,
            trial_type,
            stimulus: None,
        })
        .collect()
}

/// Event-related design with jittered durations and ITIs.
///
/// Durations and ITIs are redrawn until one condition's worth lands within
/// half a second of the expected length; the last ITI then absorbs the rest so
/// each condition fills exactly a third of `TASK_TIME_S`. Every condition gets
/// its own permutation of that draw. Returns the trials and the number of draws.
pub fn estimation_schedule<R: Rng>(rng: &mut R) -> Result<(Vec<Trial>, u64)> {
    let expected = (midpoint(DURATION_RANGE_S) + midpoint(ITI_RANGE_S)) * N_TRIALS as f64;
    if (expected * N_CONDITIONS as f64 - TASK_TIME_S).abs() > DESIGN_TOLERANCE_S {
        bail!(
            "expected trial time {:.2}s does not fit the {TASK_TIME_S}s task",
            expected * N_CONDITIONS as f64
        );
    }

    let mut draws = 0u64;
    let (durations, mut itis, shortfall) = loop {
        if draws == MAX_DRAWS {
            bail!("no duration/ITI draw within {SHORTFALL_TOLERANCE_S}s after {MAX_DRAWS} attempts");
        }
        draws += 1;
        let durations: Vec<f64> = (0..N_TRIALS)
            .map(|_| rng.gen_range(DURATION_RANGE_S.0..DURATION_RANGE_S.1))
            .collect();
        let itis: Vec<f64> = (0..N_TRIALS)
            .map(|_| rng.gen_range(ITI_RANGE_S.0..ITI_RANGE_S.1))
            .collect();
        let shortfall = expected - durations.iter().sum::<f64>() - itis.iter().sum::<f64>();
        if shortfall.abs() <= SHORTFALL_TOLERANCE_S {
            break (durations, itis, shortfall);
        }
    };

    if let Some(last) = itis.last_mut() {
        *last += shortfall + TASK_TIME_S / N_CONDITIONS as f64 - expected;
    }

    let per_condition: Vec<(Vec<f64>, Vec<f64>)> = TrialType::ALL
        .iter()
        .map(|_| {
            let mut durs = durations.clone();
            let mut gaps = itis.clone();
            durs.shuffle(rng);
            gaps.shuffle(rng);
            (durs, gaps)
        })
        .collect();

    let mut order: Vec<usize> = (0..N_TRIALS).flat_map(|_| 0..N_CONDITIONS).collect();
    order.shuffle(rng);

    let mut used = [0usize; N_CONDITIONS];
    let trials = order
        .into_iter()
        .map(|condition| {
            let (durs, gaps) = &per_condition[condition];
            let idx = used[condition];
            used[condition] += 1;
            Trial {
                duration_s: durs[idx],
                iti_s: gaps[idx],
                trial_type: TrialType::ALL[condition],
                stimulus: None,
            }
        })
        .collect();

    Ok((trials, draws))
}

/// Give each tone trial a tone file; every file is used at most `ceil(N_TRIALS / 5)` times.
pub fn assign_tones<R: Rng>(trials: &mut [Trial], rng: &mut R) -> Result<()> {
    let repeats = N_TRIALS.div_ceil(TONE_FILES.len());
    let mut pool: Vec<&'static str> = TONE_FILES
        .iter()
        .flat_map(|file| std::iter::repeat(*file).take(repeats))
        .collect();
    pool.shuffle(rng);

    let mut pool = pool.into_iter();
    for trial in trials.iter_mut() {
        if trial.trial_type != TrialType::Tone {
            trial.stimulus = None;
            continue;
        }
        match pool.next() {
            Some(file) => trial.stimulus = Some(file),
            None => bail!(
                "more tone trials than available tone files ({})",
                TONE_FILES.len() * repeats
            ),
        }
    }
    Ok(())
}
