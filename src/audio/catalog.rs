use super::{OUTPUT_EXTENSION, SOURCE_EXTENSION};

/// One music stimulus and how much of it the task plays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StimulusTrack {
    /// File stem as distributed (spaces included).
    pub title: &'static str,
    /// Seconds of intro skipped before the clip starts.
    pub start_offset_s: f64,
    /// Source timestamp the clip runs to; `None` keeps the remainder of the track.
    pub max_duration_s: Option<f64>,
}

const fn track(title: &'static str, start_offset_s: f64, max_duration_s: Option<f64>) -> StimulusTrack {
    StimulusTrack {
        title,
        start_offset_s,
        max_duration_s,
    }
}

pub const STIMULUS_TRACKS: &[StimulusTrack] = &[
    track("Ambush in Rattlesnake Gulch", 0.0, Some(120.0)),
    track("Bleu", 0.0, Some(120.0)),
    track("Bollywood Groove", 0.0, Some(120.0)),
    track("Breaking Bollywood", 0.0, Some(120.0)),
    track("Coy Koi", 0.0, None),
    track("Cumbish", 0.0, Some(120.0)),
    track("Desert Conflict", 0.0, Some(120.0)),
    track("Funshine", 0.0, Some(120.0)),
    track("Improv for Evil", 4.0, None),
    track("Jack The Lumberer", 2.5, Some(122.5)),
    track("Le Baguette", 1.0, None),
    track("Shenzhen Nightlife", 0.0, Some(120.0)),
    track("Stereotype News", 1.5, None),
    track("Ukulele Song", 0.0, Some(120.0)),
];

impl StimulusTrack {
    pub fn source_file_name(&self) -> String {
        format!("{}.{SOURCE_EXTENSION}", self.title)
    }

    /// Output name with spaces replaced by underscores.
    pub fn output_file_name(&self) -> String {
        format!("{}.{OUTPUT_EXTENSION}", self.title.replace(' ', "_"))
    }

    /// Length of the written clip, measured from the trimmed start.
    pub fn clip_length_s(&self) -> Option<f64> {
        self.max_duration_s
            .map(|end| (end - self.start_offset_s).max(0.0))
    }

    pub fn trims_intro(&self) -> bool {
        self.start_offset_s > 0.0
    }
}

/// Look a track up by title, ignoring case and treating `_` like a space.
pub fn find_track(name: &str) -> Option<&'static StimulusTrack> {
    let wanted = name.trim().replace('_', " ");
    STIMULUS_TRACKS
        .iter()
        .find(|track| track.title.eq_ignore_ascii_case(&wanted))
}
