//! Music stimulus preparation.
//!
//! Each row of [`STIMULUS_TRACKS`] names one mp3 under the audio directory, how
//! many seconds of intro to drop, and where to stop. Every row becomes a single
//! ffmpeg invocation writing a wav with an underscore-normalized name; the mp3
//! is then moved into the archive directory. Rows are processed in order and a
//! failing row never stops the rest of the batch.

mod catalog;
mod command;
mod prepare;
#[cfg(test)]
mod tests;

pub use catalog::{find_track, StimulusTrack, STIMULUS_TRACKS};
pub use command::{format_seconds, render_command_line, run_transcoder, transcode_args};
pub use prepare::{prepare_all, prepare_track, BatchReport, PrepareOptions, TrackOutcome, TrackReport};

/// Container the mp3 sources are converted into.
pub const OUTPUT_EXTENSION: &str = "wav";

/// Container the stimuli are distributed in.
pub const SOURCE_EXTENSION: &str = "mp3";
