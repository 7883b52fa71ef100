//! Default values and hard limits for CLI options.

/// Directory holding the music stimuli (and the tone files) next to the task.
pub const DEFAULT_AUDIO_DIR: &str = "audio";

/// Subdirectory of the audio directory that receives processed mp3 originals.
pub const DEFAULT_ARCHIVE_SUBDIR: &str = "original";

/// Directory the task reads its timing configs from.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Media tool name accepted without a path.
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

pub const DEFAULT_SUBJECTS: u32 = 4;
pub const DEFAULT_SESSIONS: u32 = 10;
pub const DEFAULT_SEED: u64 = 1;

/// Subject and session labels are zero-padded to two digits.
pub const MAX_SUBJECTS: u32 = 99;
pub const MAX_SESSIONS: u32 = 99;
