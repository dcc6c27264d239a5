//! Audio output for the ask client and smoke-test commands

mod playback;

pub use playback::AudioPlayback;
