//! Narration: speech services, playback, and the sequential queue

pub mod narrator;
pub mod playback;
pub mod speech;
pub mod synth;

pub use narrator::Narrator;
pub use playback::AudioPlayback;
pub use speech::{NullSpeech, SpeechService, UtteranceParams, VoiceInfo, select_voice};
pub use synth::HttpSpeech;
