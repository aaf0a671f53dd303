//! Vaani - streaming chat client with sentence-by-sentence narration
//!
//! Consumes a chunked `text/event-stream` of chat-completion deltas,
//! rebuilds the assistant's reply incrementally, and narrates each sentence
//! aloud as soon as its boundary appears, while the rest of the reply is
//! still arriving.
//!
//! # Architecture
//!
//! ```text
//! network bytes
//!      │
//! ┌────▼───────────────────────────────┐
//! │ stream: Utf8Decoder → EventBuffer  │
//! │         → SentenceSplitter         │
//! └────┬───────────────────┬───────────┘
//!      │ running text      │ completed sentences
//! ┌────▼──────────┐   ┌────▼───────────┐
//! │ chat: session │   │ voice: Narrator│──► SpeechService ──► audio
//! └───────────────┘   └────────────────┘
//! ```

pub mod chat;
pub mod config;
pub mod error;
pub mod stream;
pub mod voice;

pub use chat::{CancelHandle, ChatClient, ChatSession, Message, Role, SessionEvent};
pub use config::{Config, LanguageConfig, TtsConfig};
pub use error::{Error, Result};
pub use stream::{EventBuffer, Record, SentenceSplitter, StreamAssembler, Utf8Decoder};
pub use voice::{HttpSpeech, Narrator, NullSpeech, SpeechService, UtteranceParams, VoiceInfo};
